//! Default values for every documented setting
//!
//! Single source for the defaults the loader falls back to. The flat
//! environment keys that override them live in [`env_keys`].

/// Managed AWS account defaults
pub mod aws {
    pub const DEFAULT_REGION: &str = "us-east-1";
}

/// Knowledge base and generation defaults
pub mod knowledge_base {
    pub const DEFAULT_KNOWLEDGE_BASE_ID: &str = "OUQVSP38X2";
    pub const DEFAULT_MODEL_ARN: &str =
        "arn:aws:bedrock:us-east-1::foundation-model/anthropic.claude-v2";

    pub const DEFAULT_MAX_TOKENS: u32 = 512;
    pub const DEFAULT_TEMPERATURE: f32 = 0.7;
    pub const DEFAULT_TOP_P: f32 = 0.9;
}

/// Application presentation defaults
pub mod app {
    pub const DEFAULT_TITLE: &str = "SevaSetu - Government Schemes Assistant";
    pub const DEFAULT_SUPPORTED_LANGUAGES: &[&str] =
        &["english", "hindi", "tamil", "telugu", "bengali"];
}

/// HTTP server defaults
pub mod server {
    pub const DEFAULT_HOST: &str = "0.0.0.0";
    pub const DEFAULT_PORT: u16 = 8080;
    pub const DEFAULT_SESSION_TIMEOUT_MINUTES: u64 = 30;
    pub const DEFAULT_MAX_SESSIONS: usize = 1000;
    /// Retrieval plus synthesis can take several seconds
    pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 60;
}

/// Flat environment keys, highest priority source
pub mod env_keys {
    pub const AWS_REGION: &str = "AWS_REGION";
    pub const AWS_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
    pub const AWS_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
    pub const KNOWLEDGE_BASE_ID: &str = "KNOWLEDGE_BASE_ID";
    pub const MODEL_ARN: &str = "MODEL_ARN";
    pub const MAX_TOKENS: &str = "MAX_TOKENS";
    pub const TEMPERATURE: &str = "TEMPERATURE";
    pub const TOP_P: &str = "TOP_P";
    pub const SUPPORTED_LANGUAGES: &str = "SUPPORTED_LANGUAGES";
    pub const APP_TITLE: &str = "APP_TITLE";
    pub const LOG_LEVEL: &str = "LOG_LEVEL";
    pub const SESSION_TIMEOUT_MINUTES: &str = "SESSION_TIMEOUT_MINUTES";
    pub const PORT: &str = "PORT";

    /// Selects `config/{SEVA_ENV}.*`
    pub const SEVA_ENV: &str = "SEVA_ENV";
    /// Prefix for nested keys such as `SEVA__SERVER__MAX_SESSIONS`
    pub const NESTED_PREFIX: &str = "SEVA";
}
