//! Configuration management for the SevaSetu assistant
//!
//! Supports loading configuration from:
//! - `config/default.*` and `config/{SEVA_ENV}.*` files
//! - Nested environment variables (`SEVA__` prefix, `__` separator)
//! - The flat deployment keys (`AWS_REGION`, `KNOWLEDGE_BASE_ID`, ...),
//!   also read from a `.env` file
//!
//! Settings are loaded once at startup and shared read-only.

pub mod constants;
pub mod settings;

pub use settings::{
    load_settings, load_settings_from, AppConfig, AwsConfig, KnowledgeBaseConfig,
    LanguagesConfig, ObservabilityConfig, RuntimeEnvironment, ServerConfig, Settings,
};

use thiserror::Error;

/// One rejected setting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigViolation {
    pub field: String,
    pub message: String,
}

impl ConfigViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConfigViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Every violation found in one load, not just the first
    #[error("Invalid configuration: {}", join_violations(.0))]
    Invalid(Vec<ConfigViolation>),
}

impl ConfigError {
    pub fn violations(&self) -> &[ConfigViolation] {
        match self {
            ConfigError::Invalid(v) => v,
            ConfigError::ParseError(_) => &[],
        }
    }
}

fn join_violations(violations: &[ConfigViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl From<ConfigError> for seva_core::Error {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::ParseError(msg) => seva_core::Error::ConfigurationInvalid(vec![msg]),
            ConfigError::Invalid(violations) => seva_core::Error::ConfigurationInvalid(
                violations.iter().map(ToString::to_string).collect(),
            ),
        }
    }
}
