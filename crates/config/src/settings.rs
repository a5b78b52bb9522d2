//! Main settings module

use std::collections::HashMap;
use std::str::FromStr;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use seva_core::{Language, RetrievalConfig};

use crate::constants::{app, aws, env_keys, knowledge_base, server};
use crate::{ConfigError, ConfigViolation};

const REDACTED: &str = "***";
const NOT_SET: &str = "(not set)";
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Runtime environment, selected by `SEVA_ENV`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    #[default]
    Development,
    Staging,
    Production,
}

impl RuntimeEnvironment {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "development" | "dev" => Some(Self::Development),
            "staging" => Some(Self::Staging),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    /// Managed AWS account access
    #[serde(default)]
    pub aws: AwsConfig,

    /// Knowledge base and generation parameters
    #[serde(default)]
    pub knowledge_base: KnowledgeBaseConfig,

    #[serde(default)]
    pub languages: LanguagesConfig,

    #[serde(default)]
    pub app: AppConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// AWS region and optional static credentials
///
/// Without static credentials the SDK default provider chain is used
/// (instance role, shared profile, ...).
#[derive(Clone, Serialize, Deserialize)]
pub struct AwsConfig {
    #[serde(default = "default_region")]
    pub region: String,

    #[serde(default, skip_serializing)]
    pub access_key_id: Option<String>,

    #[serde(default, skip_serializing)]
    pub secret_access_key: Option<String>,
}

fn default_region() -> String {
    aws::DEFAULT_REGION.to_string()
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            access_key_id: None,
            secret_access_key: None,
        }
    }
}

impl AwsConfig {
    /// Static key pair, when both halves are configured
    pub fn static_credentials(&self) -> Option<(&str, &str)> {
        match (self.access_key_id.as_deref(), self.secret_access_key.as_deref()) {
            (Some(id), Some(secret)) => Some((id, secret)),
            _ => None,
        }
    }
}

impl std::fmt::Debug for AwsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsConfig")
            .field("region", &self.region)
            .field("access_key_id", &redact(self.access_key_id.as_deref()))
            .field("secret_access_key", &redact(self.secret_access_key.as_deref()))
            .finish()
    }
}

/// Which knowledge base to query, with which model and parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeBaseConfig {
    #[serde(default = "default_knowledge_base_id")]
    pub knowledge_base_id: String,

    #[serde(default = "default_model_arn")]
    pub model_arn: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,
}

fn default_knowledge_base_id() -> String {
    knowledge_base::DEFAULT_KNOWLEDGE_BASE_ID.to_string()
}
fn default_model_arn() -> String {
    knowledge_base::DEFAULT_MODEL_ARN.to_string()
}
fn default_max_tokens() -> u32 {
    knowledge_base::DEFAULT_MAX_TOKENS
}
fn default_temperature() -> f32 {
    knowledge_base::DEFAULT_TEMPERATURE
}
fn default_top_p() -> f32 {
    knowledge_base::DEFAULT_TOP_P
}

impl Default for KnowledgeBaseConfig {
    fn default() -> Self {
        Self {
            knowledge_base_id: default_knowledge_base_id(),
            model_arn: default_model_arn(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
        }
    }
}

/// Answer languages offered in the language picker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguagesConfig {
    #[serde(default = "default_supported_languages")]
    pub supported: Vec<String>,
}

fn default_supported_languages() -> Vec<String> {
    app::DEFAULT_SUPPORTED_LANGUAGES
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for LanguagesConfig {
    fn default() -> Self {
        Self {
            supported: default_supported_languages(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_title")]
    pub title: String,
}

fn default_title() -> String {
    app::DEFAULT_TITLE.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
        }
    }
}

/// HTTP server and session lifecycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Idle sessions are dropped after this long
    #[serde(default = "default_session_timeout")]
    pub session_timeout_minutes: u64,

    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Bound on every route except question submission
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,

    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Empty falls back to http://localhost:3000
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    server::DEFAULT_HOST.to_string()
}
fn default_port() -> u16 {
    server::DEFAULT_PORT
}
fn default_session_timeout() -> u64 {
    server::DEFAULT_SESSION_TIMEOUT_MINUTES
}
fn default_max_sessions() -> usize {
    server::DEFAULT_MAX_SESSIONS
}
fn default_request_timeout() -> u64 {
    server::DEFAULT_REQUEST_TIMEOUT_SECONDS
}
fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            session_timeout_minutes: default_session_timeout(),
            max_sessions: default_max_sessions(),
            request_timeout_seconds: default_request_timeout(),
            cors_enabled: true,
            cors_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_json: bool,

    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: true,
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings, reporting every violation at once
    pub fn validate(&self) -> Result<(), ConfigError> {
        let violations = self.violations();
        if violations.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(violations))
        }
    }

    fn violations(&self) -> Vec<ConfigViolation> {
        let mut out = Vec::new();
        self.validate_aws(&mut out);
        self.validate_knowledge_base(&mut out);
        self.validate_languages(&mut out);
        self.validate_server(&mut out);

        let level = self.observability.log_level.to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            out.push(ConfigViolation::new(
                "observability.log_level",
                format!("must be one of {}, got {:?}", LOG_LEVELS.join(", "), self.observability.log_level),
            ));
        }
        out
    }

    fn validate_aws(&self, out: &mut Vec<ConfigViolation>) {
        let aws = &self.aws;
        if aws.region.trim().is_empty() {
            out.push(ConfigViolation::new("aws.region", "must not be empty"));
        }
        match (&aws.access_key_id, &aws.secret_access_key) {
            (Some(_), None) => out.push(ConfigViolation::new(
                "aws.secret_access_key",
                "must be set together with aws.access_key_id",
            )),
            (None, Some(_)) => out.push(ConfigViolation::new(
                "aws.access_key_id",
                "must be set together with aws.secret_access_key",
            )),
            _ => {},
        }
    }

    fn validate_knowledge_base(&self, out: &mut Vec<ConfigViolation>) {
        let kb = &self.knowledge_base;
        if kb.knowledge_base_id.trim().is_empty() {
            out.push(ConfigViolation::new("knowledge_base.knowledge_base_id", "must not be empty"));
        }
        if kb.model_arn.trim().is_empty() {
            out.push(ConfigViolation::new("knowledge_base.model_arn", "must not be empty"));
        }
        if kb.max_tokens == 0 {
            out.push(ConfigViolation::new("knowledge_base.max_tokens", "must be greater than 0"));
        }
        if !(0.0..=1.0).contains(&kb.temperature) {
            out.push(ConfigViolation::new(
                "knowledge_base.temperature",
                format!("must be between 0.0 and 1.0, got {}", kb.temperature),
            ));
        }
        if !(0.0..=1.0).contains(&kb.top_p) {
            out.push(ConfigViolation::new(
                "knowledge_base.top_p",
                format!("must be between 0.0 and 1.0, got {}", kb.top_p),
            ));
        }
    }

    fn validate_languages(&self, out: &mut Vec<ConfigViolation>) {
        if self.languages.supported.is_empty() {
            out.push(ConfigViolation::new("languages.supported", "must list at least one language"));
        }
        for name in &self.languages.supported {
            if Language::from_str_loose(name).is_none() {
                out.push(ConfigViolation::new(
                    "languages.supported",
                    format!("unknown language {:?}", name),
                ));
            }
        }
    }

    fn validate_server(&self, out: &mut Vec<ConfigViolation>) {
        let server = &self.server;
        if server.port == 0 {
            out.push(ConfigViolation::new("server.port", "must be greater than 0"));
        }
        if server.session_timeout_minutes == 0 {
            out.push(ConfigViolation::new(
                "server.session_timeout_minutes",
                "must be greater than 0",
            ));
        }
        if server.max_sessions == 0 {
            out.push(ConfigViolation::new("server.max_sessions", "must be at least 1"));
        }
        if server.request_timeout_seconds == 0 {
            out.push(ConfigViolation::new(
                "server.request_timeout_seconds",
                "must be at least 1 second",
            ));
        }

        if self.environment.is_production() && server.cors_enabled && server.cors_origins.is_empty()
        {
            tracing::warn!("CORS is enabled in production with no origins configured; only http://localhost:3000 is allowed");
        }
    }

    /// Apply the flat deployment keys on top of everything else
    fn apply_flat_keys(&mut self, vars: &HashMap<String, String>, out: &mut Vec<ConfigViolation>) {
        if let Some(v) = flat_string(vars, env_keys::AWS_REGION) {
            self.aws.region = v;
        }
        if let Some(v) = flat_string(vars, env_keys::AWS_ACCESS_KEY_ID) {
            self.aws.access_key_id = Some(v).filter(|s| !s.is_empty());
        }
        if let Some(v) = flat_string(vars, env_keys::AWS_SECRET_ACCESS_KEY) {
            self.aws.secret_access_key = Some(v).filter(|s| !s.is_empty());
        }
        if let Some(v) = flat_string(vars, env_keys::KNOWLEDGE_BASE_ID) {
            self.knowledge_base.knowledge_base_id = v;
        }
        if let Some(v) = flat_string(vars, env_keys::MODEL_ARN) {
            self.knowledge_base.model_arn = v;
        }
        if let Some(v) = flat_parse(vars, env_keys::MAX_TOKENS, "knowledge_base.max_tokens", "a positive integer", out) {
            self.knowledge_base.max_tokens = v;
        }
        if let Some(v) = flat_parse(vars, env_keys::TEMPERATURE, "knowledge_base.temperature", "a number", out) {
            self.knowledge_base.temperature = v;
        }
        if let Some(v) = flat_parse(vars, env_keys::TOP_P, "knowledge_base.top_p", "a number", out) {
            self.knowledge_base.top_p = v;
        }
        if let Some(v) = flat_string(vars, env_keys::SUPPORTED_LANGUAGES) {
            self.languages.supported = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(v) = flat_string(vars, env_keys::APP_TITLE) {
            self.app.title = v;
        }
        if let Some(v) = flat_string(vars, env_keys::LOG_LEVEL) {
            self.observability.log_level = v;
        }
        if let Some(v) = flat_parse(
            vars,
            env_keys::SESSION_TIMEOUT_MINUTES,
            "server.session_timeout_minutes",
            "a positive integer",
            out,
        ) {
            self.server.session_timeout_minutes = v;
        }
        if let Some(v) = flat_parse(vars, env_keys::PORT, "server.port", "a port number", out) {
            self.server.port = v;
        }
    }

    /// Enabled answer languages, in configured order
    pub fn supported_languages(&self) -> Vec<Language> {
        let mut langs = Vec::new();
        for lang in self.languages.supported.iter().filter_map(|s| Language::from_str_loose(s)) {
            if !langs.contains(&lang) {
                langs.push(lang);
            }
        }
        langs
    }

    /// Parameters sent with every retrieve-and-generate call
    pub fn retrieval_config(&self) -> RetrievalConfig {
        let kb = &self.knowledge_base;
        RetrievalConfig {
            knowledge_base_id: kb.knowledge_base_id.clone(),
            model_reference: kb.model_arn.clone(),
            max_tokens: kb.max_tokens,
            temperature: kb.temperature,
            top_p: kb.top_p,
        }
    }

    /// Human-readable settings with secrets masked, in display order
    pub fn summary(&self) -> Vec<(&'static str, String)> {
        let kb = &self.knowledge_base;
        vec![
            ("environment", format!("{:?}", self.environment).to_lowercase()),
            ("aws.region", self.aws.region.clone()),
            ("aws.access_key_id", redact(self.aws.access_key_id.as_deref()).to_string()),
            ("aws.secret_access_key", redact(self.aws.secret_access_key.as_deref()).to_string()),
            ("knowledge_base.knowledge_base_id", kb.knowledge_base_id.clone()),
            ("knowledge_base.model_arn", kb.model_arn.clone()),
            ("knowledge_base.max_tokens", kb.max_tokens.to_string()),
            ("knowledge_base.temperature", kb.temperature.to_string()),
            ("knowledge_base.top_p", kb.top_p.to_string()),
            ("languages.supported", self.languages.supported.join(",")),
            ("app.title", self.app.title.clone()),
            ("server.port", self.server.port.to_string()),
            (
                "server.session_timeout_minutes",
                self.server.session_timeout_minutes.to_string(),
            ),
            ("observability.log_level", self.observability.log_level.clone()),
        ]
    }
}

fn redact(secret: Option<&str>) -> &'static str {
    match secret {
        Some(_) => REDACTED,
        None => NOT_SET,
    }
}

fn flat_string(vars: &HashMap<String, String>, key: &str) -> Option<String> {
    vars.get(key).map(|v| v.trim().to_string())
}

fn flat_parse<T: FromStr>(
    vars: &HashMap<String, String>,
    key: &str,
    field: &str,
    expected: &str,
    out: &mut Vec<ConfigViolation>,
) -> Option<T> {
    let raw = vars.get(key)?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            out.push(ConfigViolation::new(
                field,
                format!("{} must be {}, got {:?}", key, expected, raw),
            ));
            None
        },
    }
}

/// Load settings from files, the process environment and `.env`
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    // Existing process variables take precedence over .env entries
    let _ = dotenvy::dotenv();
    let vars: HashMap<String, String> = std::env::vars().collect();
    load_settings_from(env, &vars)
}

/// Load settings from files and an explicit variable map
pub fn load_settings_from(
    env: Option<&str>,
    vars: &HashMap<String, String>,
) -> Result<Settings, ConfigError> {
    let env_name = env
        .map(str::to_string)
        .or_else(|| vars.get(env_keys::SEVA_ENV).cloned());

    let mut builder = Config::builder();

    // Load default config
    builder = builder.add_source(File::with_name("config/default").required(false));

    // Load environment-specific config
    if let Some(name) = &env_name {
        builder = builder.add_source(File::with_name(&format!("config/{}", name)).required(false));
    }

    // Nested SEVA__SECTION__KEY variables
    builder = builder.add_source(
        Environment::with_prefix(env_keys::NESTED_PREFIX)
            .separator("__")
            .try_parsing(true)
            .source(Some(vars.clone())),
    );

    let config = builder.build()?;
    let mut violations = Vec::new();

    // A mistyped file or SEVA__ value is reported with the flat-key and range
    // violations; checking continues from the defaults.
    let mut settings = match config.try_deserialize::<Settings>() {
        Ok(settings) => settings,
        Err(e) => {
            violations.push(deserialize_violation(e));
            Settings::default()
        },
    };

    if let Some(environment) = env_name.as_deref().and_then(RuntimeEnvironment::from_name) {
        settings.environment = environment;
    }

    settings.apply_flat_keys(vars, &mut violations);
    violations.extend(settings.violations());

    if !violations.is_empty() {
        tracing::warn!(count = violations.len(), "Configuration rejected");
        return Err(ConfigError::Invalid(violations));
    }

    tracing::debug!(
        environment = ?settings.environment,
        region = %settings.aws.region,
        knowledge_base_id = %settings.knowledge_base.knowledge_base_id,
        "Configuration loaded"
    );
    Ok(settings)
}

fn deserialize_violation(err: config::ConfigError) -> ConfigViolation {
    match &err {
        config::ConfigError::Type { key: Some(key), .. } => {
            ConfigViolation::new(key.clone(), err.to_string())
        },
        _ => ConfigViolation::new("settings", err.to_string()),
    }
}
