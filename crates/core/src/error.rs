//! Error taxonomy shared by every crate

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// Empty or whitespace-only question; never reaches a backend
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Retrieval backend unreachable, throttled or denying access
    #[error("Knowledge base unavailable: {0}")]
    BackendUnavailable(BackendFailure),

    /// Speech backend failure; callers degrade to text-only
    #[error("Speech synthesis failed: {0}")]
    SynthesisFailed(String),

    #[error("Invalid configuration: {}", .0.join("; "))]
    ConfigurationInvalid(Vec<String>),

    #[error("Invalid voice state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },
}

/// Category of a managed-backend failure, derived from its error code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendErrorKind {
    NotFound,
    AccessDenied,
    Throttling,
    UnrecognizedClient,
    Validation,
    /// Transport failure before any service response
    Network,
    Other,
}

impl BackendErrorKind {
    /// Classify a service error code such as `ResourceNotFoundException`
    pub fn from_code(code: &str) -> Self {
        match code {
            "ResourceNotFoundException" | "NotFoundException" => Self::NotFound,
            "AccessDeniedException" | "AccessDenied" => Self::AccessDenied,
            "ThrottlingException" | "TooManyRequestsException" | "ServiceQuotaExceededException" => {
                Self::Throttling
            },
            "UnrecognizedClientException"
            | "InvalidClientTokenId"
            | "InvalidSignatureException"
            | "SignatureDoesNotMatch"
            | "ExpiredToken"
            | "ExpiredTokenException" => Self::UnrecognizedClient,
            "ValidationException" | "BadRequestException" => Self::Validation,
            _ => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::AccessDenied => "access_denied",
            Self::Throttling => "throttling",
            Self::UnrecognizedClient => "unrecognized_client",
            Self::Validation => "validation",
            Self::Network => "network",
            Self::Other => "other",
        }
    }

    /// What an operator should check for this kind of failure
    pub fn remediation_hint(&self) -> &'static str {
        match self {
            Self::NotFound => "Check that KNOWLEDGE_BASE_ID and MODEL_ARN exist in AWS_REGION",
            Self::AccessDenied => {
                "Grant bedrock:InvokeModel, bedrock:Retrieve and bedrock:RetrieveAndGenerate to the IAM principal"
            },
            Self::Throttling => "Request rate exceeded; wait and retry, or raise the service quota",
            Self::UnrecognizedClient => {
                "Credentials were rejected; create new access keys or check AWS_ACCESS_KEY_ID/AWS_SECRET_ACCESS_KEY"
            },
            Self::Validation => "The request was rejected as malformed; check MODEL_ARN and generation parameters",
            Self::Network => "Could not reach the service; check network access and AWS_REGION",
            Self::Other => "Unexpected service error; see the message for details",
        }
    }
}

impl std::fmt::Display for BackendErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A categorized backend failure carrying the raw backend message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendFailure {
    pub kind: BackendErrorKind,
    /// Error code as reported by the service, when there was one
    pub code: Option<String>,
    pub message: String,
}

impl BackendFailure {
    pub fn new(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: None,
            message: message.into(),
        }
    }

    /// Build from a service error code, classifying it
    pub fn from_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        let code = code.into();
        Self {
            kind: BackendErrorKind::from_code(&code),
            code: Some(code),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for BackendFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.code {
            Some(code) => write!(f, "[{}] {}", code, self.message),
            None => write!(f, "[{}] {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for BackendFailure {}
