//! SevaSetu Server
//!
//! HTTP surface for the question assistant: per-user sessions, question
//! submission, history, the voice indicator, languages, health and metrics.

pub mod aws;
pub mod http;
pub mod metrics;
pub mod session;
pub mod state;

pub use http::create_router;
pub use crate::metrics::{init_metrics, record_error, record_request};
pub use session::{Session, SessionManager};
pub use state::AppState;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use seva_agent::AgentError;
use seva_core::BackendFailure;
use thiserror::Error;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Session not found: {0}")]
    NotFound(String),

    #[error("Max sessions reached ({0})")]
    CapacityReached(usize),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Knowledge base unavailable: {0}")]
    BackendUnavailable(BackendFailure),

    #[error("Invalid voice state transition: {from} -> {to}")]
    Conflict { from: String, to: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServerError {
    /// Short machine-readable label, also used as the metrics label
    pub fn kind(&self) -> &'static str {
        match self {
            ServerError::NotFound(_) => "not_found",
            ServerError::CapacityReached(_) => "capacity_reached",
            ServerError::InvalidRequest(_) => "invalid_request",
            ServerError::BackendUnavailable(_) => "backend_unavailable",
            ServerError::Conflict { .. } => "invalid_transition",
            ServerError::Internal(_) => "internal",
        }
    }
}

impl From<ServerError> for StatusCode {
    fn from(err: ServerError) -> Self {
        StatusCode::from(&err)
    }
}

impl From<&ServerError> for StatusCode {
    fn from(err: &ServerError) -> Self {
        match err {
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::CapacityReached(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::BackendUnavailable(_) => StatusCode::BAD_GATEWAY,
            ServerError::Conflict { .. } => StatusCode::CONFLICT,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AgentError> for ServerError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::InvalidInput(msg) => ServerError::InvalidRequest(msg),
            AgentError::BackendUnavailable(failure) => ServerError::BackendUnavailable(failure),
            AgentError::InvalidTransition { from, to } => ServerError::Conflict { from, to },
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = StatusCode::from(&self);
        record_error(self.kind());

        // Backend failures carry the raw service message.
        let body = match &self {
            ServerError::BackendUnavailable(failure) => serde_json::json!({
                "error": self.kind(),
                "message": failure.message,
                "backend": {
                    "kind": failure.kind.as_str(),
                    "code": failure.code,
                    "hint": failure.kind.remediation_hint(),
                },
            }),
            _ => serde_json::json!({
                "error": self.kind(),
                "message": self.to_string(),
            }),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seva_core::BackendErrorKind;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            StatusCode::from(ServerError::NotFound("x".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            StatusCode::from(ServerError::CapacityReached(10)),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            StatusCode::from(ServerError::BackendUnavailable(BackendFailure::new(
                BackendErrorKind::Throttling,
                "slow down"
            ))),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_agent_errors_convert() {
        let err: ServerError = AgentError::InvalidInput("question is empty".into()).into();
        assert!(matches!(err, ServerError::InvalidRequest(_)));

        let err: ServerError = AgentError::InvalidTransition {
            from: "listening".into(),
            to: "speaking".into(),
        }
        .into();
        assert_eq!(StatusCode::from(&err), StatusCode::CONFLICT);
    }
}
