//! Question answering for one user session
//!
//! Features:
//! - [`QuestionAssistant`]: language routing, knowledge-base retrieval and
//!   speech synthesis for a single question
//! - [`AssistantSession`]: per-session history and voice indicator around
//!   the assistant (`submit_question`, `history`, `clear_history`)

pub mod assistant;
pub mod metrics;
pub mod session;

pub use assistant::{Answer, QuestionAssistant, FALLBACK_ANSWER};
pub use session::AssistantSession;

use seva_core::BackendFailure;
use thiserror::Error;

/// Agent errors
#[derive(Error, Debug, Clone)]
pub enum AgentError {
    /// Empty question; nothing was sent or recorded
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Retrieval failed; carries the raw backend message
    #[error("Knowledge base unavailable: {0}")]
    BackendUnavailable(BackendFailure),

    /// Voice indicator asked to skip a step, e.g. listening -> speaking
    #[error("Invalid voice state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },
}

impl From<seva_rag::RagError> for AgentError {
    fn from(err: seva_rag::RagError) -> Self {
        match err {
            seva_rag::RagError::InvalidInput(msg) => AgentError::InvalidInput(msg),
            seva_rag::RagError::BackendUnavailable(failure) => AgentError::BackendUnavailable(failure),
        }
    }
}

impl From<AgentError> for seva_core::Error {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::InvalidInput(msg) => seva_core::Error::InvalidInput(msg),
            AgentError::BackendUnavailable(failure) => seva_core::Error::BackendUnavailable(failure),
            AgentError::InvalidTransition { from, to } => {
                seva_core::Error::InvalidTransition { from, to }
            },
        }
    }
}
