//! Retrieval-augmented answers from a managed knowledge base
//!
//! Features:
//! - [`RetrievalGateway`]: input guard, logging and normalization of
//!   backend output into a [`seva_core::GenerationResult`]
//! - [`BedrockKnowledgeBase`]: Amazon Bedrock `RetrieveAndGenerate` backend
//!   with generation parameters and categorized service errors

pub mod bedrock;
pub mod gateway;

pub use bedrock::BedrockKnowledgeBase;
pub use gateway::RetrievalGateway;

use seva_core::BackendFailure;
use thiserror::Error;

/// RAG errors
#[derive(Error, Debug, Clone)]
pub enum RagError {
    /// Rejected before any backend call
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Knowledge base unavailable: {0}")]
    BackendUnavailable(BackendFailure),
}

impl From<RagError> for seva_core::Error {
    fn from(err: RagError) -> Self {
        match err {
            RagError::InvalidInput(msg) => seva_core::Error::InvalidInput(msg),
            RagError::BackendUnavailable(failure) => seva_core::Error::BackendUnavailable(failure),
        }
    }
}
