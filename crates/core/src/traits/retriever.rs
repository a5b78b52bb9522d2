//! Retrieval-and-generation trait

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::citation::RawGeneration;
use crate::error::BackendFailure;

/// Per-call backend parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    pub knowledge_base_id: String,
    /// Foundation model used for generation
    pub model_reference: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

/// Managed knowledge base that retrieves passages and generates an answer
///
/// Implementations:
/// - `BedrockKnowledgeBase` - Amazon Bedrock knowledge base (retrieve_and_generate)
///
/// One call per question. Implementations do not retry.
#[async_trait]
pub trait KnowledgeBase: Send + Sync + 'static {
    async fn retrieve_and_generate(
        &self,
        query: &str,
        config: &RetrievalConfig,
    ) -> Result<RawGeneration, BackendFailure>;

    /// Backend name for logging
    fn name(&self) -> &str;
}
