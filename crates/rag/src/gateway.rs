//! Retrieval gateway
//!
//! Wraps a [`KnowledgeBase`] backend: rejects empty questions before any
//! network call, logs the exchange, and normalizes the raw backend output.

use std::sync::Arc;
use std::time::Instant;

use seva_core::{GenerationResult, KnowledgeBase, RetrievalConfig};

use crate::RagError;

/// Characters of the outbound query included in logs
const LOG_PREVIEW_CHARS: usize = 100;

/// Single entry point for knowledge-base questions
pub struct RetrievalGateway {
    backend: Arc<dyn KnowledgeBase>,
    config: RetrievalConfig,
}

impl RetrievalGateway {
    pub fn new(backend: Arc<dyn KnowledgeBase>, config: RetrievalConfig) -> Self {
        Self { backend, config }
    }

    /// Parameters used by [`RetrievalGateway::query`]
    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Ask the knowledge base with the configured parameters
    pub async fn query(&self, query_text: &str) -> Result<GenerationResult, RagError> {
        self.query_with(query_text, &self.config).await
    }

    /// Ask the knowledge base with explicit parameters
    ///
    /// Exactly one backend call per invocation, no retries. Citations keep
    /// backend order.
    pub async fn query_with(
        &self,
        query_text: &str,
        config: &RetrievalConfig,
    ) -> Result<GenerationResult, RagError> {
        if query_text.trim().is_empty() {
            return Err(RagError::InvalidInput("question is empty".to_string()));
        }

        tracing::info!(
            backend = self.backend.name(),
            knowledge_base_id = %config.knowledge_base_id,
            query = %preview(query_text),
            "Querying knowledge base"
        );

        let start = Instant::now();
        match self.backend.retrieve_and_generate(query_text, config).await {
            Ok(raw) => {
                let result = GenerationResult::from_raw(raw);
                tracing::info!(
                    response_len = result.generated_text.len(),
                    citations = result.citations.len(),
                    latency_ms = start.elapsed().as_millis() as u64,
                    "Knowledge base answered"
                );
                Ok(result)
            },
            Err(failure) => {
                tracing::error!(
                    kind = %failure.kind,
                    code = failure.code.as_deref().unwrap_or("-"),
                    message = %failure.message,
                    "Knowledge base query failed"
                );
                Err(RagError::BackendUnavailable(failure))
            },
        }
    }
}

fn preview(text: &str) -> &str {
    match text.char_indices().nth(LOG_PREVIEW_CHARS) {
        Some((cut, _)) => &text[..cut],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use seva_core::{BackendErrorKind, BackendFailure, RawGeneration, RetrievedReference};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct MockKnowledgeBase {
        calls: AtomicUsize,
        last_query: Mutex<Option<String>>,
        response: Result<RawGeneration, BackendFailure>,
    }

    impl MockKnowledgeBase {
        fn answering(raw: RawGeneration) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                last_query: Mutex::new(None),
                response: Ok(raw),
            }
        }

        fn failing(failure: BackendFailure) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                last_query: Mutex::new(None),
                response: Err(failure),
            }
        }
    }

    #[async_trait]
    impl KnowledgeBase for MockKnowledgeBase {
        async fn retrieve_and_generate(
            &self,
            query: &str,
            _config: &RetrievalConfig,
        ) -> Result<RawGeneration, BackendFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_query.lock().unwrap() = Some(query.to_string());
            self.response.clone()
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    fn config() -> RetrievalConfig {
        RetrievalConfig {
            knowledge_base_id: "KB1".into(),
            model_reference: "model".into(),
            max_tokens: 512,
            temperature: 0.7,
            top_p: 0.9,
        }
    }

    #[tokio::test]
    async fn test_empty_query_never_reaches_backend() {
        let backend = Arc::new(MockKnowledgeBase::answering(RawGeneration::default()));
        let gateway = RetrievalGateway::new(backend.clone(), config());

        for input in ["", "   ", "\n\t"] {
            let err = gateway.query(input).await.unwrap_err();
            assert!(matches!(err, RagError::InvalidInput(_)));
        }
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_answer_is_normalized() {
        let backend = Arc::new(MockKnowledgeBase::answering(RawGeneration {
            text: "PM-Kisan provides income support to farmers.".into(),
            references: vec![
                RetrievedReference::new("s3://bucket/doc1.pdf", "x".repeat(400)),
                RetrievedReference::new("s3://bucket/doc2.pdf", "short"),
            ],
            session_id: "abc".into(),
        }));
        let gateway = RetrievalGateway::new(backend.clone(), config());

        let result = gateway.query("What is PM-Kisan scheme?").await.unwrap();
        assert_eq!(result.generated_text, "PM-Kisan provides income support to farmers.");
        assert_eq!(result.citations.len(), 2);
        assert_eq!(result.citations[0].source_document_name, "doc1.pdf");
        assert_eq!(result.citations[0].excerpt.chars().count(), 303);
        assert_eq!(result.citations[1].source_document_name, "doc2.pdf");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            backend.last_query.lock().unwrap().as_deref(),
            Some("What is PM-Kisan scheme?")
        );
    }

    #[tokio::test]
    async fn test_no_citations_is_success() {
        let backend = Arc::new(MockKnowledgeBase::answering(RawGeneration {
            text: "answer".into(),
            references: vec![],
            session_id: "s".into(),
        }));
        let gateway = RetrievalGateway::new(backend, config());
        let result = gateway.query("question").await.unwrap();
        assert!(result.citations.is_empty());
    }

    #[tokio::test]
    async fn test_backend_failure_surfaces_kind_and_message() {
        let backend = Arc::new(MockKnowledgeBase::failing(BackendFailure::from_code(
            "AccessDeniedException",
            "User is not authorized to perform bedrock:RetrieveAndGenerate",
        )));
        let gateway = RetrievalGateway::new(backend.clone(), config());

        match gateway.query("question").await.unwrap_err() {
            RagError::BackendUnavailable(failure) => {
                assert_eq!(failure.kind, BackendErrorKind::AccessDenied);
                assert!(failure.message.contains("not authorized"));
            },
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_preview_is_char_safe() {
        let text = "प्रधानमंत्री".repeat(50);
        assert_eq!(preview(&text).chars().count(), LOG_PREVIEW_CHARS);
        assert_eq!(preview("short"), "short");
    }
}
