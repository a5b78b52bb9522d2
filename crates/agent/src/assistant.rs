//! Question assistant
//!
//! ```text
//! question + display language
//!   └─▶ LanguageRouter ──▶ RetrievalGateway ──▶ SpeechSynthesizer ──▶ Answer
//!        (profile, prefix)   (text, citations)    (optional mp3)
//! ```
//!
//! Retrieval and synthesis run strictly one after the other; synthesis
//! needs the generated text.

use std::time::Instant;

use seva_core::{AudioClip, Citation, LanguageProfile, LanguageRouter};
use seva_pipeline::SpeechSynthesizer;
use seva_rag::RetrievalGateway;

use crate::metrics;
use crate::AgentError;

/// Shown and voiced when the knowledge base returns no text
pub const FALLBACK_ANSWER: &str = "Sorry, I could not find an answer.";

/// One answered question
#[derive(Debug, Clone)]
pub struct Answer {
    pub profile: &'static LanguageProfile,
    pub text: String,
    pub citations: Vec<Citation>,
    /// `None` when synthesis failed; the text answer stands on its own
    pub audio: Option<AudioClip>,
    pub backend_session_id: String,
}

/// Stateless question pipeline shared by every session
pub struct QuestionAssistant {
    router: LanguageRouter,
    gateway: RetrievalGateway,
    synthesizer: SpeechSynthesizer,
}

impl QuestionAssistant {
    pub fn new(
        router: LanguageRouter,
        gateway: RetrievalGateway,
        synthesizer: SpeechSynthesizer,
    ) -> Self {
        Self {
            router,
            gateway,
            synthesizer,
        }
    }

    pub fn router(&self) -> &LanguageRouter {
        &self.router
    }

    pub fn gateway(&self) -> &RetrievalGateway {
        &self.gateway
    }

    /// Answer `question` in the language picked as `display_language`
    ///
    /// Unknown or disabled languages answer in English. Retrieval failures
    /// are returned; synthesis failures only drop the audio.
    pub async fn answer(&self, question: &str, display_language: &str) -> Result<Answer, AgentError> {
        if question.trim().is_empty() {
            return Err(AgentError::InvalidInput("question is empty".to_string()));
        }

        let profile = self.router.resolve(display_language);
        let augmented = self.router.augment(question, profile);
        metrics::record_question(profile.language.code());

        let start = Instant::now();
        let retrieved = self.gateway.query(&augmented).await;
        metrics::record_retrieval_latency(start.elapsed(), retrieved.is_ok());
        let result = retrieved?;

        let text = if result.generated_text.trim().is_empty() {
            tracing::debug!("Knowledge base returned no text, using fallback answer");
            FALLBACK_ANSWER.to_string()
        } else {
            result.generated_text
        };

        let start = Instant::now();
        let audio = self.synthesizer.synthesize(&text, profile).await;
        metrics::record_synthesis_latency(start.elapsed());
        if audio.is_none() {
            metrics::record_synthesis_failure();
        }

        Ok(Answer {
            profile,
            text,
            citations: result.citations,
            audio,
            backend_session_id: result.backend_session_id,
        })
    }
}
