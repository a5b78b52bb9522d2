//! Backend traits
//!
//! Both managed services sit behind a trait so the gateway and synthesizer
//! can be exercised against doubles and the AWS clients stay at the edge.
//!
//! ```text
//! Retrieval:
//!   - KnowledgeBase: question → generated text + references
//!
//! Speech:
//!   - TextToSpeech: text + voice → encoded audio
//! ```

mod retriever;
mod speech;

pub use retriever::{KnowledgeBase, RetrievalConfig};
pub use speech::{SpeechEngine, SpeechRequest, TextToSpeech};
