//! Speech synthesis trait

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::audio::AudioEncoding;
use crate::error::BackendFailure;

/// Synthesis engine. Fixed for this deployment; not configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SpeechEngine {
    #[default]
    Standard,
}

/// One synthesis call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechRequest {
    pub text: String,
    pub voice_id: String,
    pub locale_code: String,
    pub encoding: AudioEncoding,
    pub engine: SpeechEngine,
}

/// Text-to-Speech interface
///
/// Implementations:
/// - `PollyTts` - Amazon Polly
#[async_trait]
pub trait TextToSpeech: Send + Sync + 'static {
    /// Synthesize the request into encoded audio bytes
    async fn synthesize(&self, request: &SpeechRequest) -> Result<Vec<u8>, BackendFailure>;

    /// Backend name for logging
    fn model_name(&self) -> &str;
}
