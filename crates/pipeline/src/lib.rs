//! Speech output for generated answers
//!
//! This crate provides:
//! - [`SpeechSynthesizer`]: bounded-length, never-failing synthesis that
//!   degrades to text-only answers
//! - [`PollyTts`]: Amazon Polly backend

pub mod tts;

pub use tts::{truncate_for_synthesis, PollyTts, SpeechSynthesizer, MAX_SYNTHESIS_CHARS};

use seva_core::BackendFailure;
use thiserror::Error;

/// TTS errors
///
/// Internal to synthesis: [`SpeechSynthesizer::synthesize`] converts every
/// one of these into an absent clip.
#[derive(Error, Debug, Clone)]
pub enum TtsError {
    #[error("Nothing to synthesize")]
    EmptyText,

    #[error("Speech backend failed: {0}")]
    Backend(BackendFailure),

    #[error("Speech backend returned no audio")]
    EmptyAudio,
}

impl From<TtsError> for seva_core::Error {
    fn from(err: TtsError) -> Self {
        seva_core::Error::SynthesisFailed(err.to_string())
    }
}
