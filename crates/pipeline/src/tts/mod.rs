//! Text-to-Speech
//!
//! [`SpeechSynthesizer`] turns an answer into an mp3 clip using the voice of
//! the selected language. Audio is optional output: every failure is logged
//! and reported as `None` so the text answer is still shown.

mod polly;

pub use polly::PollyTts;

use std::sync::Arc;
use std::time::Instant;

use seva_core::{
    AudioClip, AudioEncoding, LanguageProfile, SpeechEngine, SpeechRequest, TextToSpeech,
};

use crate::TtsError;

/// Longest text sent to the speech backend, in characters
pub const MAX_SYNTHESIS_CHARS: usize = 3000;

/// First `max_chars` characters of `text`
pub fn truncate_for_synthesis(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => &text[..cut],
        None => text,
    }
}

/// Speech synthesizer for answers
pub struct SpeechSynthesizer {
    backend: Arc<dyn TextToSpeech>,
    max_chars: usize,
}

impl SpeechSynthesizer {
    pub fn new(backend: Arc<dyn TextToSpeech>) -> Self {
        Self {
            backend,
            max_chars: MAX_SYNTHESIS_CHARS,
        }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.model_name()
    }

    /// Synthesize `text` in the profile's voice, or `None` on any failure
    pub async fn synthesize(&self, text: &str, profile: &LanguageProfile) -> Option<AudioClip> {
        match self.try_synthesize(text, profile).await {
            Ok(clip) => Some(clip),
            Err(TtsError::EmptyText) => None,
            Err(e) => {
                tracing::warn!(
                    voice = profile.voice_id,
                    locale = profile.locale_code,
                    error = %e,
                    "Speech synthesis failed, answering with text only"
                );
                None
            },
        }
    }

    /// Synthesize with the failure reason kept
    ///
    /// Text beyond [`MAX_SYNTHESIS_CHARS`] is dropped before the call. The
    /// engine is always [`SpeechEngine::Standard`].
    pub async fn try_synthesize(
        &self,
        text: &str,
        profile: &LanguageProfile,
    ) -> Result<AudioClip, TtsError> {
        if text.trim().is_empty() {
            return Err(TtsError::EmptyText);
        }

        let bounded = truncate_for_synthesis(text, self.max_chars);
        if bounded.len() < text.len() {
            tracing::debug!(
                original_chars = text.chars().count(),
                kept_chars = self.max_chars,
                "Answer truncated for synthesis"
            );
        }

        let request = SpeechRequest {
            text: bounded.to_string(),
            voice_id: profile.voice_id.to_string(),
            locale_code: profile.locale_code.to_string(),
            encoding: AudioEncoding::Mp3,
            engine: SpeechEngine::Standard,
        };

        tracing::info!(
            backend = self.backend.model_name(),
            voice = %request.voice_id,
            locale = %request.locale_code,
            text_len = request.text.chars().count(),
            "Synthesizing speech"
        );

        let start = Instant::now();
        let bytes = self
            .backend
            .synthesize(&request)
            .await
            .map_err(TtsError::Backend)?;
        if bytes.is_empty() {
            return Err(TtsError::EmptyAudio);
        }

        tracing::info!(
            audio_bytes = bytes.len(),
            latency_ms = start.elapsed().as_millis() as u64,
            "Speech synthesized"
        );
        Ok(AudioClip::mp3(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use seva_core::{BackendErrorKind, BackendFailure, Language};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct RecordingTts {
        calls: AtomicUsize,
        last: Mutex<Option<SpeechRequest>>,
        reply: Result<Vec<u8>, BackendFailure>,
    }

    impl RecordingTts {
        fn new(reply: Result<Vec<u8>, BackendFailure>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                last: Mutex::new(None),
                reply,
            })
        }
    }

    #[async_trait]
    impl TextToSpeech for RecordingTts {
        async fn synthesize(&self, request: &SpeechRequest) -> Result<Vec<u8>, BackendFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last.lock().unwrap() = Some(request.clone());
            self.reply.clone()
        }

        fn model_name(&self) -> &str {
            "recording"
        }
    }

    #[tokio::test]
    async fn test_uses_profile_voice_and_locale() {
        let backend = RecordingTts::new(Ok(vec![0xFF, 0xFB]));
        let synth = SpeechSynthesizer::new(backend.clone());

        let clip = synth
            .synthesize("नमस्ते", Language::Hindi.profile())
            .await
            .unwrap();
        assert_eq!(clip.mime_type, "audio/mpeg");
        assert_eq!(clip.bytes, vec![0xFF, 0xFB]);

        let request = backend.last.lock().unwrap().clone().unwrap();
        assert_eq!(request.voice_id, "Aditi");
        assert_eq!(request.locale_code, "hi-IN");
        assert_eq!(request.encoding, AudioEncoding::Mp3);
        assert_eq!(request.engine, SpeechEngine::Standard);
    }

    #[tokio::test]
    async fn test_long_text_truncated_to_limit() {
        let backend = RecordingTts::new(Ok(vec![1]));
        let synth = SpeechSynthesizer::new(backend.clone());

        let text = "a".repeat(5000);
        synth.synthesize(&text, Language::English.profile()).await.unwrap();

        let request = backend.last.lock().unwrap().clone().unwrap();
        assert_eq!(request.text.chars().count(), MAX_SYNTHESIS_CHARS);
        assert_eq!(request.text, text[..MAX_SYNTHESIS_CHARS]);
    }

    #[tokio::test]
    async fn test_backend_failure_yields_none() {
        let backend = RecordingTts::new(Err(BackendFailure::new(
            BackendErrorKind::Network,
            "connection reset",
        )));
        let synth = SpeechSynthesizer::new(backend.clone());

        assert!(synth.synthesize("hello", Language::English.profile()).await.is_none());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_audio_yields_none() {
        let backend = RecordingTts::new(Ok(Vec::new()));
        let synth = SpeechSynthesizer::new(backend);

        assert!(synth.synthesize("hello", Language::English.profile()).await.is_none());
        let err = synth
            .try_synthesize("hello", Language::English.profile())
            .await
            .unwrap_err();
        assert!(matches!(err, TtsError::EmptyAudio));
    }

    #[tokio::test]
    async fn test_blank_text_skips_backend() {
        let backend = RecordingTts::new(Ok(vec![1]));
        let synth = SpeechSynthesizer::new(backend.clone());

        assert!(synth.synthesize("  ", Language::Tamil.profile()).await.is_none());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_truncate_counts_characters() {
        let text = "தமிழ்".repeat(1000);
        let cut = truncate_for_synthesis(&text, MAX_SYNTHESIS_CHARS);
        assert_eq!(cut.chars().count(), MAX_SYNTHESIS_CHARS);
        assert_eq!(truncate_for_synthesis("short", MAX_SYNTHESIS_CHARS), "short");
    }
}
