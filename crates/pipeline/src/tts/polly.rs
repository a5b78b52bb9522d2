//! Amazon Polly backend

use async_trait::async_trait;
use aws_sdk_polly as polly;
use polly::types::{Engine, LanguageCode, OutputFormat, VoiceId};

use seva_core::{
    AudioEncoding, BackendErrorKind, BackendFailure, SpeechEngine, SpeechRequest, TextToSpeech,
};

pub struct PollyTts {
    client: polly::Client,
}

impl PollyTts {
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self {
            client: polly::Client::new(sdk_config),
        }
    }

    pub fn from_client(client: polly::Client) -> Self {
        Self { client }
    }
}

fn output_format(encoding: AudioEncoding) -> OutputFormat {
    match encoding {
        AudioEncoding::Mp3 => OutputFormat::Mp3,
    }
}

fn engine(engine: SpeechEngine) -> Engine {
    match engine {
        SpeechEngine::Standard => Engine::Standard,
    }
}

#[async_trait]
impl TextToSpeech for PollyTts {
    async fn synthesize(&self, request: &SpeechRequest) -> Result<Vec<u8>, BackendFailure> {
        let response = self
            .client
            .synthesize_speech()
            .text(&request.text)
            .output_format(output_format(request.encoding))
            .voice_id(VoiceId::from(request.voice_id.as_str()))
            .language_code(LanguageCode::from(request.locale_code.as_str()))
            .engine(engine(request.engine))
            .send()
            .await
            .map_err(|e| BackendFailure::from_sdk_error(&e))?;

        let audio = response
            .audio_stream
            .collect()
            .await
            .map_err(|e| BackendFailure::new(BackendErrorKind::Network, e.to_string()))?;
        Ok(audio.into_bytes().to_vec())
    }

    fn model_name(&self) -> &str {
        "polly"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_engine_and_format() {
        assert_eq!(engine(SpeechEngine::Standard), Engine::Standard);
        assert_eq!(output_format(AudioEncoding::Mp3), OutputFormat::Mp3);
    }

    #[test]
    fn test_indian_locales_map_to_known_codes() {
        assert_eq!(LanguageCode::from("en-IN"), LanguageCode::EnIn);
        assert_eq!(LanguageCode::from("hi-IN"), LanguageCode::HiIn);
        assert_eq!(VoiceId::from("Aditi"), VoiceId::Aditi);
    }
}
