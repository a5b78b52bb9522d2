//! Core types and traits for the SevaSetu assistant
//!
//! This crate provides foundational types used across all other crates:
//! - Answer languages and their voice profiles
//! - Citations and generation results
//! - Conversation turns and session history
//! - Voice activity indicator state
//! - Backend traits (knowledge base, speech)
//! - Error types, with AWS SDK error classification behind the `aws` feature

pub mod audio;
pub mod citation;
pub mod conversation;
pub mod error;
pub mod language;
#[cfg(feature = "aws")]
pub mod sdk_error;
pub mod traits;
pub mod voice_state;

pub use audio::{AudioClip, AudioEncoding};
pub use citation::{Citation, GenerationResult, RawGeneration, RetrievedReference};
pub use conversation::{ConversationSession, Turn, TurnRole};
pub use error::{BackendErrorKind, BackendFailure, Error, Result};
pub use language::{Language, LanguageProfile, LanguageRouter};
pub use voice_state::{VoiceActivityState, VoiceActivityTracker};

pub use traits::{KnowledgeBase, RetrievalConfig, SpeechEngine, SpeechRequest, TextToSpeech};
