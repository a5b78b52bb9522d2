//! Conversation turns and per-session history

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::audio::AudioClip;
use crate::citation::Citation;

/// Role in a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    /// User question
    User,
    /// Generated answer
    Assistant,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for TurnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single turn in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub text: String,
    /// Absent when synthesis failed or for user turns
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioClip>,
    #[serde(default)]
    pub citations: Vec<Citation>,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
            audio: None,
            citations: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(
        text: impl Into<String>,
        audio: Option<AudioClip>,
        citations: Vec<Citation>,
    ) -> Self {
        Self {
            role: TurnRole::Assistant,
            text: text.into(),
            audio,
            citations,
            timestamp: Utc::now(),
        }
    }

    pub fn has_audio(&self) -> bool {
        self.audio.is_some()
    }
}

/// Append-only history for one interactive session
///
/// Insertion order is display order. Turns are never edited; the only
/// removal is [`ConversationSession::clear`], which drops everything.
#[derive(Debug, Clone, Default)]
pub struct ConversationSession {
    turns: Vec<Turn>,
}

impl ConversationSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// All turns, most recent last
    pub fn all(&self) -> &[Turn] {
        &self.turns
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_order() {
        let mut session = ConversationSession::new();
        session.append(Turn::user("What is PM-Kisan scheme?"));
        session.append(Turn::assistant("Income support for farmers.", None, vec![]));
        session.append(Turn::user("Who is eligible?"));

        let texts: Vec<_> = session.all().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(
            texts,
            ["What is PM-Kisan scheme?", "Income support for farmers.", "Who is eligible?"]
        );
        assert_eq!(session.last().map(|t| t.role), Some(TurnRole::User));
    }

    #[test]
    fn test_clear_empties_history() {
        let mut session = ConversationSession::new();
        session.append(Turn::user("hello"));
        session.append(Turn::assistant("hi", Some(AudioClip::mp3(vec![1, 2])), vec![]));
        assert_eq!(session.len(), 2);

        session.clear();
        assert!(session.all().is_empty());
        assert!(session.is_empty());
    }

    #[test]
    fn test_turn_serialization_skips_missing_audio() {
        let json = serde_json::to_value(Turn::user("hello")).unwrap();
        assert_eq!(json["role"], "user");
        assert!(json.get("audio").is_none());
    }
}
