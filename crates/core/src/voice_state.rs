//! Per-turn voice activity indicator
//!
//! ```text
//! idle ──▶ listening ──▶ processing ──▶ speaking ──▶ idle
//!   │          │              ▲  │                   ▲
//!   │          └──▶ idle      │  └───────────────────┘ (no audio / failure)
//!   └─────────────────────────┘ (typed question)
//! ```
//!
//! Speaking is only reachable from processing.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VoiceActivityState {
    #[default]
    Idle,
    /// Capturing the user's speech
    Listening,
    /// Question in flight
    Processing,
    /// Answer audio playing
    Speaking,
}

impl VoiceActivityState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Listening => "listening",
            Self::Processing => "processing",
            Self::Speaking => "speaking",
        }
    }

    /// Status text for the voice button
    pub fn status_label(&self) -> &'static str {
        match self {
            Self::Idle => "Ready to Listen",
            Self::Listening => "Listening...",
            Self::Processing => "Processing...",
            Self::Speaking => "Speaking...",
        }
    }

    pub fn can_transition_to(&self, target: VoiceActivityState) -> bool {
        use VoiceActivityState::*;
        matches!(
            (self, target),
            (Idle, Listening)
                | (Idle, Processing)
                | (Listening, Processing)
                | (Listening, Idle)
                | (Processing, Speaking)
                | (Processing, Idle)
                | (Speaking, Idle)
        )
    }
}

impl std::fmt::Display for VoiceActivityState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current indicator state with guarded transitions
#[derive(Debug, Clone, Default)]
pub struct VoiceActivityTracker {
    state: VoiceActivityState,
}

impl VoiceActivityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> VoiceActivityState {
        self.state
    }

    /// Move to `target`; staying in the current state is a no-op
    pub fn transition(&mut self, target: VoiceActivityState) -> Result<()> {
        if self.state == target {
            return Ok(());
        }
        if !self.state.can_transition_to(target) {
            return Err(Error::InvalidTransition {
                from: self.state.to_string(),
                to: target.to_string(),
            });
        }
        self.state = target;
        Ok(())
    }

    /// Return to idle from any state
    pub fn reset(&mut self) {
        self.state = VoiceActivityState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use VoiceActivityState::*;

    #[test]
    fn test_full_voice_cycle() {
        let mut tracker = VoiceActivityTracker::new();
        for next in [Listening, Processing, Speaking, Idle] {
            tracker.transition(next).unwrap();
            assert_eq!(tracker.state(), next);
        }
    }

    #[test]
    fn test_listening_cannot_skip_processing() {
        let mut tracker = VoiceActivityTracker::new();
        tracker.transition(Listening).unwrap();
        let err = tracker.transition(Speaking).unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { .. }));
        assert_eq!(tracker.state(), Listening);
    }

    #[test]
    fn test_typed_question_goes_straight_to_processing() {
        let mut tracker = VoiceActivityTracker::new();
        tracker.transition(Processing).unwrap();
        tracker.transition(Idle).unwrap();
        assert!(!Idle.can_transition_to(Speaking));
    }

    #[test]
    fn test_same_state_is_noop() {
        let mut tracker = VoiceActivityTracker::new();
        assert!(tracker.transition(Idle).is_ok());
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(Idle.status_label(), "Ready to Listen");
        assert_eq!(Speaking.status_label(), "Speaking...");
    }
}
