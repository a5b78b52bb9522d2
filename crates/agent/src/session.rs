//! Per-session question handling
//!
//! An [`AssistantSession`] owns one user's history and voice indicator.
//! Methods take `&mut self`, so a session handles one question at a time;
//! independent sessions share only the [`QuestionAssistant`].

use std::sync::Arc;

use seva_core::{ConversationSession, Turn, VoiceActivityState, VoiceActivityTracker};

use crate::assistant::QuestionAssistant;
use crate::AgentError;

pub struct AssistantSession {
    assistant: Arc<QuestionAssistant>,
    history: ConversationSession,
    voice: VoiceActivityTracker,
}

impl AssistantSession {
    pub fn new(assistant: Arc<QuestionAssistant>) -> Self {
        Self {
            assistant,
            history: ConversationSession::new(),
            voice: VoiceActivityTracker::new(),
        }
    }

    /// Ask a question and record both turns
    ///
    /// An empty question fails before anything is recorded or sent. When
    /// retrieval fails the user turn stays in history, no assistant turn is
    /// added, and the error is returned for display. Dropping the returned
    /// future mid-flight leaves history the same way and the indicator idle.
    pub async fn submit_question(
        &mut self,
        text: &str,
        display_language: &str,
    ) -> Result<Turn, AgentError> {
        if text.trim().is_empty() {
            return Err(AgentError::InvalidInput("question is empty".to_string()));
        }

        // A new question interrupts playback of the previous answer.
        if self.voice.state() == VoiceActivityState::Speaking {
            self.voice.reset();
        }
        transition(&mut self.voice, VoiceActivityState::Processing)?;
        self.history.append(Turn::user(text));

        let mut processing = ProcessingGuard::new(&mut self.voice);
        let answer = self.assistant.answer(text, display_language).await?;

        let turn = Turn::assistant(answer.text, answer.audio, answer.citations);
        self.history.append(turn.clone());
        let next = if turn.has_audio() {
            VoiceActivityState::Speaking
        } else {
            VoiceActivityState::Idle
        };
        processing.complete(next)?;
        Ok(turn)
    }

    /// All turns, most recent last
    pub fn history(&self) -> &[Turn] {
        self.history.all()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
        tracing::debug!("Conversation history cleared");
    }

    pub fn voice_state(&self) -> VoiceActivityState {
        self.voice.state()
    }

    /// Voice capture started in the client
    pub fn begin_listening(&mut self) -> Result<VoiceActivityState, AgentError> {
        if self.voice.state() == VoiceActivityState::Speaking {
            self.voice.reset();
        }
        self.transition(VoiceActivityState::Listening)?;
        Ok(self.voice.state())
    }

    /// Voice capture ended without a question
    pub fn stop_listening(&mut self) -> Result<VoiceActivityState, AgentError> {
        if self.voice.state() == VoiceActivityState::Listening {
            self.transition(VoiceActivityState::Idle)?;
        }
        Ok(self.voice.state())
    }

    /// Answer audio finished playing in the client
    pub fn playback_finished(&mut self) -> Result<VoiceActivityState, AgentError> {
        if self.voice.state() == VoiceActivityState::Speaking {
            self.transition(VoiceActivityState::Idle)?;
        }
        Ok(self.voice.state())
    }

    fn transition(&mut self, target: VoiceActivityState) -> Result<(), AgentError> {
        transition(&mut self.voice, target)
    }
}

fn transition(
    voice: &mut VoiceActivityTracker,
    target: VoiceActivityState,
) -> Result<(), AgentError> {
    voice.transition(target).map_err(|_| AgentError::InvalidTransition {
        from: voice.state().to_string(),
        to: target.to_string(),
    })
}

/// Returns the indicator to idle unless the answer was delivered
///
/// Covers retrieval errors and a cancelled request future alike.
struct ProcessingGuard<'a> {
    voice: &'a mut VoiceActivityTracker,
    done: bool,
}

impl<'a> ProcessingGuard<'a> {
    fn new(voice: &'a mut VoiceActivityTracker) -> Self {
        Self { voice, done: false }
    }

    fn complete(&mut self, next: VoiceActivityState) -> Result<(), AgentError> {
        transition(self.voice, next)?;
        self.done = true;
        Ok(())
    }
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        if !self.done {
            tracing::debug!(state = %self.voice.state(), "Question abandoned, indicator reset");
            self.voice.reset();
        }
    }
}
