//! Session Management
//!
//! One [`Session`] per browser tab. Each wraps an [`AssistantSession`] behind
//! an async mutex, so a session answers one question at a time while other
//! sessions proceed independently. Idle sessions are removed after the
//! configured timeout.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use seva_agent::{AssistantSession, QuestionAssistant};
use tokio::sync::{watch, Mutex, MutexGuard};

use crate::ServerError;

/// A user session
pub struct Session {
    /// Session ID
    pub id: String,
    /// Wall-clock creation time, reported to clients
    pub created_at: DateTime<Utc>,
    /// Last activity
    last_activity: RwLock<Instant>,
    /// Is active
    active: RwLock<bool>,
    assistant: Mutex<AssistantSession>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(id: impl Into<String>, assistant: Arc<QuestionAssistant>) -> Self {
        Self {
            id: id.into(),
            created_at: Utc::now(),
            last_activity: RwLock::new(Instant::now()),
            active: RwLock::new(true),
            assistant: Mutex::new(AssistantSession::new(assistant)),
        }
    }

    /// Exclusive access to the conversation, waiting for any question
    /// already in flight
    pub async fn lock(&self) -> MutexGuard<'_, AssistantSession> {
        self.touch();
        self.assistant.lock().await
    }

    /// Update last activity
    pub fn touch(&self) {
        *self.last_activity.write() = Instant::now();
    }

    /// Check if session is expired
    pub fn is_expired(&self, timeout: Duration) -> bool {
        self.last_activity.read().elapsed() > timeout
    }

    /// Close session
    pub fn close(&self) {
        *self.active.write() = false;
    }

    /// Is session active
    pub fn is_active(&self) -> bool {
        *self.active.read()
    }
}

/// Session manager
pub struct SessionManager {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
    max_sessions: usize,
    session_timeout: Duration,
    cleanup_interval: Duration,
}

impl SessionManager {
    /// Create a new session manager with a 30 minute idle timeout
    pub fn new(max_sessions: usize) -> Self {
        Self::with_config(
            max_sessions,
            Duration::from_secs(30 * 60),
            Duration::from_secs(60),
        )
    }

    /// Create a new session manager with custom timeout and cleanup interval
    pub fn with_config(
        max_sessions: usize,
        session_timeout: Duration,
        cleanup_interval: Duration,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_sessions,
            session_timeout,
            cleanup_interval,
        }
    }

    pub fn session_timeout(&self) -> Duration {
        self.session_timeout
    }

    /// Start a background task that periodically removes expired sessions.
    ///
    /// Send `true` on the returned channel to stop it.
    pub fn start_cleanup_task(self: &Arc<Self>) -> watch::Sender<bool> {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let manager = Arc::clone(self);
        let interval = manager.cleanup_interval;

        tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(interval);
            interval_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = interval_timer.tick() => {
                        let removed = manager.cleanup_expired();
                        if removed > 0 {
                            tracing::info!(
                                removed,
                                remaining = manager.count(),
                                "Session cleanup removed expired sessions"
                            );
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::info!("Session cleanup task shutting down");
                            break;
                        }
                    }
                }
            }
        });

        shutdown_tx
    }

    /// Create a new session
    pub fn create(&self, assistant: Arc<QuestionAssistant>) -> Result<Arc<Session>, ServerError> {
        let mut sessions = self.sessions.write();

        if sessions.len() >= self.max_sessions {
            self.cleanup_expired_internal(&mut sessions);

            if sessions.len() >= self.max_sessions {
                tracing::warn!(max_sessions = self.max_sessions, "Session capacity reached");
                return Err(ServerError::CapacityReached(self.max_sessions));
            }
        }

        let id = uuid::Uuid::new_v4().to_string();
        let session = Arc::new(Session::new(&id, assistant));
        sessions.insert(id.clone(), session.clone());

        tracing::info!(session_id = %id, active_sessions = sessions.len(), "Created session");
        Ok(session)
    }

    /// Get a live session by ID
    ///
    /// A session past its timeout is treated as gone even if the sweep has
    /// not reached it yet.
    pub fn get(&self, id: &str) -> Option<Arc<Session>> {
        let session = self.sessions.read().get(id).cloned()?;
        if session.is_expired(self.session_timeout) {
            self.remove(id);
            return None;
        }
        Some(session)
    }

    /// Remove a session; returns whether it existed
    pub fn remove(&self, id: &str) -> bool {
        let mut sessions = self.sessions.write();
        match sessions.remove(id) {
            Some(session) => {
                session.close();
                tracing::info!(session_id = %id, "Removed session");
                true
            },
            None => false,
        }
    }

    /// Get active session count
    pub fn count(&self) -> usize {
        self.sessions.read().len()
    }

    /// Remove expired sessions, returning how many were dropped
    pub fn cleanup_expired(&self) -> usize {
        let mut sessions = self.sessions.write();
        self.cleanup_expired_internal(&mut sessions)
    }

    fn cleanup_expired_internal(&self, sessions: &mut HashMap<String, Arc<Session>>) -> usize {
        let timeout = self.session_timeout;
        let expired: Vec<String> = sessions
            .iter()
            .filter(|(_, s)| s.is_expired(timeout))
            .map(|(id, _)| id.clone())
            .collect();

        for id in &expired {
            if let Some(session) = sessions.remove(id) {
                session.close();
                tracing::info!(session_id = %id, "Expired session");
            }
        }
        expired.len()
    }

    /// List all session IDs
    pub fn list(&self) -> Vec<String> {
        self.sessions.read().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use seva_core::{
        BackendFailure, KnowledgeBase, LanguageRouter, RawGeneration, RetrievalConfig,
        SpeechRequest, TextToSpeech,
    };
    use seva_pipeline::SpeechSynthesizer;
    use seva_rag::RetrievalGateway;

    struct StaticKb;

    #[async_trait]
    impl KnowledgeBase for StaticKb {
        async fn retrieve_and_generate(
            &self,
            _query: &str,
            _config: &RetrievalConfig,
        ) -> Result<RawGeneration, BackendFailure> {
            Ok(RawGeneration {
                text: "answer".into(),
                references: vec![],
                session_id: "s".into(),
            })
        }

        fn name(&self) -> &str {
            "static"
        }
    }

    struct SilentTts;

    #[async_trait]
    impl TextToSpeech for SilentTts {
        async fn synthesize(&self, _request: &SpeechRequest) -> Result<Vec<u8>, BackendFailure> {
            Ok(vec![1, 2, 3])
        }

        fn model_name(&self) -> &str {
            "silent"
        }
    }

    fn assistant() -> Arc<QuestionAssistant> {
        let config = RetrievalConfig {
            knowledge_base_id: "kb".into(),
            model_reference: "model".into(),
            max_tokens: 512,
            temperature: 0.7,
            top_p: 0.9,
        };
        Arc::new(QuestionAssistant::new(
            LanguageRouter::default(),
            RetrievalGateway::new(Arc::new(StaticKb), config),
            SpeechSynthesizer::new(Arc::new(SilentTts)),
        ))
    }

    #[test]
    fn test_session_creation() {
        let manager = SessionManager::new(10);
        let session = manager.create(assistant()).unwrap();

        assert!(session.is_active());
        assert!(!session.is_expired(Duration::from_secs(60)));
        assert_eq!(manager.count(), 1);
    }

    #[test]
    fn test_session_get() {
        let manager = SessionManager::new(10);
        let session = manager.create(assistant()).unwrap();
        let id = session.id.clone();

        let retrieved = manager.get(&id);
        assert!(retrieved.is_some());
        assert_eq!(retrieved.unwrap().id, id);
        assert!(manager.get("missing").is_none());
    }

    #[test]
    fn test_session_remove() {
        let manager = SessionManager::new(10);
        let session = manager.create(assistant()).unwrap();
        let id = session.id.clone();

        assert!(manager.remove(&id));
        assert!(!session.is_active());
        assert!(manager.get(&id).is_none());
        assert!(!manager.remove(&id));
    }

    #[test]
    fn test_capacity_limit() {
        let manager = SessionManager::new(2);
        manager.create(assistant()).unwrap();
        manager.create(assistant()).unwrap();

        let err = manager.create(assistant()).unwrap_err();
        assert!(matches!(err, ServerError::CapacityReached(2)));
    }

    #[test]
    fn test_expired_sessions_make_room() {
        let manager = SessionManager::with_config(1, Duration::ZERO, Duration::from_secs(1));
        manager.create(assistant()).unwrap();
        std::thread::sleep(Duration::from_millis(5));

        // The stale session is swept to admit the new one
        let fresh = manager.create(assistant()).unwrap();
        assert_eq!(manager.list(), vec![fresh.id.clone()]);
    }

    #[test]
    fn test_cleanup_expired() {
        let manager = SessionManager::with_config(10, Duration::ZERO, Duration::from_secs(1));
        let session = manager.create(assistant()).unwrap();
        std::thread::sleep(Duration::from_millis(5));

        assert_eq!(manager.cleanup_expired(), 1);
        assert_eq!(manager.count(), 0);
        assert!(!session.is_active());
    }

    #[tokio::test]
    async fn test_sessions_keep_separate_history() {
        let manager = SessionManager::new(10);
        let a = manager.create(assistant()).unwrap();
        let b = manager.create(assistant()).unwrap();

        a.lock().await.submit_question("first", "English").await.unwrap();
        assert_eq!(a.lock().await.history().len(), 2);
        assert!(b.lock().await.history().is_empty());
    }

    #[tokio::test]
    async fn test_cleanup_task_stops_on_signal() {
        let manager = Arc::new(SessionManager::with_config(
            10,
            Duration::from_secs(60),
            Duration::from_millis(10),
        ));
        let shutdown = manager.start_cleanup_task();
        manager.create(assistant()).unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(manager.count(), 1);
        assert!(shutdown.send(true).is_ok());
    }
}
