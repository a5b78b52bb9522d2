//! Application State
//!
//! Shared state across all handlers. Settings are loaded once in `main` and
//! never change while the server runs.

use std::sync::Arc;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusHandle;
use seva_agent::QuestionAssistant;
use seva_config::Settings;

use crate::session::SessionManager;

/// How often expired sessions are swept
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    /// Question pipeline shared by every session
    pub assistant: Arc<QuestionAssistant>,
    pub sessions: Arc<SessionManager>,
    /// Prometheus handle; `None` when metrics are disabled
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(settings: Settings, assistant: QuestionAssistant) -> Self {
        let timeout = Duration::from_secs(settings.server.session_timeout_minutes * 60);
        let sessions = SessionManager::with_config(
            settings.server.max_sessions,
            timeout,
            CLEANUP_INTERVAL.min(timeout),
        );
        Self {
            settings: Arc::new(settings),
            assistant: Arc::new(assistant),
            sessions: Arc::new(sessions),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: Option<PrometheusHandle>) -> Self {
        self.metrics = handle;
        self
    }
}
