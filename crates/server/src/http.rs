//! HTTP Endpoints
//!
//! REST API for the question assistant.
//!
//! | route | operation |
//! |-------|-----------|
//! | `POST /api/sessions` | open a session |
//! | `GET/DELETE /api/sessions/:id` | inspect / close a session |
//! | `POST /api/sessions/:id/questions` | submit a question |
//! | `GET/DELETE /api/sessions/:id/history` | read / clear history |
//! | `POST/DELETE /api/sessions/:id/voice/listening` | voice capture started / abandoned |
//! | `POST /api/sessions/:id/voice/playback-finished` | answer audio done |
//! | `GET /api/languages` | selectable answer languages |

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Json, Path, State},
    http::{HeaderValue, Method, StatusCode},
    routing::{get, post},
    Router,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use seva_core::{Citation, Turn, VoiceActivityState};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::metrics::{metrics_handler, track_requests};
use crate::session::Session;
use crate::state::AppState;
use crate::ServerError;

const DEFAULT_LANGUAGE: &str = "English";
const FALLBACK_ORIGIN: &str = "http://localhost:3000";

/// Create the application router
///
/// Every route except question submission is bounded by
/// `request_timeout_seconds`; a question waits on the backends for as long as
/// the transport allows.
pub fn create_router(state: AppState) -> Router {
    let server = &state.settings.server;
    let cors_layer = build_cors_layer(&server.cors_origins, server.cors_enabled);
    let timeout = Duration::from_secs(server.request_timeout_seconds);

    let bounded = Router::new()
        // Sessions
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session).delete(delete_session))
        .route(
            "/api/sessions/:id/history",
            get(get_history).delete(clear_history),
        )
        // Voice indicator
        .route(
            "/api/sessions/:id/voice/listening",
            post(begin_listening).delete(stop_listening),
        )
        .route(
            "/api/sessions/:id/voice/playback-finished",
            post(playback_finished),
        )
        .route("/api/languages", get(list_languages))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .layer(TimeoutLayer::new(timeout));

    Router::new()
        .route("/api/sessions/:id/questions", post(submit_question))
        .merge(bounded)
        .layer(axum::middleware::from_fn(track_requests))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}

/// Build CORS layer from configured origins
///
/// - disabled: permissive (development only)
/// - no valid origins: localhost:3000
/// - otherwise the configured origins
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::DELETE, Method::OPTIONS];

    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins (NOT FOR PRODUCTION)");
        return CorsLayer::permissive();
    }

    let parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("Invalid CORS origin: {}", origin);
                None
            })
        })
        .collect();

    if parsed_origins.is_empty() {
        tracing::info!("No valid CORS origins configured, defaulting to {}", FALLBACK_ORIGIN);
        return CorsLayer::new()
            .allow_origin(HeaderValue::from_static(FALLBACK_ORIGIN))
            .allow_methods(methods)
            .allow_headers(Any);
    }

    tracing::info!("CORS configured with {} origins", parsed_origins.len());
    CorsLayer::new()
        .allow_origin(parsed_origins)
        .allow_methods(methods)
        .allow_headers(Any)
}

fn find_session(state: &AppState, id: &str) -> Result<Arc<Session>, ServerError> {
    state
        .sessions
        .get(id)
        .ok_or_else(|| ServerError::NotFound(id.to_string()))
}

/// Base64 audio as sent to the browser
#[derive(Debug, Serialize)]
pub struct AudioDto {
    pub data: String,
    pub mime_type: String,
    pub bytes: usize,
}

#[derive(Debug, Serialize)]
pub struct TurnDto {
    pub role: &'static str,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioDto>,
    pub citations: Vec<Citation>,
    pub timestamp: DateTime<Utc>,
}

impl From<&Turn> for TurnDto {
    fn from(turn: &Turn) -> Self {
        Self {
            role: turn.role.as_str(),
            text: turn.text.clone(),
            audio: turn.audio.as_ref().map(|clip| AudioDto {
                data: BASE64.encode(&clip.bytes),
                mime_type: clip.mime_type.clone(),
                bytes: clip.len(),
            }),
            citations: turn.citations.clone(),
            timestamp: turn.timestamp,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VoiceStateDto {
    pub state: &'static str,
    pub label: &'static str,
}

impl From<VoiceActivityState> for VoiceStateDto {
    fn from(state: VoiceActivityState) -> Self {
        Self {
            state: state.as_str(),
            label: state.status_label(),
        }
    }
}

#[derive(Debug, Serialize)]
struct SessionInfo {
    session_id: String,
    active: bool,
    created_at: DateTime<Utc>,
    turn_count: usize,
    voice: VoiceStateDto,
}

async fn session_info(session: &Session) -> SessionInfo {
    let conversation = session.lock().await;
    SessionInfo {
        session_id: session.id.clone(),
        active: session.is_active(),
        created_at: session.created_at,
        turn_count: conversation.history().len(),
        voice: conversation.voice_state().into(),
    }
}

/// Open a session
async fn create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SessionInfo>), ServerError> {
    let session = state.sessions.create(state.assistant.clone())?;
    Ok((StatusCode::CREATED, Json(session_info(&session).await)))
}

/// Get session info
async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionInfo>, ServerError> {
    let session = find_session(&state, &id)?;
    Ok(Json(session_info(&session).await))
}

/// Delete session
async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServerError> {
    if state.sessions.remove(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ServerError::NotFound(id))
    }
}

/// Question request
#[derive(Debug, Deserialize)]
struct QuestionRequest {
    text: String,
    /// Display language as picked in the UI, e.g. `Hindi (हिंदी)`
    #[serde(default)]
    language: Option<String>,
}

#[derive(Debug, Serialize)]
struct QuestionResponse {
    turn: TurnDto,
    voice: VoiceStateDto,
}

/// Submit a question and return the assistant turn
async fn submit_question(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<QuestionRequest>,
) -> Result<Json<QuestionResponse>, ServerError> {
    let session = find_session(&state, &id)?;
    let language = request.language.as_deref().unwrap_or(DEFAULT_LANGUAGE);

    let mut conversation = session.lock().await;
    let turn = conversation
        .submit_question(&request.text, language)
        .await
        .map_err(|e| {
            tracing::warn!(session_id = %id, error = %e, "Question failed");
            ServerError::from(e)
        })?;
    session.touch();

    Ok(Json(QuestionResponse {
        turn: TurnDto::from(&turn),
        voice: conversation.voice_state().into(),
    }))
}

#[derive(Debug, Serialize)]
struct HistoryResponse {
    session_id: String,
    count: usize,
    turns: Vec<TurnDto>,
}

/// All turns, oldest first
async fn get_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<HistoryResponse>, ServerError> {
    let session = find_session(&state, &id)?;
    let conversation = session.lock().await;
    let turns: Vec<TurnDto> = conversation.history().iter().map(TurnDto::from).collect();

    Ok(Json(HistoryResponse {
        session_id: id,
        count: turns.len(),
        turns,
    }))
}

async fn clear_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServerError> {
    let session = find_session(&state, &id)?;
    session.lock().await.clear_history();
    Ok(StatusCode::NO_CONTENT)
}

async fn begin_listening(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<VoiceStateDto>, ServerError> {
    let session = find_session(&state, &id)?;
    let voice = session.lock().await.begin_listening()?;
    Ok(Json(voice.into()))
}

async fn stop_listening(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<VoiceStateDto>, ServerError> {
    let session = find_session(&state, &id)?;
    let voice = session.lock().await.stop_listening()?;
    Ok(Json(voice.into()))
}

async fn playback_finished(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<VoiceStateDto>, ServerError> {
    let session = find_session(&state, &id)?;
    let voice = session.lock().await.playback_finished()?;
    Ok(Json(voice.into()))
}

#[derive(Debug, Serialize)]
struct LanguageDto {
    code: &'static str,
    name: &'static str,
    native_name: &'static str,
    display_name: &'static str,
    locale_code: &'static str,
    voice_id: &'static str,
}

/// Languages enabled for this deployment, English first
async fn list_languages(State(state): State<AppState>) -> Json<serde_json::Value> {
    let languages: Vec<LanguageDto> = state
        .assistant
        .router()
        .profiles()
        .map(|profile| LanguageDto {
            code: profile.language.code(),
            name: profile.language.name(),
            native_name: profile.language.native_name(),
            display_name: profile.display_name,
            locale_code: profile.locale_code,
            voice_id: profile.voice_id,
        })
        .collect();

    Json(serde_json::json!({
        "default": DEFAULT_LANGUAGE,
        "languages": languages,
    }))
}

/// Liveness and basic deployment info. Backends are not probed here; use
/// `seva-diagnose` for that.
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let settings = &state.settings;
    Json(serde_json::json!({
        "status": "ok",
        "title": settings.app.title,
        "version": env!("CARGO_PKG_VERSION"),
        "environment": settings.environment,
        "knowledge_base_id": settings.knowledge_base.knowledge_base_id,
        "retrieval_backend": state.assistant.gateway().backend_name(),
        "active_sessions": state.sessions.count(),
    }))
}
