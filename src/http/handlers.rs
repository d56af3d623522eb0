use super::state::AppState;
use crate::context::PromptSource;
use crate::conversation::Message;
use crate::notify::Notice;
use crate::session::{Feedback, Overlay, Snapshot};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::error;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct PointerRequest {
    /// Horizontal pointer position in pixels, if the client has one
    pub x: Option<f32>,
}

#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub x: f32,
}

#[derive(Debug, Deserialize)]
pub struct SendTextRequest {
    pub text: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ContextPrompt {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub snapshot: Snapshot,
    pub elapsed_ms: u64,
    pub feedback: Feedback,
    pub overlay: Option<Overlay>,
}

impl From<Snapshot> for StatusResponse {
    fn from(snapshot: Snapshot) -> Self {
        Self {
            elapsed_ms: snapshot.elapsed().as_millis() as u64,
            feedback: Feedback::steady(&snapshot),
            overlay: Overlay::for_snapshot(&snapshot),
            snapshot,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn internal_error(context: &str, e: anyhow::Error) -> Response {
    error!("{}: {:#}", context, e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: format!("{}: {}", context, e),
        }),
    )
        .into_response()
}

/// Commands are queued; the response carries the snapshot at enqueue time
fn accepted(state: &AppState) -> Response {
    (StatusCode::ACCEPTED, Json(StatusResponse::from(state.ptt.snapshot()))).into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /ptt/focus
/// Re-check microphone permission and reload the context prompt
pub async fn focus(State(state): State<AppState>) -> Response {
    match state.ptt.focus().await {
        Ok(()) => accepted(&state),
        Err(e) => internal_error("Failed to focus", e),
    }
}

/// POST /ptt/press
pub async fn press(State(state): State<AppState>, Json(req): Json<PointerRequest>) -> Response {
    match state.ptt.press(req.x).await {
        Ok(()) => accepted(&state),
        Err(e) => internal_error("Failed to press", e),
    }
}

/// POST /ptt/move
pub async fn pointer_move(State(state): State<AppState>, Json(req): Json<MoveRequest>) -> Response {
    match state.ptt.move_to(req.x).await {
        Ok(()) => accepted(&state),
        Err(e) => internal_error("Failed to move", e),
    }
}

/// POST /ptt/release
pub async fn release(State(state): State<AppState>) -> Response {
    match state.ptt.release().await {
        Ok(()) => accepted(&state),
        Err(e) => internal_error("Failed to release", e),
    }
}

/// POST /ptt/discard
/// Drop any live recording without processing
pub async fn discard(State(state): State<AppState>) -> Response {
    match state.ptt.discard().await {
        Ok(()) => accepted(&state),
        Err(e) => internal_error("Failed to discard", e),
    }
}

/// GET /ptt/status
pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    Json(StatusResponse::from(state.ptt.snapshot()))
}

/// POST /chat/send
/// Send typed text and wait for the exchange to finish
pub async fn send_text(State(state): State<AppState>, Json(req): Json<SendTextRequest>) -> Response {
    if let Err(e) = state.ptt.send_text(req.text).await {
        return internal_error("Failed to send text", e);
    }

    match state.ptt.flush().await {
        Ok(_) => {
            let messages: Vec<Message> = state.conversation.messages().await;
            (StatusCode::OK, Json(messages)).into_response()
        }
        Err(e) => internal_error("Failed to send text", e),
    }
}

/// GET /conversation
pub async fn conversation(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.conversation.messages().await)
}

/// GET /notices
pub async fn notices(State(state): State<AppState>) -> impl IntoResponse {
    let notices: Vec<Notice> = state.notices.recent();
    Json(notices)
}

/// GET /context
pub async fn get_context(State(state): State<AppState>) -> Response {
    match state.prompts.load().await {
        Ok(prompt) => (StatusCode::OK, Json(ContextPrompt { prompt })).into_response(),
        Err(e) => internal_error("Failed to load context prompt", e),
    }
}

/// PUT /context
/// Store the prompt and have the controller pick it up
pub async fn put_context(State(state): State<AppState>, Json(req): Json<ContextPrompt>) -> Response {
    if let Err(e) = state.prompts.save(&req.prompt).await {
        return internal_error("Failed to save context prompt", e);
    }

    if let Err(e) = state.ptt.focus().await {
        return internal_error("Failed to reload context prompt", e);
    }

    StatusCode::NO_CONTENT.into_response()
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
