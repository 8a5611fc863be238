//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{
    ChatRequest, ChatResponse, ErrorResponse, SuccessResponse, VersionResponse, WidgetResponse,
};
use super::AppState;
use crate::runtime::{ChatSnapshot, SessionError};
use crate::state_machine::{Event, TransitionError};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Session lifecycle (widget mount and unmount)
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session).delete(discard_session))
        // Visitor actions
        .route("/api/sessions/:id/messages", post(send_message))
        .route("/api/sessions/:id/widget", post(toggle_widget))
        // SSE streaming
        .route("/api/sessions/:id/stream", get(stream_session))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Session Lifecycle
// ============================================================

async fn create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ChatSnapshot>), AppError> {
    let handle = state.sessions.create().await;
    let snapshot = handle.snapshot().await?;
    tracing::info!(session_id = %snapshot.session_id, "Session created");
    Ok((StatusCode::CREATED, Json(snapshot)))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ChatSnapshot>, AppError> {
    Ok(Json(state.sessions.snapshot(&id).await?))
}

async fn discard_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    if !state.sessions.discard(&id).await {
        return Err(AppError::NotFound(format!("Session not found: {id}")));
    }
    tracing::info!(session_id = %id, "Session discarded");
    Ok(Json(SuccessResponse { success: true }))
}

// ============================================================
// Visitor Actions
// ============================================================

/// Accept a visitor message; the reply arrives over the stream
async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ChatRequest>,
) -> Result<(StatusCode, Json<ChatResponse>), AppError> {
    state.sessions.dispatch(&id, Event::submit(req.text)).await?;
    Ok((StatusCode::ACCEPTED, Json(ChatResponse { queued: true })))
}

async fn toggle_widget(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<WidgetResponse>, AppError> {
    let snapshot = state.sessions.dispatch(&id, Event::ToggleWidget).await?;
    Ok(Json(WidgetResponse {
        widget_open: snapshot.widget_open,
    }))
}

// ============================================================
// SSE Streaming
// ============================================================

async fn stream_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let (snapshot, rx) = state.sessions.subscribe(&id).await?;
    Ok(sse_stream(snapshot, rx))
}

// ============================================================
// Version
// ============================================================

async fn get_version(State(state): State<AppState>) -> Json<VersionResponse> {
    Json(VersionResponse {
        version: env!("CARGO_PKG_VERSION"),
        model: state.model_id,
    })
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    NotFound(String),
    Conflict(String),
    Unprocessable(String),
    Internal(String),
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound(_) => AppError::NotFound(err.to_string()),
            SessionError::Closed => AppError::Internal(err.to_string()),
            SessionError::Rejected(TransitionError::EmptyMessage) => {
                AppError::Unprocessable(err.to_string())
            }
            SessionError::Rejected(
                TransitionError::AssistantBusy | TransitionError::NoRequestInFlight,
            ) => AppError::Conflict(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
