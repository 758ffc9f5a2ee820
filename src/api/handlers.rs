//! HTTP request handlers

use super::assets::{get_index_html, serve_static};
use super::sse::sse_stream;
use super::types::{
    ConversationResponse, ErrorResponse, GameFrameQuery, QueuedResponse, ResolveGameRequest,
    ResolveGameResponse, SendMessageRequest, SuccessResponse,
};
use super::AppState;
use crate::game::{GameDescriptor, GameEmbed, SANDBOX_CSP};
use crate::runtime::ChatError;
use crate::state_machine::TransitionError;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Page shell and its assets
        .route("/", get(serve_index))
        .route("/assets/*path", get(serve_static))
        // Conversation
        .route("/api/conversation", get(get_conversation))
        .route("/api/stream", get(stream_conversation))
        .route("/api/messages", post(send_message))
        .route("/api/conversation/clear", post(clear_conversation))
        .route("/api/conversation/reload", post(reload_conversation))
        // Games
        .route("/api/games/resolve", post(resolve_game))
        .route("/api/messages/:id/game", get(game_frame))
        .route("/api/messages/:id/game/document", get(game_document))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

async fn serve_index() -> impl IntoResponse {
    match get_index_html() {
        Some(content) => Html(content).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Html("<h1>404 - UI not found</h1>".to_string()),
        )
            .into_response(),
    }
}

// ============================================================
// Conversation
// ============================================================

async fn get_conversation(State(state): State<AppState>) -> Json<ConversationResponse> {
    Json(state.chat.view().into())
}

async fn stream_conversation(State(state): State<AppState>) -> impl IntoResponse {
    // Subscribe before reading the snapshot so no change falls in between
    let broadcast_rx = state.chat.subscribe();
    sse_stream(state.chat.view(), broadcast_rx)
}

async fn send_message(
    State(state): State<AppState>,
    Json(req): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<QueuedResponse>), AppError> {
    state.chat.send_message(&req.text).await?;
    Ok((StatusCode::ACCEPTED, Json(QueuedResponse { queued: true })))
}

async fn clear_conversation(
    State(state): State<AppState>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.chat.clear_conversation().await?;
    Ok(Json(SuccessResponse { success: true }))
}

async fn reload_conversation(
    State(state): State<AppState>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.chat.reload().await?;
    Ok(Json(SuccessResponse { success: true }))
}

// ============================================================
// Games
// ============================================================

async fn resolve_game(
    State(state): State<AppState>,
    Json(req): Json<ResolveGameRequest>,
) -> Json<ResolveGameResponse> {
    Json(state.resolver.resolve(req.payload.as_deref()).into())
}

/// Resolve the game attached to the message with timestamp `id` in the current view
fn game_for(state: &AppState, id: i64) -> Result<GameDescriptor, AppError> {
    let view = state.chat.view();
    let message = view
        .messages
        .iter()
        .find(|m| m.timestamp == id && m.has_game())
        .ok_or_else(|| AppError::NotFound(format!("No game attached to message {id}")))?;

    Ok(state.resolver.resolve(message.game_payload.as_deref()))
}

async fn game_frame(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<GameFrameQuery>,
) -> Result<Html<String>, AppError> {
    let game = game_for(&state, id)?;
    Ok(Html(GameEmbed::new(game).expanded(query.expanded).render()))
}

/// The bare document, confined by a sandbox policy when opened directly
async fn game_document(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let game = game_for(&state, id)?;
    Ok((
        [(header::CONTENT_SECURITY_POLICY, SANDBOX_CSP)],
        Html(game.document),
    )
        .into_response())
}

async fn get_version() -> &'static str {
    concat!("gamechat ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Unavailable(String),
}

impl From<ChatError> for AppError {
    fn from(error: ChatError) -> Self {
        let message = error.to_string();
        match error {
            ChatError::Rejected(TransitionError::EmptyMessage) => AppError::BadRequest(message),
            ChatError::Rejected(
                TransitionError::SendInProgress | TransitionError::InvalidTransition(_),
            ) => AppError::Conflict(message),
            ChatError::Stopped => AppError::Unavailable(message),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
