//! Companion chat endpoints: send a message, read history, clear a session.

use std::time::Instant;

use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use kindred_core::chat::engine::ClearedSession;
use kindred_types::message::HistoryEntry;
use kindred_types::persona::PersonaRef;

use crate::http::error::AppError;
use crate::http::extractors::auth::CurrentUser;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Default history page size when the query does not specify one.
const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Request body for POST /api/v1/ai/chat.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Built-in persona name. Ignored when `persona_id` is set.
    pub persona: Option<String>,
    /// Custom persona id owned by the caller.
    pub persona_id: Option<i64>,
    /// The message to send.
    pub message: String,
    /// Explicit session id override; derived from the persona when absent.
    pub session_id: Option<String>,
}

/// Response body for POST /api/v1/ai/chat.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub persona: String,
    pub session_id: String,
    pub user_message: String,
    pub ai_response: String,
    pub timestamp: DateTime<Utc>,
}

/// Query parameters for the history endpoints.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub persona: Option<String>,
    pub persona_id: Option<i64>,
    pub session_id: Option<String>,
    pub limit: Option<usize>,
}

/// Response body for GET /api/v1/ai/history.
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub persona: String,
    pub session_id: String,
    pub history: Vec<HistoryEntry>,
}

fn persona_ref(persona: &Option<String>, persona_id: Option<i64>) -> PersonaRef {
    match persona_id {
        Some(id) => PersonaRef::Custom(id),
        // The original companion defaults to Alice when nothing is named.
        None => PersonaRef::BuiltIn(persona.clone().unwrap_or_else(|| "Alice".to_string())),
    }
}

/// POST /api/v1/ai/chat - Send a message to a persona and return the reply.
pub async fn send_message(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(body): Json<ChatRequest>,
) -> Result<ApiResponse<ChatResponse>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    if body.message.trim().is_empty() {
        return Err(AppError::Validation("message must not be empty".to_string()));
    }

    let user = state.engine.get_user(user_id).await?;
    let persona_ref = persona_ref(&body.persona, body.persona_id);
    let persona = state
        .persona_service
        .resolve(&persona_ref, user.id, &user.username)
        .await?;
    let session_id = body
        .session_id
        .unwrap_or_else(|| persona_ref.session_id(user.id));

    let exchange = state
        .engine
        .send_message(&user, &persona, &session_id, &body.message)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(ApiResponse::success(
        ChatResponse {
            persona: persona.name,
            session_id,
            user_message: exchange.user_message,
            ai_response: exchange.ai_response,
            timestamp: exchange.timestamp,
        },
        request_id,
        elapsed,
    ))
}

/// GET /api/v1/ai/history - The most recent turns of a session, oldest first.
pub async fn get_history(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Query(query): Query<HistoryQuery>,
) -> Result<ApiResponse<HistoryResponse>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let user = state.engine.get_user(user_id).await?;
    let persona_ref = persona_ref(&query.persona, query.persona_id);
    let persona = state
        .persona_service
        .resolve(&persona_ref, user.id, &user.username)
        .await?;
    let session_id = query
        .session_id
        .unwrap_or_else(|| persona_ref.session_id(user.id));
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);

    let history = state
        .engine
        .history(&user, &persona.name, &session_id, limit)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(ApiResponse::success(
        HistoryResponse {
            persona: persona.name,
            session_id,
            history,
        },
        request_id,
        elapsed,
    ))
}

/// DELETE /api/v1/ai/history - Clear a session's messages and embeddings.
pub async fn clear_history(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Query(query): Query<HistoryQuery>,
) -> Result<ApiResponse<ClearedSession>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let user = state.engine.get_user(user_id).await?;
    let persona_ref = persona_ref(&query.persona, query.persona_id);
    let session_id = query
        .session_id
        .unwrap_or_else(|| persona_ref.session_id(user.id));

    let cleared = state.engine.clear_session(&user, &session_id).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(ApiResponse::success(cleared, request_id, elapsed))
}
