//! User profile handlers.

use std::time::Instant;

use axum::extract::{Path, State};

use kindred_types::identity::User;

use crate::http::error::AppError;
use crate::http::extractors::auth::CurrentUser;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// GET /api/v1/users/me - The authenticated user's profile.
pub async fn get_me(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<ApiResponse<User>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let user = state.engine.get_user(user_id).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(ApiResponse::success(user, request_id, elapsed))
}

/// GET /api/v1/users/{id} - A user's public profile.
pub async fn get_user(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
    Path(id): Path<i64>,
) -> Result<ApiResponse<User>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let user = state.engine.get_user(id).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(ApiResponse::success(user, request_id, elapsed))
}
