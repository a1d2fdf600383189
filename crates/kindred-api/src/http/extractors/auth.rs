//! Bearer token authentication extractor.
//!
//! The authentication boundary is external to the chat core: this extractor
//! is the whole of it. Tokens arrive via `Authorization: Bearer <token>` or
//! `X-API-Key: <token>`, are SHA-256 hashed, and resolved against the
//! `auth_tokens` table to a verified user id. Token issuance happens in the
//! CLI (`kindred create-user`).

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use sha2::{Digest, Sha256};
use sqlx::Row;

use crate::http::error::AppError;
use crate::state::AppState;

/// The verified identity of the calling user. Extracting this validates the
/// bearer token.
pub struct CurrentUser(pub i64);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(parts)?;
        let token_hash = hash_token(&token);

        let result = sqlx::query("SELECT user_id FROM auth_tokens WHERE token_hash = ?")
            .bind(&token_hash)
            .fetch_optional(&state.db_pool.reader)
            .await
            .map_err(|e| AppError::Internal(format!("Database error: {e}")))?;

        match result {
            Some(row) => {
                let user_id: i64 = row
                    .try_get("user_id")
                    .map_err(|e| AppError::Internal(format!("Database error: {e}")))?;

                // Update last_used_at (best effort, don't fail the request)
                let now = chrono::Utc::now().to_rfc3339();
                let _ = sqlx::query("UPDATE auth_tokens SET last_used_at = ? WHERE token_hash = ?")
                    .bind(&now)
                    .bind(&token_hash)
                    .execute(&state.db_pool.writer)
                    .await;

                Ok(CurrentUser(user_id))
            }
            None => Err(AppError::Unauthorized(
                "Invalid token. Provide a valid token via 'Authorization: Bearer <token>' or 'X-API-Key: <token>' header.".to_string(),
            )),
        }
    }
}

/// Extract the bearer token from request headers.
fn extract_token(parts: &Parts) -> Result<String, AppError> {
    // Try Authorization: Bearer <token>
    if let Some(auth) = parts.headers.get("authorization") {
        let auth_str = auth.to_str().map_err(|_| {
            AppError::Unauthorized("Invalid Authorization header encoding".to_string())
        })?;
        if let Some(token) = auth_str.strip_prefix("Bearer ") {
            return Ok(token.trim().to_string());
        }
    }

    // Try X-API-Key header
    if let Some(token) = parts.headers.get("x-api-key") {
        let token_str = token.to_str().map_err(|_| {
            AppError::Unauthorized("Invalid X-API-Key header encoding".to_string())
        })?;
        return Ok(token_str.trim().to_string());
    }

    Err(AppError::Unauthorized(
        "Missing token. Provide via 'Authorization: Bearer <token>' or 'X-API-Key: <token>' header.".to_string(),
    ))
}

/// Compute the SHA-256 hash of a token (lowercase hex).
pub fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    format!("{:x}", digest)
}

/// Issue a new token for a user and store its hash.
///
/// Returns the plaintext token; it is shown once and never stored.
pub async fn issue_token(
    pool: &kindred_infra::sqlite::pool::DatabasePool,
    user_id: i64,
) -> anyhow::Result<String> {
    let token = format!("kndr_{}", uuid::Uuid::new_v4().simple());
    let token_hash = hash_token(&token);
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query("INSERT INTO auth_tokens (token_hash, user_id, created_at) VALUES (?, ?, ?)")
        .bind(&token_hash)
        .bind(user_id)
        .bind(&now)
        .execute(&pool.writer)
        .await?;

    Ok(token)
}
