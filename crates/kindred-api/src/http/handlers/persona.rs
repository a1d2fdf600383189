//! Custom persona CRUD handlers.

use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use kindred_core::persona::registry;
use kindred_types::persona::{CreatePersonaRequest, CustomPersona, Persona, UpdatePersonaRequest};

use crate::http::error::AppError;
use crate::http::extractors::auth::CurrentUser;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Query parameters for listing personas.
#[derive(Debug, Deserialize)]
pub struct PersonaListQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

/// Response body for the persona list endpoint.
#[derive(Debug, Serialize)]
pub struct PersonaListResponse {
    /// Built-in personas available to everyone.
    pub builtin: Vec<Persona>,
    /// The caller's custom personas.
    pub custom: Vec<CustomPersona>,
    pub total: usize,
}

/// POST /api/v1/personas - Create a custom persona.
pub async fn create_persona(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(body): Json<CreatePersonaRequest>,
) -> Result<ApiResponse<CustomPersona>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let persona = state.persona_service.create(user_id, body).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(ApiResponse::success(persona, request_id, elapsed))
}

/// GET /api/v1/personas - List built-in and custom personas.
pub async fn list_personas(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Query(query): Query<PersonaListQuery>,
) -> Result<ApiResponse<PersonaListResponse>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let custom = state
        .persona_service
        .list(user_id, query.include_inactive)
        .await?;
    let builtin = registry::all();
    let total = builtin.len() + custom.len();

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(ApiResponse::success(
        PersonaListResponse {
            builtin,
            custom,
            total,
        },
        request_id,
        elapsed,
    ))
}

/// GET /api/v1/personas/{id} - Get one custom persona.
pub async fn get_persona(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<i64>,
) -> Result<ApiResponse<CustomPersona>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let persona = state.persona_service.get(id, user_id).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(ApiResponse::success(persona, request_id, elapsed))
}

/// PUT /api/v1/personas/{id} - Update a custom persona.
pub async fn update_persona(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<i64>,
    Json(body): Json<UpdatePersonaRequest>,
) -> Result<ApiResponse<CustomPersona>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let persona = state.persona_service.update(id, user_id, body).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(ApiResponse::success(persona, request_id, elapsed))
}

/// DELETE /api/v1/personas/{id} - Soft-delete a custom persona.
pub async fn delete_persona(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<i64>,
) -> Result<ApiResponse<CustomPersona>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let persona = state.persona_service.deactivate(id, user_id).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(ApiResponse::success(persona, request_id, elapsed))
}

/// POST /api/v1/personas/{id}/activate - Reactivate a soft-deleted persona.
pub async fn activate_persona(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<i64>,
) -> Result<ApiResponse<CustomPersona>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let persona = state.persona_service.reactivate(id, user_id).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(ApiResponse::success(persona, request_id, elapsed))
}
