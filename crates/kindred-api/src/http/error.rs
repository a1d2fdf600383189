//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use kindred_types::error::{ChatError, PersonaError, RepositoryError};

use crate::http::response::{ApiErrorDetail, ApiMeta, ApiResponse};

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Chat orchestrator errors.
    Chat(ChatError),
    /// Persona resolution/management errors.
    Persona(PersonaError),
    /// Authentication failure.
    Unauthorized(String),
    /// Validation error.
    Validation(String),
    /// Generic internal error.
    Internal(String),
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        AppError::Chat(e)
    }
}

impl From<PersonaError> for AppError {
    fn from(e: PersonaError) -> Self {
        AppError::Persona(e)
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Chat(ChatError::UserNotFound(id)) => (
                StatusCode::NOT_FOUND,
                "USER_NOT_FOUND",
                format!("User {id} not found"),
            ),
            AppError::Chat(ChatError::Persona(e)) | AppError::Persona(e) => persona_parts(e),
            // Store-level integrity failures surface as server errors, never
            // retried.
            AppError::Chat(ChatError::Storage(RepositoryError::Conflict(msg))) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTEGRITY_ERROR",
                msg.clone(),
            ),
            AppError::Chat(ChatError::Storage(e)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORAGE_ERROR",
                e.to_string(),
            ),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg.clone(),
            ),
        }
    }
}

fn persona_parts(e: &PersonaError) -> (StatusCode, &'static str, String) {
    match e {
        PersonaError::NotFound => (
            StatusCode::NOT_FOUND,
            "PERSONA_NOT_FOUND",
            "Persona not found".to_string(),
        ),
        PersonaError::NameConflict(name) => (
            StatusCode::CONFLICT,
            "PERSONA_NAME_CONFLICT",
            format!("An active persona named '{name}' already exists"),
        ),
        PersonaError::LimitReached(limit) => (
            StatusCode::BAD_REQUEST,
            "PERSONA_LIMIT_REACHED",
            format!("Maximum number of active personas reached ({limit})"),
        ),
        PersonaError::AlreadyActive => (
            StatusCode::BAD_REQUEST,
            "PERSONA_ALREADY_ACTIVE",
            "Persona is already active".to_string(),
        ),
        PersonaError::InvalidDefinition(msg) => {
            (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
        }
        PersonaError::Storage(msg) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "STORAGE_ERROR",
            msg.clone(),
        ),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let envelope = ApiResponse::<()> {
            data: None,
            meta: ApiMeta {
                request_id: String::new(),
                timestamp: chrono::Utc::now().to_rfc3339(),
                response_time_ms: 0,
            },
            errors: vec![ApiErrorDetail {
                code: code.to_string(),
                message,
            }],
        };

        let body = serde_json::to_string(&envelope).unwrap_or_else(|_| {
            r#"{"errors":[{"code":"SERIALIZATION_ERROR","message":"Failed to serialize response"}]}"#.to_string()
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response()
    }
}
