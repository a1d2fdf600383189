use thiserror::Error;

/// Errors from repository operations (used by trait definitions in kindred-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors related to persona resolution and custom persona management.
#[derive(Debug, Error)]
pub enum PersonaError {
    #[error("persona not found")]
    NotFound,

    #[error("an active persona named '{0}' already exists")]
    NameConflict(String),

    #[error("maximum number of active personas reached ({0})")]
    LimitReached(usize),

    #[error("persona is already active")]
    AlreadyActive,

    #[error("invalid persona definition: {0}")]
    InvalidDefinition(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<RepositoryError> for PersonaError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => PersonaError::NotFound,
            other => PersonaError::Storage(other.to_string()),
        }
    }
}

/// Errors surfaced by the chat orchestrator.
///
/// Degraded dependencies (embedding, retrieval) and generation failures are
/// handled inside the engine and never appear here; what remains is the
/// caller-visible taxonomy: unknown identities, unknown personas, and
/// store-level integrity failures.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("user {0} not found")]
    UserNotFound(i64),

    #[error(transparent)]
    Persona(#[from] PersonaError),

    #[error("storage error: {0}")]
    Storage(#[from] RepositoryError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }

    #[test]
    fn test_persona_error_display() {
        let err = PersonaError::NameConflict("Buddy".to_string());
        assert!(err.to_string().contains("Buddy"));

        let err = PersonaError::LimitReached(10);
        assert!(err.to_string().contains("10"));
    }

    #[test]
    fn test_persona_error_from_repository_not_found() {
        let err: PersonaError = RepositoryError::NotFound.into();
        assert!(matches!(err, PersonaError::NotFound));
    }

    #[test]
    fn test_chat_error_wraps_persona_error() {
        let err: ChatError = PersonaError::NotFound.into();
        assert_eq!(err.to_string(), "persona not found");
    }
}
