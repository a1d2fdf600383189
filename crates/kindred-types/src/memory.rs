//! Semantic memory types for Kindred.
//!
//! Every companion message is embedded and stored in the vector index so
//! later turns in the same session can recall semantically related history.
//! Records are keyed by the message id and carry enough metadata to scope
//! retrieval strictly to one session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::message::TurnRole;

/// An embedding record stored in the vector index.
///
/// Created once per message and never mutated; deleted only when the owning
/// session is cleared. The `message_id` must reference an existing message
/// row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub message_id: i64,
    /// The embedded text (the message content verbatim).
    pub document: String,
    pub role: TurnRole,
    pub session_id: String,
    /// Persona name the session belongs to.
    pub persona: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

/// A recalled turn returned from a semantic search, ranked by similarity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecalledTurn {
    pub record: EmbeddingRecord,
    /// Raw cosine distance from the query embedding (lower is closer).
    pub distance: f32,
}

impl RecalledTurn {
    /// Cosine similarity, clamped to be non-negative.
    pub fn similarity(&self) -> f32 {
        (1.0 - self.distance).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_similarity_from_distance() {
        let r = RecalledTurn {
            record: EmbeddingRecord {
                message_id: 1,
                document: "hello".to_string(),
                role: TurnRole::User,
                session_id: "1_Alice".to_string(),
                persona: "Alice".to_string(),
                user_id: 1,
                created_at: Utc::now(),
            },
            distance: 0.25,
        };
        assert!((r.similarity() - 0.75).abs() < f32::EPSILON);
    }

    #[test]
    fn test_similarity_clamped_non_negative() {
        let r = RecalledTurn {
            record: EmbeddingRecord {
                message_id: 1,
                document: "x".to_string(),
                role: TurnRole::Assistant,
                session_id: "s".to_string(),
                persona: "p".to_string(),
                user_id: 1,
                created_at: Utc::now(),
            },
            distance: 1.8,
        };
        assert_eq!(r.similarity(), 0.0);
    }

    #[test]
    fn test_embedding_record_serde() {
        let record = EmbeddingRecord {
            message_id: 9,
            document: "I like Rust".to_string(),
            role: TurnRole::User,
            session_id: "1_Alice".to_string(),
            persona: "Alice".to_string(),
            user_id: 1,
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"role\":\"user\""));
        assert!(json.contains("\"session_id\":\"1_Alice\""));
    }
}
