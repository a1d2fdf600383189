//! Semantic index trait.
//!
//! Defines the interface for the vector index that stores one embedding per
//! companion message. Implementations (e.g., LanceDB) live in kindred-infra.

use kindred_types::error::RepositoryError;
use kindred_types::memory::{EmbeddingRecord, RecalledTurn};

/// Trait for vector-indexed turn storage with session-scoped search.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
pub trait SemanticIndex: Send + Sync {
    /// Store a record with its embedding, keyed by `message_id`.
    ///
    /// Idempotent: a second upsert for the same message id replaces the
    /// existing entry rather than duplicating it.
    fn upsert(
        &self,
        record: &EmbeddingRecord,
        embedding: &[f32],
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Nearest-neighbor search scoped strictly to one session.
    ///
    /// Returns up to `top_k` results ordered by ascending cosine distance.
    /// Records whose `session_id` differs from the scope are never returned,
    /// whatever their other metadata.
    fn search(
        &self,
        embedding: &[f32],
        session_id: &str,
        top_k: usize,
    ) -> impl std::future::Future<Output = Result<Vec<RecalledTurn>, RepositoryError>> + Send;

    /// Delete all records for a session. Returns the count of deleted entries.
    fn delete_session(
        &self,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    /// Count records for a session.
    fn count_session(
        &self,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
