//! MessageRepository trait definition.
//!
//! The durable message store: an append-only log of directed messages between
//! two user ids, queryable by participant pair and time order, deletable only
//! by session-scoped clear.

use kindred_types::error::RepositoryError;
use kindred_types::message::{Message, NewMessage, SortOrder};

/// Repository trait for message persistence.
///
/// Implementations live in kindred-infra (e.g., `SqliteMessageRepository`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
///
/// Every append is immediately visible to subsequent queries; there is no
/// buffering. An unknown sender or receiver surfaces as
/// `RepositoryError::Conflict` (foreign-key violation) and is never retried.
pub trait MessageRepository: Send + Sync {
    /// Append a message, assigning its id and timestamp.
    fn append(
        &self,
        message: &NewMessage,
    ) -> impl std::future::Future<Output = Result<Message, RepositoryError>> + Send;

    /// List messages exchanged between a participant pair (both directions),
    /// optionally filtered to a session tag, ordered by timestamp (id as
    /// tiebreaker).
    fn list_between(
        &self,
        user_a: i64,
        user_b: i64,
        session_id: Option<&str>,
        order: SortOrder,
        limit: Option<i64>,
    ) -> impl std::future::Future<Output = Result<Vec<Message>, RepositoryError>> + Send;

    /// Delete exactly the messages between a participant pair that carry the
    /// given session tag. Returns the number of rows removed.
    fn delete_session(
        &self,
        user_a: i64,
        user_b: i64,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    /// Count messages tagged with a session.
    fn count_for_session(
        &self,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
