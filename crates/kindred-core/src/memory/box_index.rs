//! BoxSemanticIndex -- object-safe dynamic dispatch wrapper for SemanticIndex.
//!
//! Same blanket-impl pattern as `BoxEmbedder`.

use std::future::Future;
use std::pin::Pin;

use kindred_types::error::RepositoryError;
use kindred_types::memory::{EmbeddingRecord, RecalledTurn};

use super::index::SemanticIndex;

/// Object-safe version of [`SemanticIndex`] with boxed futures.
pub trait SemanticIndexDyn: Send + Sync {
    fn upsert_boxed<'a>(
        &'a self,
        record: &'a EmbeddingRecord,
        embedding: &'a [f32],
    ) -> Pin<Box<dyn Future<Output = Result<(), RepositoryError>> + Send + 'a>>;

    fn search_boxed<'a>(
        &'a self,
        embedding: &'a [f32],
        session_id: &'a str,
        top_k: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<RecalledTurn>, RepositoryError>> + Send + 'a>>;

    fn delete_session_boxed<'a>(
        &'a self,
        session_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<u64, RepositoryError>> + Send + 'a>>;

    fn count_session_boxed<'a>(
        &'a self,
        session_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<u64, RepositoryError>> + Send + 'a>>;
}

impl<T: SemanticIndex> SemanticIndexDyn for T {
    fn upsert_boxed<'a>(
        &'a self,
        record: &'a EmbeddingRecord,
        embedding: &'a [f32],
    ) -> Pin<Box<dyn Future<Output = Result<(), RepositoryError>> + Send + 'a>> {
        Box::pin(self.upsert(record, embedding))
    }

    fn search_boxed<'a>(
        &'a self,
        embedding: &'a [f32],
        session_id: &'a str,
        top_k: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<RecalledTurn>, RepositoryError>> + Send + 'a>>
    {
        Box::pin(self.search(embedding, session_id, top_k))
    }

    fn delete_session_boxed<'a>(
        &'a self,
        session_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<u64, RepositoryError>> + Send + 'a>> {
        Box::pin(self.delete_session(session_id))
    }

    fn count_session_boxed<'a>(
        &'a self,
        session_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<u64, RepositoryError>> + Send + 'a>> {
        Box::pin(self.count_session(session_id))
    }
}

/// Type-erased semantic index for runtime substitution.
///
/// The production index is LanceDB-backed; tests swap in an in-memory fake
/// through this wrapper.
pub struct BoxSemanticIndex {
    inner: Box<dyn SemanticIndexDyn + Send + Sync>,
}

impl BoxSemanticIndex {
    /// Wrap a concrete `SemanticIndex` in a type-erased box.
    pub fn new<T: SemanticIndex + 'static>(index: T) -> Self {
        Self {
            inner: Box::new(index),
        }
    }

    /// Store a record with its embedding, keyed by message id (idempotent).
    pub async fn upsert(
        &self,
        record: &EmbeddingRecord,
        embedding: &[f32],
    ) -> Result<(), RepositoryError> {
        self.inner.upsert_boxed(record, embedding).await
    }

    /// Nearest-neighbor search scoped to one session.
    pub async fn search(
        &self,
        embedding: &[f32],
        session_id: &str,
        top_k: usize,
    ) -> Result<Vec<RecalledTurn>, RepositoryError> {
        self.inner.search_boxed(embedding, session_id, top_k).await
    }

    /// Delete all records for a session.
    pub async fn delete_session(&self, session_id: &str) -> Result<u64, RepositoryError> {
        self.inner.delete_session_boxed(session_id).await
    }

    /// Count records for a session.
    pub async fn count_session(&self, session_id: &str) -> Result<u64, RepositoryError> {
        self.inner.count_session_boxed(session_id).await
    }
}
