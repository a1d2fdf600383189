//! SemanticMemory service: embedding + index behind the degradation policy.
//!
//! The orchestrator talks to this service, never to the embedder or index
//! directly. Every operation here is allowed to fail without failing the
//! chat turn: errors and timeouts are logged at warn level and collapse to
//! an empty result (recall) or a no-op (remember/forget).

use std::time::Duration;

use tracing::warn;

use kindred_types::memory::{EmbeddingRecord, RecalledTurn};

use super::box_embedder::BoxEmbedder;
use super::box_index::BoxSemanticIndex;

/// Session-scoped semantic recall over companion messages.
pub struct SemanticMemory {
    embedder: BoxEmbedder,
    index: BoxSemanticIndex,
    embed_timeout: Duration,
}

impl SemanticMemory {
    /// Create a new semantic memory from an embedder and an index.
    pub fn new(embedder: BoxEmbedder, index: BoxSemanticIndex, embed_timeout: Duration) -> Self {
        Self {
            embedder,
            index,
            embed_timeout,
        }
    }

    /// Embed and store one message record. Idempotent per message id.
    ///
    /// Failures are logged and swallowed; the owning message row is already
    /// durable by the time this runs.
    pub async fn remember(&self, record: EmbeddingRecord) {
        let embedding = match self.embed_one(&record.document).await {
            Some(v) => v,
            None => return,
        };

        if let Err(e) = self.index.upsert(&record, &embedding).await {
            warn!(
                message_id = record.message_id,
                session_id = %record.session_id,
                error = %e,
                "failed to index message embedding"
            );
        }
    }

    /// Retrieve the `top_k` most similar prior turns for a session.
    ///
    /// Returns an empty vec on any embedding or index failure so the caller
    /// can proceed without supplementary context.
    pub async fn recall(&self, text: &str, session_id: &str, top_k: usize) -> Vec<RecalledTurn> {
        if top_k == 0 {
            return Vec::new();
        }

        let embedding = match self.embed_one(text).await {
            Some(v) => v,
            None => return Vec::new(),
        };

        match self.index.search(&embedding, session_id, top_k).await {
            Ok(results) => results,
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "semantic recall failed");
                Vec::new()
            }
        }
    }

    /// Remove all records for a session. Returns the deleted count (0 on
    /// failure).
    pub async fn forget_session(&self, session_id: &str) -> u64 {
        match self.index.delete_session(session_id).await {
            Ok(n) => n,
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "failed to clear session embeddings");
                0
            }
        }
    }

    async fn embed_one(&self, text: &str) -> Option<Vec<f32>> {
        let texts = [text.to_string()];
        let result = tokio::time::timeout(self.embed_timeout, self.embedder.embed(&texts)).await;

        match result {
            Ok(Ok(mut vectors)) if !vectors.is_empty() => Some(vectors.swap_remove(0)),
            Ok(Ok(_)) => {
                warn!("embedder returned no vectors");
                None
            }
            Ok(Err(e)) => {
                warn!(error = %e, "embedding failed");
                None
            }
            Err(_) => {
                warn!(timeout_ms = self.embed_timeout.as_millis() as u64, "embedding timed out");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::embedder::Embedder;
    use crate::memory::index::SemanticIndex;
    use chrono::Utc;
    use kindred_types::error::RepositoryError;
    use kindred_types::message::TurnRole;
    use std::sync::Mutex;

    struct FakeEmbedder {
        fail: bool,
    }

    impl Embedder for FakeEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RepositoryError> {
            if self.fail {
                return Err(RepositoryError::Query("embedder down".to_string()));
            }
            Ok(texts.iter().map(|t| seed_vector(t)).collect())
        }

        fn model_name(&self) -> &str {
            "fake-embedder"
        }

        fn dimension(&self) -> usize {
            8
        }
    }

    /// Deterministic unit vector derived from the text bytes.
    fn seed_vector(text: &str) -> Vec<f32> {
        let seed = text.bytes().fold(7u32, |acc, b| {
            acc.wrapping_mul(31).wrapping_add(b as u32)
        });
        let mut v: Vec<f32> = (0..8)
            .map(|i| (((seed >> (i * 3)) & 0xff) as f32 / 255.0) + 0.01)
            .collect();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        for x in v.iter_mut() {
            *x /= norm;
        }
        v
    }

    #[derive(Default)]
    struct InMemoryIndex {
        entries: Mutex<Vec<(EmbeddingRecord, Vec<f32>)>>,
        fail: bool,
    }

    impl SemanticIndex for InMemoryIndex {
        async fn upsert(
            &self,
            record: &EmbeddingRecord,
            embedding: &[f32],
        ) -> Result<(), RepositoryError> {
            if self.fail {
                return Err(RepositoryError::Query("index down".to_string()));
            }
            let mut entries = self.entries.lock().unwrap();
            entries.retain(|(r, _)| r.message_id != record.message_id);
            entries.push((record.clone(), embedding.to_vec()));
            Ok(())
        }

        async fn search(
            &self,
            embedding: &[f32],
            session_id: &str,
            top_k: usize,
        ) -> Result<Vec<RecalledTurn>, RepositoryError> {
            if self.fail {
                return Err(RepositoryError::Query("index down".to_string()));
            }
            let entries = self.entries.lock().unwrap();
            let mut hits: Vec<RecalledTurn> = entries
                .iter()
                .filter(|(r, _)| r.session_id == session_id)
                .map(|(r, v)| {
                    let dot: f32 = v.iter().zip(embedding).map(|(a, b)| a * b).sum();
                    RecalledTurn {
                        record: r.clone(),
                        distance: 1.0 - dot,
                    }
                })
                .collect();
            hits.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap());
            hits.truncate(top_k);
            Ok(hits)
        }

        async fn delete_session(&self, session_id: &str) -> Result<u64, RepositoryError> {
            let mut entries = self.entries.lock().unwrap();
            let before = entries.len();
            entries.retain(|(r, _)| r.session_id != session_id);
            Ok((before - entries.len()) as u64)
        }

        async fn count_session(&self, session_id: &str) -> Result<u64, RepositoryError> {
            let entries = self.entries.lock().unwrap();
            Ok(entries.iter().filter(|(r, _)| r.session_id == session_id).count() as u64)
        }
    }

    fn make_record(message_id: i64, document: &str, session_id: &str) -> EmbeddingRecord {
        EmbeddingRecord {
            message_id,
            document: document.to_string(),
            role: TurnRole::User,
            session_id: session_id.to_string(),
            persona: "Alice".to_string(),
            user_id: 1,
            created_at: Utc::now(),
        }
    }

    fn memory(embed_fail: bool, index_fail: bool) -> SemanticMemory {
        SemanticMemory::new(
            BoxEmbedder::new(FakeEmbedder { fail: embed_fail }),
            BoxSemanticIndex::new(InMemoryIndex {
                fail: index_fail,
                ..Default::default()
            }),
            Duration::from_secs(1),
        )
    }

    #[tokio::test]
    async fn test_remember_then_recall() {
        let mem = memory(false, false);

        mem.remember(make_record(1, "I adopted a cat named Miso", "1_Alice"))
            .await;
        mem.remember(make_record(2, "Planning a trip to Lisbon", "1_Alice"))
            .await;

        let recalled = mem
            .recall("I adopted a cat named Miso", "1_Alice", 3)
            .await;
        assert!(!recalled.is_empty());
        // The exact text is the nearest neighbor of itself.
        assert_eq!(recalled[0].record.message_id, 1);
    }

    #[tokio::test]
    async fn test_recall_scoped_to_session() {
        let mem = memory(false, false);

        mem.remember(make_record(1, "shared wording here", "1_Alice")).await;
        mem.remember(make_record(2, "shared wording here", "1_Sage")).await;

        let recalled = mem.recall("shared wording here", "1_Alice", 10).await;
        assert_eq!(recalled.len(), 1);
        assert_eq!(recalled[0].record.session_id, "1_Alice");
    }

    #[tokio::test]
    async fn test_recall_degrades_on_embedder_failure() {
        let mem = memory(true, false);
        let recalled = mem.recall("anything", "1_Alice", 3).await;
        assert!(recalled.is_empty());
    }

    #[tokio::test]
    async fn test_recall_degrades_on_index_failure() {
        let mem = memory(false, true);
        let recalled = mem.recall("anything", "1_Alice", 3).await;
        assert!(recalled.is_empty());
    }

    #[tokio::test]
    async fn test_remember_swallows_index_failure() {
        let mem = memory(false, true);
        // Must not panic or propagate.
        mem.remember(make_record(1, "hello", "1_Alice")).await;
    }

    #[tokio::test]
    async fn test_recall_top_k_zero_is_empty() {
        let mem = memory(false, false);
        mem.remember(make_record(1, "hello", "1_Alice")).await;
        let recalled = mem.recall("hello", "1_Alice", 0).await;
        assert!(recalled.is_empty());
    }

    #[tokio::test]
    async fn test_forget_session_returns_count() {
        let mem = memory(false, false);
        mem.remember(make_record(1, "a", "1_Alice")).await;
        mem.remember(make_record(2, "b", "1_Alice")).await;
        mem.remember(make_record(3, "c", "1_Sage")).await;

        assert_eq!(mem.forget_session("1_Alice").await, 2);
        assert!(mem.recall("a", "1_Alice", 5).await.is_empty());
        assert_eq!(mem.recall("c", "1_Sage", 5).await.len(), 1);
    }
}
