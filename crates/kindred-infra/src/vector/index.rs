//! LanceDB-backed semantic index for companion turns.
//!
//! Implements `SemanticIndex` from `kindred-core` over a single
//! `turn_embeddings` table with 384-dimensional BGESmallENV15 embeddings.
//!
//! Key behaviors:
//! - Cosine distance search, filtered server-side to one session id
//! - Idempotent upsert keyed by message id (delete-then-add)
//! - Session-scoped deletion for history clears

use std::sync::Arc;

use arrow_array::{
    FixedSizeListArray, Float32Array, Int64Array, RecordBatch, RecordBatchIterator, StringArray,
};
use arrow_schema::{DataType, Field};
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};

use kindred_core::memory::index::SemanticIndex;
use kindred_types::error::RepositoryError;
use kindred_types::memory::{EmbeddingRecord, RecalledTurn};
use kindred_types::message::TurnRole;

use super::lance::LanceVectorStore;
use super::schema::{turn_embeddings_schema, EMBEDDING_DIMENSION};

/// LanceDB-backed implementation of `SemanticIndex`.
pub struct LanceSemanticIndex {
    store: LanceVectorStore,
}

impl LanceSemanticIndex {
    /// Create a new index backed by the given LanceDB store.
    pub fn new(store: LanceVectorStore) -> Self {
        Self { store }
    }

    async fn ensure_table(&self) -> Result<lancedb::Table, RepositoryError> {
        let schema = Arc::new(turn_embeddings_schema());
        self.store
            .ensure_table(LanceVectorStore::turn_table_name(), schema)
            .await
            .map_err(|e| RepositoryError::Query(format!("Failed to ensure turn table: {e}")))
    }

    /// Build an Arrow RecordBatch from an EmbeddingRecord and its vector.
    fn build_record_batch(
        record: &EmbeddingRecord,
        embedding: &[f32],
    ) -> Result<RecordBatch, RepositoryError> {
        let schema = Arc::new(turn_embeddings_schema());

        let message_id_array = Int64Array::from(vec![record.message_id]);
        let document_array = StringArray::from(vec![record.document.clone()]);
        let role_array = StringArray::from(vec![record.role.to_string()]);
        let session_id_array = StringArray::from(vec![record.session_id.clone()]);
        let persona_array = StringArray::from(vec![record.persona.clone()]);
        let user_id_array = Int64Array::from(vec![record.user_id]);
        let created_at_array = StringArray::from(vec![record.created_at.to_rfc3339()]);

        let values = Float32Array::from(embedding.to_vec());
        let field = Arc::new(Field::new("item", DataType::Float32, true));
        let vector_array = FixedSizeListArray::new(field, EMBEDDING_DIMENSION, Arc::new(values), None);

        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(message_id_array),
                Arc::new(document_array),
                Arc::new(role_array),
                Arc::new(session_id_array),
                Arc::new(persona_array),
                Arc::new(user_id_array),
                Arc::new(created_at_array),
                Arc::new(vector_array),
            ],
        )
        .map_err(|e| RepositoryError::Query(format!("Failed to build record batch: {e}")))
    }

    /// Parse Arrow RecordBatch rows back into EmbeddingRecord values.
    ///
    /// Extracts columns by index and reconstructs domain objects, skipping
    /// the vector column (used only for search).
    fn record_batch_to_records(batch: &RecordBatch) -> Vec<EmbeddingRecord> {
        let num_rows = batch.num_rows();
        if num_rows == 0 {
            return vec![];
        }

        let message_id_col = batch
            .column(0)
            .as_any()
            .downcast_ref::<Int64Array>()
            .expect("message_id column should be Int64Array");
        let document_col = batch
            .column(1)
            .as_any()
            .downcast_ref::<StringArray>()
            .expect("document column should be StringArray");
        let role_col = batch
            .column(2)
            .as_any()
            .downcast_ref::<StringArray>()
            .expect("role column should be StringArray");
        let session_id_col = batch
            .column(3)
            .as_any()
            .downcast_ref::<StringArray>()
            .expect("session_id column should be StringArray");
        let persona_col = batch
            .column(4)
            .as_any()
            .downcast_ref::<StringArray>()
            .expect("persona column should be StringArray");
        let user_id_col = batch
            .column(5)
            .as_any()
            .downcast_ref::<Int64Array>()
            .expect("user_id column should be Int64Array");
        let created_at_col = batch
            .column(6)
            .as_any()
            .downcast_ref::<StringArray>()
            .expect("created_at column should be StringArray");

        let mut records = Vec::with_capacity(num_rows);

        for i in 0..num_rows {
            let role: TurnRole = role_col.value(i).parse().unwrap_or(TurnRole::User);
            let created_at = DateTime::parse_from_rfc3339(created_at_col.value(i))
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now());

            records.push(EmbeddingRecord {
                message_id: message_id_col.value(i),
                document: document_col.value(i).to_string(),
                role,
                session_id: session_id_col.value(i).to_string(),
                persona: persona_col.value(i).to_string(),
                user_id: user_id_col.value(i),
                created_at,
            });
        }

        records
    }
}

/// Quote a string for a LanceDB SQL filter expression.
fn sql_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

impl SemanticIndex for LanceSemanticIndex {
    async fn upsert(
        &self,
        record: &EmbeddingRecord,
        embedding: &[f32],
    ) -> Result<(), RepositoryError> {
        let table = self.ensure_table().await?;

        // Delete-then-add keyed by message id keeps upserts idempotent.
        table
            .delete(&format!("message_id = {}", record.message_id))
            .await
            .map_err(|e| RepositoryError::Query(format!("Failed to replace embedding: {e}")))?;

        let batch = Self::build_record_batch(record, embedding)?;
        let schema = batch.schema();
        let reader = RecordBatchIterator::new(vec![Ok(batch)], schema);

        table
            .add(reader)
            .execute()
            .await
            .map_err(|e| RepositoryError::Query(format!("Failed to add embedding: {e}")))?;

        Ok(())
    }

    async fn search(
        &self,
        embedding: &[f32],
        session_id: &str,
        top_k: usize,
    ) -> Result<Vec<RecalledTurn>, RepositoryError> {
        if !self
            .store
            .table_exists(LanceVectorStore::turn_table_name())
            .await
        {
            return Ok(vec![]);
        }

        let table = self.ensure_table().await?;

        // The session filter runs inside LanceDB so cross-session rows are
        // never candidates, whatever the vector distances look like.
        let results = table
            .vector_search(embedding)
            .map_err(|e| RepositoryError::Query(format!("Vector search setup failed: {e}")))?
            .distance_type(lancedb::DistanceType::Cosine)
            .only_if(format!("session_id = {}", sql_quote(session_id)))
            .limit(top_k)
            .execute()
            .await
            .map_err(|e| RepositoryError::Query(format!("Vector search failed: {e}")))?;

        let batches: Vec<RecordBatch> = results
            .try_collect()
            .await
            .map_err(|e| RepositoryError::Query(format!("Failed to collect results: {e}")))?;

        let mut recalled: Vec<RecalledTurn> = Vec::new();

        for batch in &batches {
            if batch.num_rows() == 0 {
                continue;
            }

            // The _distance column is added by LanceDB vector search
            let distance_col = batch
                .column_by_name("_distance")
                .and_then(|c| c.as_any().downcast_ref::<Float32Array>());

            let records = Self::record_batch_to_records(batch);

            for (i, record) in records.into_iter().enumerate() {
                let distance = distance_col.map_or(0.0, |d| d.value(i));
                recalled.push(RecalledTurn { record, distance });
            }
        }

        recalled.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        recalled.truncate(top_k);

        Ok(recalled)
    }

    async fn delete_session(&self, session_id: &str) -> Result<u64, RepositoryError> {
        if !self
            .store
            .table_exists(LanceVectorStore::turn_table_name())
            .await
        {
            return Ok(0);
        }

        let table = self.ensure_table().await?;
        let filter = format!("session_id = {}", sql_quote(session_id));

        let count = table
            .count_rows(Some(filter.clone()))
            .await
            .map_err(|e| RepositoryError::Query(format!("Failed to count session rows: {e}")))?
            as u64;

        if count > 0 {
            table
                .delete(&filter)
                .await
                .map_err(|e| RepositoryError::Query(format!("Failed to delete session rows: {e}")))?;
        }

        Ok(count)
    }

    async fn count_session(&self, session_id: &str) -> Result<u64, RepositoryError> {
        if !self
            .store
            .table_exists(LanceVectorStore::turn_table_name())
            .await
        {
            return Ok(0);
        }

        let table = self.ensure_table().await?;
        let count = table
            .count_rows(Some(format!("session_id = {}", sql_quote(session_id))))
            .await
            .map_err(|e| RepositoryError::Query(format!("Failed to count rows: {e}")))?;

        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Create a test EmbeddingRecord with the given parameters.
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

    /// Generate a simple deterministic embedding for testing.
    /// Uses a seed value to create distinct but reproducible vectors.
    fn make_embedding(seed: f32) -> Vec<f32> {
        let mut vec = vec![0.0_f32; EMBEDDING_DIMENSION as usize];
        for (i, val) in vec.iter_mut().enumerate() {
            *val = ((i as f32 + seed) * 0.01).sin();
        }
        // Normalize to unit length for cosine similarity
        let norm: f32 = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for val in vec.iter_mut() {
                *val /= norm;
            }
        }
        vec
    }

    async fn setup_index() -> (LanceSemanticIndex, tempfile::TempDir) {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = LanceVectorStore::new(temp_dir.path().to_path_buf())
            .await
            .expect("Failed to create LanceVectorStore");
        (LanceSemanticIndex::new(store), temp_dir)
    }

    #[tokio::test]
    async fn test_upsert_and_count() {
        let (index, _tmp) = setup_index().await;

        assert_eq!(index.count_session("1_Alice").await.unwrap(), 0);

        index
            .upsert(&make_record(1, "hello there", "1_Alice"), &make_embedding(1.0))
            .await
            .unwrap();
        index
            .upsert(&make_record(2, "how are you", "1_Alice"), &make_embedding(2.0))
            .await
            .unwrap();

        assert_eq!(index.count_session("1_Alice").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent_per_message_id() {
        let (index, _tmp) = setup_index().await;

        let record = make_record(1, "hello there", "1_Alice");
        index.upsert(&record, &make_embedding(1.0)).await.unwrap();
        index.upsert(&record, &make_embedding(1.0)).await.unwrap();

        assert_eq!(index.count_session("1_Alice").await.unwrap(), 1);

        let results = index
            .search(&make_embedding(1.0), "1_Alice", 10)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].record.message_id, 1);
    }

    #[tokio::test]
    async fn test_search_orders_by_distance() {
        let (index, _tmp) = setup_index().await;

        for i in 0..5 {
            index
                .upsert(
                    &make_record(i, &format!("turn {i}"), "1_Alice"),
                    &make_embedding(i as f32),
                )
                .await
                .unwrap();
        }

        let results = index
            .search(&make_embedding(0.0), "1_Alice", 3)
            .await
            .unwrap();

        assert!(!results.is_empty());
        assert!(results.len() <= 3);
        // Nearest neighbor of embedding 0 is record 0.
        assert_eq!(results[0].record.message_id, 0);
        for window in results.windows(2) {
            assert!(window[0].distance <= window[1].distance + f32::EPSILON);
        }
    }

    #[tokio::test]
    async fn test_search_never_crosses_sessions() {
        let (index, _tmp) = setup_index().await;

        // Identical text and vectors in two sessions.
        index
            .upsert(&make_record(1, "shared wording", "1_Alice"), &make_embedding(5.0))
            .await
            .unwrap();
        index
            .upsert(&make_record(2, "shared wording", "1_Sage"), &make_embedding(5.0))
            .await
            .unwrap();

        let results = index
            .search(&make_embedding(5.0), "1_Alice", 10)
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        for r in &results {
            assert_eq!(r.record.session_id, "1_Alice");
        }
    }

    #[tokio::test]
    async fn test_search_missing_table_is_empty() {
        let (index, _tmp) = setup_index().await;
        let results = index
            .search(&make_embedding(0.0), "1_Alice", 10)
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_delete_session_returns_count_and_spares_others() {
        let (index, _tmp) = setup_index().await;

        index
            .upsert(&make_record(1, "a", "1_Alice"), &make_embedding(1.0))
            .await
            .unwrap();
        index
            .upsert(&make_record(2, "b", "1_Alice"), &make_embedding(2.0))
            .await
            .unwrap();
        index
            .upsert(&make_record(3, "c", "1_Sage"), &make_embedding(3.0))
            .await
            .unwrap();

        let deleted = index.delete_session("1_Alice").await.unwrap();
        assert_eq!(deleted, 2);

        assert_eq!(index.count_session("1_Alice").await.unwrap(), 0);
        assert_eq!(index.count_session("1_Sage").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_session_missing_table() {
        let (index, _tmp) = setup_index().await;
        assert_eq!(index.delete_session("1_Alice").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_session_id_with_quote_is_escaped() {
        let (index, _tmp) = setup_index().await;

        let session = "1_O'Brien";
        index
            .upsert(&make_record(1, "hi", session), &make_embedding(1.0))
            .await
            .unwrap();

        assert_eq!(index.count_session(session).await.unwrap(), 1);
        let results = index.search(&make_embedding(1.0), session, 5).await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_record_batch_roundtrip() {
        let record = EmbeddingRecord {
            message_id: 42,
            document: "Test roundtrip turn".to_string(),
            role: TurnRole::Assistant,
            session_id: "7_Sage".to_string(),
            persona: "Sage".to_string(),
            user_id: 7,
            created_at: Utc::now(),
        };

        let embedding = make_embedding(42.0);
        let batch = LanceSemanticIndex::build_record_batch(&record, &embedding).unwrap();

        assert_eq!(batch.num_rows(), 1);
        assert_eq!(batch.num_columns(), 8);

        let records = LanceSemanticIndex::record_batch_to_records(&batch);
        assert_eq!(records.len(), 1);

        let recovered = &records[0];
        assert_eq!(recovered.message_id, record.message_id);
        assert_eq!(recovered.document, record.document);
        assert_eq!(recovered.role, record.role);
        assert_eq!(recovered.session_id, record.session_id);
        assert_eq!(recovered.persona, record.persona);
        assert_eq!(recovered.user_id, record.user_id);
    }

    #[test]
    fn test_sql_quote_escapes() {
        assert_eq!(sql_quote("1_Alice"), "'1_Alice'");
        assert_eq!(sql_quote("1_O'Brien"), "'1_O''Brien'");
    }
}
