//! Arrow schema definition for the LanceDB turn embeddings table.
//!
//! Arrow versions MUST match lancedb's transitive dependency (57.3 for
//! lancedb 0.26).

use std::sync::Arc;

use arrow_schema::{DataType, Field, Schema};

/// BGESmallENV15 embedding dimension.
pub const EMBEDDING_DIMENSION: i32 = 384;

/// Schema for the turn embeddings table.
///
/// One row per companion message, keyed by `message_id`. The `session_id`
/// column is what every search filters on; the rest is metadata carried for
/// display and debugging.
pub fn turn_embeddings_schema() -> Schema {
    Schema::new(vec![
        Field::new("message_id", DataType::Int64, false),
        Field::new("document", DataType::Utf8, false),
        Field::new("role", DataType::Utf8, false),
        Field::new("session_id", DataType::Utf8, false),
        Field::new("persona", DataType::Utf8, false),
        Field::new("user_id", DataType::Int64, false),
        Field::new("created_at", DataType::Utf8, false),
        Field::new(
            "vector",
            DataType::FixedSizeList(
                Arc::new(Field::new("item", DataType::Float32, true)),
                EMBEDDING_DIMENSION,
            ),
            false,
        ),
    ])
}
