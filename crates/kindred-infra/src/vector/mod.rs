//! Vector database infrastructure for turn embeddings.
//!
//! Provides LanceDB connection management, the Arrow table schema, the
//! `SemanticIndex` implementation, and fastembed-based local embedding
//! generation.

pub mod embedder;
pub mod index;
pub mod lance;
pub mod schema;
