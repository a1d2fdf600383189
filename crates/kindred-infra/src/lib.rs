//! Infrastructure implementations for Kindred.
//!
//! Concrete adapters behind the traits defined in kindred-core: SQLite
//! repositories (sqlx), the LanceDB semantic index, the fastembed local
//! embedder, and the Groq-backed chat model.

pub mod config;
pub mod llm;
pub mod sqlite;
pub mod vector;
