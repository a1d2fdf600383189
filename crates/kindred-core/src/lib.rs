//! Business logic for Kindred.
//!
//! Defines the repository and collaborator traits (implemented in
//! kindred-infra), the session history adapter, the semantic memory service,
//! the persona resolver, and the chat orchestrator. This crate never touches
//! SQLite, LanceDB, or the network directly.

pub mod chat;
pub mod llm;
pub mod memory;
pub mod persona;
pub mod repository;
