//! Shared domain types for Kindred.
//!
//! This crate holds the data shapes used across the workspace: user and
//! message rows, chat turns, personas, embedding records, LLM request/response
//! types, configuration, and the error taxonomy. It has no I/O dependencies.

pub mod config;
pub mod error;
pub mod identity;
pub mod llm;
pub mod memory;
pub mod message;
pub mod persona;
