//! Repository trait definitions.
//!
//! All traits use native async fn in traits (RPITIT, Rust 2024 edition).
//! Concrete implementations live in kindred-infra.

pub mod message;
pub mod persona;
pub mod user;
