//! SQLite persistence via sqlx.

pub mod message;
pub mod persona;
pub mod pool;
pub mod user;
