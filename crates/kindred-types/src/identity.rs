//! User identity types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reserved username for the synthetic AI counterparty.
///
/// Every companion exchange is stored as directed messages between a human
/// user and this single AI identity; session tags keep personas apart.
pub const AI_USERNAME: &str = "kindred-ai";

/// A registered user.
///
/// Ids are opaque integers assigned by the relational store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
}

impl User {
    /// Whether this row is the synthetic AI identity.
    pub fn is_ai(&self) -> bool {
        self.username == AI_USERNAME
    }
}

/// Fields for creating a new user row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: Option<String>,
}
