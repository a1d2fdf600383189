//! Message and turn types for Kindred.
//!
//! Messages are the durable rows in the relational store: directed content
//! between two user ids, optionally tagged with a conversation session.
//! Turns are the chat-level view of the same data: role + content, used by
//! the session history adapter and the prompt builder.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Role of a turn within a conversation session.
///
/// Carried explicitly on every turn so role dispatch never depends on
/// inspecting the underlying row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

impl fmt::Display for TurnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnRole::User => write!(f, "user"),
            TurnRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for TurnRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(TurnRole::User),
            "assistant" | "ai" => Ok(TurnRole::Assistant),
            other => Err(format!("invalid turn role: '{other}'")),
        }
    }
}

/// A durable message row.
///
/// Immutable once written, except for deletion via a session-scoped clear.
/// `id` is the join key into the semantic memory index. `session_id` is
/// `None` for rows written outside any companion session; such rows are
/// invisible to session-scoped reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub content: String,
    pub is_ai: bool,
    pub created_at: DateTime<Utc>,
    pub session_id: Option<String>,
}

/// Fields for appending a new message (id and timestamp assigned by the store).
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub sender_id: i64,
    pub receiver_id: i64,
    pub content: String,
    pub is_ai: bool,
    pub session_id: Option<String>,
}

/// A single conversational turn as seen by the chat layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
    pub message_id: i64,
    pub created_at: DateTime<Utc>,
}

impl Turn {
    /// Project a stored message into a turn.
    pub fn from_message(msg: &Message) -> Self {
        Self {
            role: if msg.is_ai {
                TurnRole::Assistant
            } else {
                TurnRole::User
            },
            content: msg.content.clone(),
            message_id: msg.id,
            created_at: msg.created_at,
        }
    }
}

/// Sort order for message queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// The result of one completed companion exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatExchange {
    pub user_message: String,
    pub ai_response: String,
    pub timestamp: DateTime<Utc>,
}

/// A history entry annotated for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub message_id: i64,
    /// Display name: the persona name for AI turns, the username otherwise.
    pub from: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_role_roundtrip() {
        for role in [TurnRole::User, TurnRole::Assistant] {
            let s = role.to_string();
            let parsed: TurnRole = s.parse().unwrap();
            assert_eq!(role, parsed);
        }
    }

    #[test]
    fn test_turn_role_accepts_ai_alias() {
        let parsed: TurnRole = "ai".parse().unwrap();
        assert_eq!(parsed, TurnRole::Assistant);
    }

    #[test]
    fn test_turn_role_serde() {
        let json = serde_json::to_string(&TurnRole::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
        let parsed: TurnRole = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, TurnRole::Assistant);
    }

    #[test]
    fn test_turn_from_message_maps_is_ai_to_role() {
        let msg = Message {
            id: 7,
            sender_id: 1,
            receiver_id: 2,
            content: "hello".to_string(),
            is_ai: true,
            created_at: Utc::now(),
            session_id: Some("1_Alice".to_string()),
        };
        let turn = Turn::from_message(&msg);
        assert_eq!(turn.role, TurnRole::Assistant);
        assert_eq!(turn.message_id, 7);
        assert_eq!(turn.content, "hello");
    }
}
