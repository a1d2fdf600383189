//! Persona types for Kindred.
//!
//! A persona is the personality behind a companion session: a system prompt,
//! a handful of few-shot example turns, and presentation metadata. Built-in
//! personas are static definitions; custom personas are user-owned rows with
//! soft deletion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder token replaced with the user's name at resolution time.
pub const USERNAME_PLACEHOLDER: &str = "#USERNAME";

/// One few-shot example exchange (user input, assistant output).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleTurn {
    pub input: String,
    pub output: String,
}

/// A fully resolved persona, ready for prompt assembly.
///
/// Produced by the persona resolver; the system prompt has already had
/// `#USERNAME` substituted. Callers never see raw row data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Persona {
    pub name: String,
    pub system_prompt: String,
    pub examples: Vec<ExampleTurn>,
    pub description: Option<String>,
    pub avatar_url: Option<String>,
}

/// Reference to a persona: a built-in by name, or a custom one by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersonaRef {
    BuiltIn(String),
    Custom(i64),
}

impl PersonaRef {
    /// The session key fragment for this reference.
    ///
    /// `"{user_id}_{name}"` for built-ins, `"{user_id}_custom_{id}"` for
    /// custom personas. This format is part of the public contract: history
    /// and clear operations key off it.
    pub fn session_id(&self, user_id: i64) -> String {
        match self {
            PersonaRef::BuiltIn(name) => format!("{user_id}_{name}"),
            PersonaRef::Custom(id) => format!("{user_id}_custom_{id}"),
        }
    }
}

/// A custom persona row, owned by a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomPersona {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    pub system_prompt: String,
    pub examples: Vec<ExampleTurn>,
    pub description: Option<String>,
    pub avatar_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating a custom persona.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePersonaRequest {
    pub name: String,
    pub system_prompt: String,
    #[serde(default)]
    pub examples: Vec<ExampleTurn>,
    pub description: Option<String>,
    pub avatar_url: Option<String>,
}

/// Fields for updating a custom persona. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePersonaRequest {
    pub name: Option<String>,
    pub system_prompt: Option<String>,
    pub examples: Option<Vec<ExampleTurn>>,
    pub description: Option<String>,
    pub avatar_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_built_in() {
        let r = PersonaRef::BuiltIn("Alice".to_string());
        assert_eq!(r.session_id(1), "1_Alice");
    }

    #[test]
    fn test_session_id_custom() {
        let r = PersonaRef::Custom(42);
        assert_eq!(r.session_id(7), "7_custom_42");
    }

    #[test]
    fn test_example_turn_serde() {
        let turn = ExampleTurn {
            input: "hi".to_string(),
            output: "hello!".to_string(),
        };
        let json = serde_json::to_string(&turn).unwrap();
        let parsed: ExampleTurn = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, turn);
    }

    #[test]
    fn test_create_request_examples_default_empty() {
        let json = r#"{"name":"Buddy","system_prompt":"You are Buddy."}"#;
        let req: CreatePersonaRequest = serde_json::from_str(json).unwrap();
        assert!(req.examples.is_empty());
    }
}
