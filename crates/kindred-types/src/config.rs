//! Application configuration for Kindred.
//!
//! Deserialized from `config.toml` in the data directory; every field has a
//! serde default so a missing or partial file still yields a working setup.

use serde::{Deserialize, Serialize};

/// Global configuration, loaded from `{data_dir}/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Generation model identifier.
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature for companion replies.
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Maximum output tokens per completion.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// How many prior turns to recall from the vector index per message.
    #[serde(default = "default_recall_top_k")]
    pub recall_top_k: usize,

    /// Maximum few-shot example pairs included from a persona.
    #[serde(default = "default_max_examples")]
    pub max_examples: usize,

    /// Recent session turns carried into the prompt.
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Generation call timeout in milliseconds.
    #[serde(default = "default_generation_timeout_ms")]
    pub generation_timeout_ms: u64,

    /// Embedding call timeout in milliseconds.
    #[serde(default = "default_embedding_timeout_ms")]
    pub embedding_timeout_ms: u64,

    /// Reply substituted when the generation model fails.
    #[serde(default = "default_fallback_reply")]
    pub fallback_reply: String,
}

fn default_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}

fn default_temperature() -> f64 {
    0.8
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_recall_top_k() -> usize {
    3
}

fn default_max_examples() -> usize {
    6
}

fn default_history_window() -> usize {
    10
}

fn default_generation_timeout_ms() -> u64 {
    30_000
}

fn default_embedding_timeout_ms() -> u64 {
    10_000
}

fn default_fallback_reply() -> String {
    "I'm sorry, I'm having trouble thinking straight right now. Could you say that again in a moment?".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            recall_top_k: default_recall_top_k(),
            max_examples: default_max_examples(),
            history_window: default_history_window(),
            generation_timeout_ms: default_generation_timeout_ms(),
            embedding_timeout_ms: default_embedding_timeout_ms(),
            fallback_reply: default_fallback_reply(),
        }
    }
}
