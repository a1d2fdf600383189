//! Prompt assembly for companion turns.
//!
//! `build_prompt` is a pure function from (persona, history, recalled
//! context, input) to a [`PromptPlan`]; model invocation happens elsewhere,
//! so assembly is testable without a provider.
//!
//! Message order is fixed: persona system prompt, few-shot example pairs,
//! recent session turns, then the current input. The most relevant recalled
//! snippets are folded into the current input as a "Previous context"
//! preamble rather than injected as separate turns.

use kindred_types::llm::{CompletionRequest, Message, MessageRole};
use kindred_types::memory::RecalledTurn;
use kindred_types::message::{Turn, TurnRole};
use kindred_types::persona::Persona;

/// Caps applied during prompt assembly.
#[derive(Debug, Clone)]
pub struct PromptOptions {
    /// Maximum few-shot example pairs taken from the persona.
    pub max_examples: usize,
    /// Recent session turns carried into the prompt.
    pub history_window: usize,
    /// Recalled snippets folded into the input preamble.
    pub max_context_snippets: usize,
}

impl Default for PromptOptions {
    fn default() -> Self {
        Self {
            max_examples: 6,
            history_window: 10,
            max_context_snippets: 2,
        }
    }
}

/// A fully assembled prompt, ready to become a completion request.
#[derive(Debug, Clone)]
pub struct PromptPlan {
    pub system: String,
    pub messages: Vec<Message>,
}

impl PromptPlan {
    /// Attach model parameters to produce a completion request.
    pub fn into_request(self, model: &str, temperature: f64, max_tokens: u32) -> CompletionRequest {
        CompletionRequest {
            model: model.to_string(),
            messages: self.messages,
            system: Some(self.system),
            max_tokens,
            temperature: Some(temperature),
        }
    }
}

/// Assemble the prompt for one companion turn.
///
/// `history` must be ascending by timestamp; only the last
/// `history_window` turns are kept. `recalled` must be ordered by descending
/// relevance; the first `max_context_snippets` are used.
pub fn build_prompt(
    persona: &Persona,
    history: &[Turn],
    recalled: &[RecalledTurn],
    input: &str,
    opts: &PromptOptions,
) -> PromptPlan {
    let mut messages = Vec::new();

    // Few-shot examples, alternating user/assistant.
    for example in persona.examples.iter().take(opts.max_examples) {
        messages.push(Message::user(example.input.clone()));
        messages.push(Message::assistant(example.output.clone()));
    }

    // Recent session turns (running memory).
    let start = history.len().saturating_sub(opts.history_window);
    for turn in &history[start..] {
        messages.push(Message {
            role: match turn.role {
                TurnRole::User => MessageRole::User,
                TurnRole::Assistant => MessageRole::Assistant,
            },
            content: turn.content.clone(),
        });
    }

    messages.push(Message::user(augment_input(
        input,
        recalled,
        opts.max_context_snippets,
    )));

    PromptPlan {
        system: persona.system_prompt.clone(),
        messages,
    }
}

/// Fold recalled snippets into the current input as a context preamble.
fn augment_input(input: &str, recalled: &[RecalledTurn], max_snippets: usize) -> String {
    if recalled.is_empty() || max_snippets == 0 {
        return input.to_string();
    }

    let snippets: Vec<String> = recalled
        .iter()
        .take(max_snippets)
        .map(|r| format!("- {}", r.record.document))
        .collect();

    format!(
        "Previous context:\n{}\n\nCurrent message: {input}",
        snippets.join("\n")
    )
}
