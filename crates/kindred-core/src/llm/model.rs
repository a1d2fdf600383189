//! ChatModel trait definition.
//!
//! The seam to the external generation model. One blocking completion call
//! per chat turn; no streaming contract. Implementations live in
//! kindred-infra (e.g., the Groq-backed provider).

use kindred_types::llm::{CompletionRequest, CompletionResponse, LlmError};

/// Trait for generation model backends.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait ChatModel: Send + Sync {
    /// Human-readable provider name (e.g., "groq").
    fn name(&self) -> &str;

    /// Send a completion request and receive the full response.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}
