//! BoxChatModel -- object-safe dynamic dispatch wrapper for ChatModel.
//!
//! Same blanket-impl pattern as `BoxEmbedder`.

use std::future::Future;
use std::pin::Pin;

use kindred_types::llm::{CompletionRequest, CompletionResponse, LlmError};

use super::model::ChatModel;

/// Object-safe version of [`ChatModel`] with boxed futures.
pub trait ChatModelDyn: Send + Sync {
    fn complete_boxed<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<CompletionResponse, LlmError>> + Send + 'a>>;

    fn name_dyn(&self) -> &str;
}

impl<T: ChatModel> ChatModelDyn for T {
    fn complete_boxed<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<CompletionResponse, LlmError>> + Send + 'a>> {
        Box::pin(self.complete(request))
    }

    fn name_dyn(&self) -> &str {
        self.name()
    }
}

/// Type-erased chat model for runtime substitution.
///
/// The engine holds one of these so tests can inject canned or failing
/// models without touching the network.
pub struct BoxChatModel {
    inner: Box<dyn ChatModelDyn + Send + Sync>,
}

impl BoxChatModel {
    /// Wrap a concrete `ChatModel` in a type-erased box.
    pub fn new<T: ChatModel + 'static>(model: T) -> Self {
        Self {
            inner: Box::new(model),
        }
    }

    /// Send a completion request and receive the full response.
    pub async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, LlmError> {
        self.inner.complete_boxed(request).await
    }

    /// Human-readable provider name.
    pub fn name(&self) -> &str {
        self.inner.name_dyn()
    }
}
