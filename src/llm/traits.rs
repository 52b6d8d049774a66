//! CompletionService trait definition
//!
//! Same shape as `GraphConnection`: async trait + Send + Sync so a single
//! `Arc<dyn CompletionService>` can serve every caller.

use crate::chat::ConversationTurn;
use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

/// A chat-completion request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ConversationTurn>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Abstract interface for a text-completion service.
///
/// # Implementations
///
/// - [`HttpCompletionService`](super::HttpCompletionService): any OpenAI-compatible
///   `/v1/chat/completions` endpoint (OpenAI, Ollama, LiteLLM, vLLM, ...)
/// - [`MockCompletionService`](super::MockCompletionService): scripted replies for tests
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Generate the assistant reply for a conversation.
    ///
    /// # Errors
    ///
    /// Returns an error if the service cannot be reached or answers with
    /// an error. Implementations must not retry.
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}
