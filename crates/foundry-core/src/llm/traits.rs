//! Model abstraction

use async_trait::async_trait;

use crate::Result;
use crate::llm::types::{ChatCompletion, ChatMessage};

/// A chat completion backend.
///
/// The production implementation calls Azure OpenAI over HTTP; tests
/// substitute in-memory fakes so conversation logic runs without a network.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Run one completion over the full message transcript.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<ChatCompletion>;
}
