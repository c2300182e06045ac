//! Model access: Azure OpenAI client and the abstraction over it

mod client;
mod traits;
mod types;

pub use client::FoundryClient;
pub use traits::ChatModel;
pub use types::{ChatCompletion, ChatMessage, ChatRole, TokenUsage};
