//! foundry-core: Azure AI Foundry assistant core library
//!
//! Configuration, the Azure OpenAI chat client, content safety, and
//! per-conversation session management shared by the bot surfaces.

pub mod config;
pub mod error;
pub mod llm;
pub mod safety;
pub mod session;
pub mod util;

pub use config::{AppConfig, BotConfig, Config, FoundryConfig};
pub use error::{Error, Result};
pub use llm::{ChatCompletion, ChatMessage, ChatModel, ChatRole, FoundryClient, TokenUsage};
pub use safety::{ContentSafetyClient, SafetyAnalyzer, SafetyGate, SafetyThreshold, SafetyVerdict};
pub use session::{ChatSession, SessionRegistry, SessionSettings, SessionStatistics};
