//! Conversation sessions and their registry

mod chat;
mod registry;

pub use chat::{ChatSession, SessionSettings, SessionStatistics};
pub use registry::SessionRegistry;
