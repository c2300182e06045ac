//! foundry-teams: Microsoft Teams surface for the AI Foundry assistant
//!
//! Bot Framework activity handling, Connector replies, Adaptive Cards,
//! and the HTTP endpoint Teams delivers messages to.

pub mod bot;
pub mod cards;
pub mod connector;
pub mod error;
pub mod server;
pub mod types;

pub use bot::{BotReply, TeamsBot};
pub use cards::CardInfo;
pub use connector::ConnectorClient;
pub use error::{Result, TeamsError};
pub use server::{AppState, start_server};
