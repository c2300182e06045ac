//! Error types for foundry-teams

use thiserror::Error;

/// Errors from the Teams surface
#[derive(Error, Debug)]
pub enum TeamsError {
    #[error(transparent)]
    Core(#[from] foundry_core::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Connector API error: {0}")]
    Connector(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Activity missing field: {0}")]
    MissingField(&'static str),

    #[error("Server error: {0}")]
    Server(String),
}

/// Result type alias for foundry-teams
pub type Result<T> = std::result::Result<T, TeamsError>;
