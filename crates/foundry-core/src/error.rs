//! Error types for foundry-core

use thiserror::Error;

/// Main error type for foundry-core
#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Azure OpenAI API error: {0}")]
    Api(String),

    #[error("content safety API error: {0}")]
    ContentSafety(String),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for foundry-core
pub type Result<T> = std::result::Result<T, Error>;
