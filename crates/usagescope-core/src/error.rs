//! Error types for UsageScope

use thiserror::Error;

/// Result type alias using UsageScope's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for UsageScope operations
#[derive(Error, Debug)]
pub enum Error {
    /// A required form field failed local validation
    #[error("{0}")]
    Validation(String),

    /// The backend rejected or failed the request; carries the backend's
    /// message or a generic fallback
    #[error("{0}")]
    Request(String),

    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Terminal error
    #[error("Terminal error: {0}")]
    Tui(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a request error
    pub fn request(msg: impl Into<String>) -> Self {
        Self::Request(msg.into())
    }
}
