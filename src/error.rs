//! Error types for the content broker.

use crate::provider::ProviderError;
use thiserror::Error;

/// Main error type for broker operations.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Subscription already exists: {0}")]
    Conflict(String),

    #[error("Unknown request type: {0}")]
    UnknownRequest(String),

    #[error("Content generation failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unable to start content stream: {0}")]
    Spawn(#[source] std::io::Error),
}

impl From<serde_json::Error> for StreamError {
    fn from(e: serde_json::Error) -> Self {
        StreamError::Serialization(e.to_string())
    }
}

/// Result type for broker operations.
pub type Result<T> = std::result::Result<T, StreamError>;
