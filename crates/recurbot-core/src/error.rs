//! Error types shared by every Recurbot crate.

use thiserror::Error;

/// Errors surfaced by the registry, scheduler, gateway and config layers.
#[derive(Debug, Error)]
pub enum RecurbotError {
    /// The key-value store failed or returned data that does not decode.
    #[error("Store error: {0}")]
    Store(String),

    /// The messaging gateway could not be reached or answered garbage.
    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RecurbotError>;
