// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

use crate::types::ItemId;

#[derive(Error, Debug)]
pub enum SensorError {
    /// The watched namespace could not be enumerated. The tick aborts and the
    /// snapshot is left untouched.
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    /// One item's payload could not be loaded. Isolated to that item.
    #[error("Payload error for {id}: {reason}")]
    PayloadError { id: ItemId, reason: String },

    /// A commit raced with another committer (stale version or held lock).
    /// The caller retries the whole tick against a fresh `load()`.
    #[error("Cursor store conflict: {0}")]
    StoreConflict(String),

    #[error("Cursor store error: {0}")]
    Store(String),

    #[error("Trigger delivery failed: {0}")]
    Delivery(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SensorError {
    pub fn payload(id: &ItemId, reason: impl Into<String>) -> Self {
        SensorError::PayloadError {
            id: id.clone(),
            reason: reason.into(),
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SensorError>;
