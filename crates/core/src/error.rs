//! Error taxonomy for registry and configuration operations

use std::path::PathBuf;
use thiserror::Error;

/// Result type for core operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// An event or command referenced a folder that is not registered.
    #[error("unknown folder '{0}'")]
    UnknownFolder(String),

    #[error("folder '{0}' is already being monitored")]
    DuplicateName(String),

    #[error("folder '{0}' not found")]
    NotFound(String),

    /// One persisted folder entry is malformed; the rest of the store is usable.
    #[error("invalid configuration for folder '{name}': {reason}")]
    Config { name: String, reason: String },

    /// The store as a whole cannot be read or parsed.
    #[error("configuration store {} is unreadable: {reason}", path.display())]
    Store { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub fn config(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::Config {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    pub fn store(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Store {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
