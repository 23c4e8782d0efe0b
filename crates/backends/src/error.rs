//! Delivery error types

use crate::BackendKind;
use std::time::Duration;
use thiserror::Error;

/// A failed send, tagged with the backend that produced it.
#[derive(Debug, Clone, Error)]
#[error("{backend} notification failed: {cause}")]
pub struct NotifyError {
    pub backend: BackendKind,
    pub cause: NotifyFailure,
}

impl NotifyError {
    pub fn new(backend: BackendKind, cause: NotifyFailure) -> Self {
        Self { backend, cause }
    }
}

/// Why a send failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifyFailure {
    /// Missing or malformed credentials / destination; no request was made.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The service answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),
}
