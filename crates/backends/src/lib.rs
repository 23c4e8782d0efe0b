//! Notification delivery backends for settle
//!
//! This crate provides:
//! - The closed set of supported services (ntfy, Pushover, Discord,
//!   Telegram, Gotify, Matrix) as one tagged [`Backend`] enum
//! - A pure mapping from a rendered message to one outbound HTTP request
//! - The [`Notifier`] capability and its reqwest-based implementation

pub mod backend;
pub mod error;
pub mod http;
pub mod request;
pub mod services;

// Re-exports
pub use backend::{Backend, BackendKind};
pub use error::{NotifyError, NotifyFailure};
pub use http::{HttpNotifier, DEFAULT_SEND_TIMEOUT};
pub use request::{Body, OutboundRequest};
pub use services::{
    DiscordConfig, GotifyConfig, MatrixConfig, NtfyConfig, PushoverConfig, TelegramConfig,
};

use async_trait::async_trait;

/// Result type for notification delivery
pub type Result<T> = std::result::Result<T, NotifyError>;

/// Delivers one rendered message through a backend.
///
/// Implementations perform at most one outbound call per invocation and
/// never retry; the caller decides what a failure means.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, backend: &Backend, title: &str, message: &str) -> Result<()>;
}
