//! The closed set of notification services

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::services::{
    DiscordConfig, GotifyConfig, MatrixConfig, NtfyConfig, PushoverConfig, TelegramConfig,
};
use crate::{NotifyError, NotifyFailure, OutboundRequest};

/// A notification service together with its destination parameters.
///
/// Persisted as `{"type": "<kind>", "config": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "config", rename_all = "lowercase")]
pub enum Backend {
    Ntfy(NtfyConfig),
    Pushover(PushoverConfig),
    Discord(DiscordConfig),
    Telegram(TelegramConfig),
    Gotify(GotifyConfig),
    Matrix(MatrixConfig),
}

/// Backend discriminant, used in logs and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Ntfy,
    Pushover,
    Discord,
    Telegram,
    Gotify,
    Matrix,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ntfy => "ntfy",
            Self::Pushover => "pushover",
            Self::Discord => "discord",
            Self::Telegram => "telegram",
            Self::Gotify => "gotify",
            Self::Matrix => "matrix",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Backend {
    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Ntfy(_) => BackendKind::Ntfy,
            Self::Pushover(_) => BackendKind::Pushover,
            Self::Discord(_) => BackendKind::Discord,
            Self::Telegram(_) => BackendKind::Telegram,
            Self::Gotify(_) => BackendKind::Gotify,
            Self::Matrix(_) => BackendKind::Matrix,
        }
    }

    /// Check that required credentials and URLs are present and well formed.
    pub fn validate(&self) -> Result<(), NotifyError> {
        let checked = match self {
            Self::Ntfy(c) => c.validate(),
            Self::Pushover(c) => c.validate(),
            Self::Discord(c) => c.validate(),
            Self::Telegram(c) => c.validate(),
            Self::Gotify(c) => c.validate(),
            Self::Matrix(c) => c.validate(),
        };
        checked.map_err(|cause| self.error(cause))
    }

    /// Build the single outbound request that delivers `message`.
    pub fn request(&self, title: &str, message: &str) -> Result<OutboundRequest, NotifyError> {
        let built = match self {
            Self::Ntfy(c) => c.request(title, message),
            Self::Pushover(c) => c.request(title, message),
            Self::Discord(c) => c.request(title, message),
            Self::Telegram(c) => c.request(title, message),
            Self::Gotify(c) => c.request(title, message),
            Self::Matrix(c) => c.request(title, message),
        };
        built.map_err(|cause| self.error(cause))
    }

    /// Human-readable destination for status output. Never includes secrets.
    pub fn destination(&self) -> String {
        match self {
            Self::Ntfy(c) => c.destination(),
            Self::Pushover(c) => c.destination(),
            Self::Discord(c) => c.destination(),
            Self::Telegram(c) => c.destination(),
            Self::Gotify(c) => c.destination(),
            Self::Matrix(c) => c.destination(),
        }
    }

    pub fn error(&self, cause: NotifyFailure) -> NotifyError {
        NotifyError::new(self.kind(), cause)
    }
}
