//! Per-service destination parameters and wire formats.
//!
//! Each service maps `(title, message)` to exactly one [`OutboundRequest`]:
//! - ntfy: topic push with a plain-text body
//! - Pushover: form-encoded message API
//! - Discord: webhook POST with an embed
//! - Telegram: Bot API `sendMessage`
//! - Gotify: application message API
//! - Matrix: client-server `m.room.message` event
//!
//! [`OutboundRequest`]: crate::OutboundRequest

mod discord;
mod gotify;
mod matrix;
mod ntfy;
mod pushover;
mod telegram;

pub use discord::DiscordConfig;
pub use gotify::GotifyConfig;
pub use matrix::MatrixConfig;
pub use ntfy::NtfyConfig;
pub use pushover::PushoverConfig;
pub use telegram::TelegramConfig;
