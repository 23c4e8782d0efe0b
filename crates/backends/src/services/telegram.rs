//! Telegram Bot API `sendMessage`.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::request::{join_url, require, Body, OutboundRequest};
use crate::NotifyFailure;

const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Telegram `sendMessage` text limit (characters).
const TELEGRAM_MESSAGE_LIMIT: usize = 4096;

/// Telegram destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot API token.
    pub bot_token: String,
    /// Target chat ID (user, group, or channel).
    pub chat_id: String,
    /// Bot API base URL (default: https://api.telegram.org).
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

impl TelegramConfig {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
            api_url: default_api_url(),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), NotifyFailure> {
        require("bot_token", &self.bot_token)?;
        require("chat_id", &self.chat_id)?;
        join_url(&self.api_url, &["sendMessage"]).map(|_| ())
    }

    pub(crate) fn request(&self, title: &str, message: &str) -> Result<OutboundRequest, NotifyFailure> {
        self.validate()?;
        let method = format!("bot{}", self.bot_token);
        let url = join_url(&self.api_url, &[&method, "sendMessage"])?;
        let text = truncate_message(&format!("*{title}*\n{message}"), TELEGRAM_MESSAGE_LIMIT);
        let payload = json!({
            "chat_id": self.chat_id,
            "text": text,
            "parse_mode": "Markdown",
        });
        Ok(OutboundRequest::post(url, Body::Json(payload)))
    }

    pub(crate) fn destination(&self) -> String {
        format!("telegram chat {}", self.chat_id)
    }
}

/// Truncate a message to fit within the Telegram character limit.
fn truncate_message(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let suffix = "\n\n[truncated]";
    let budget = limit - suffix.len();
    let truncated: String = text.chars().take(budget).collect();
    format!("{truncated}{suffix}")
}
