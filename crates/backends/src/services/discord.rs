//! Discord webhook.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::request::{parse_url, require, Body, OutboundRequest};
use crate::NotifyFailure;

/// Embed accent color.
const EMBED_COLOR: u32 = 5814783;

/// Discord destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscordConfig {
    /// Full webhook URL including id and token.
    pub webhook_url: String,
}

impl DiscordConfig {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            webhook_url: webhook_url.into(),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), NotifyFailure> {
        require("webhook_url", &self.webhook_url)?;
        parse_url(&self.webhook_url).map(|_| ())
    }

    pub(crate) fn request(&self, title: &str, message: &str) -> Result<OutboundRequest, NotifyFailure> {
        require("webhook_url", &self.webhook_url)?;
        let url = parse_url(&self.webhook_url)?;
        let payload = json!({
            "content": message,
            "embeds": [{
                "title": title,
                "color": EMBED_COLOR,
            }]
        });
        Ok(OutboundRequest::post(url, Body::Json(payload)))
    }

    pub(crate) fn destination(&self) -> String {
        match parse_url(&self.webhook_url) {
            Ok(url) => format!("discord webhook @ {}", url.host_str().unwrap_or("?")),
            Err(_) => "discord webhook".to_string(),
        }
    }
}
