//! Gotify application message API.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::request::{join_url, require, Body, OutboundRequest};
use crate::NotifyFailure;

const MESSAGE_PRIORITY: u8 = 5;

/// Gotify destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GotifyConfig {
    /// Gotify server URL.
    pub server: String,
    /// Application token.
    pub token: String,
}

impl GotifyConfig {
    pub fn new(server: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            token: token.into(),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), NotifyFailure> {
        require("server", &self.server)?;
        require("token", &self.token)?;
        join_url(&self.server, &["message"]).map(|_| ())
    }

    pub(crate) fn request(&self, title: &str, message: &str) -> Result<OutboundRequest, NotifyFailure> {
        self.validate()?;
        let url = join_url(&self.server, &["message"])?;
        let payload = json!({
            "message": message,
            "title": title,
            "priority": MESSAGE_PRIORITY,
        });
        Ok(OutboundRequest::post(url, Body::Json(payload)).header("X-Gotify-Key", self.token.clone()))
    }

    pub(crate) fn destination(&self) -> String {
        self.server.trim_end_matches('/').to_string()
    }
}
