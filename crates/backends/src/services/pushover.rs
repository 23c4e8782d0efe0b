//! Pushover message API.

use serde::{Deserialize, Serialize};

use crate::request::{join_url, require, Body, OutboundRequest};
use crate::NotifyFailure;

const DEFAULT_API_URL: &str = "https://api.pushover.net";

/// Pushover destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushoverConfig {
    /// Application API token.
    pub api_token: String,
    /// User or group key.
    pub user_key: String,
    /// API base URL (default: https://api.pushover.net).
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

impl PushoverConfig {
    pub fn new(api_token: impl Into<String>, user_key: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            user_key: user_key.into(),
            api_url: default_api_url(),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), NotifyFailure> {
        require("api_token", &self.api_token)?;
        require("user_key", &self.user_key)?;
        join_url(&self.api_url, &["1"]).map(|_| ())
    }

    pub(crate) fn request(&self, title: &str, message: &str) -> Result<OutboundRequest, NotifyFailure> {
        self.validate()?;
        let url = join_url(&self.api_url, &["1", "messages.json"])?;
        Ok(OutboundRequest::post(
            url,
            Body::Form(vec![
                ("token", self.api_token.clone()),
                ("user", self.user_key.clone()),
                ("message", message.to_string()),
                ("title", title.to_string()),
            ]),
        ))
    }

    pub(crate) fn destination(&self) -> String {
        "pushover".to_string()
    }
}
