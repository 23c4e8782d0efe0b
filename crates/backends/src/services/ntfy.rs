//! ntfy topic push.

use serde::{Deserialize, Serialize};

use crate::request::{join_url, parse_url, require, Body, OutboundRequest};
use crate::NotifyFailure;

const DEFAULT_SERVER: &str = "https://ntfy.sh";

/// ntfy destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NtfyConfig {
    /// Topic to publish to.
    pub topic: String,
    /// ntfy server (default: https://ntfy.sh).
    #[serde(default = "default_server")]
    pub server: String,
}

fn default_server() -> String {
    DEFAULT_SERVER.to_string()
}

impl NtfyConfig {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            server: default_server(),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), NotifyFailure> {
        require("topic", &self.topic)?;
        parse_url(self.server.trim_end_matches('/')).map(|_| ())
    }

    pub(crate) fn request(&self, title: &str, message: &str) -> Result<OutboundRequest, NotifyFailure> {
        self.validate()?;
        let url = join_url(&self.server, &[&self.topic])?;
        Ok(OutboundRequest::post(url, Body::Text(message.to_string()))
            .header("Title", title)
            .header("Priority", "default")
            .header("Tags", "sync,complete"))
    }

    pub(crate) fn destination(&self) -> String {
        format!("{}/{}", self.server.trim_end_matches('/'), self.topic)
    }
}
