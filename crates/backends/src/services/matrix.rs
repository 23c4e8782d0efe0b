//! Matrix client-server API, `m.room.message` event.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::request::{join_url, require, Body, OutboundRequest};
use crate::NotifyFailure;

/// Matrix destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixConfig {
    /// Homeserver base URL.
    pub homeserver: String,
    /// Access token of the sending account.
    pub access_token: String,
    /// Room ID (e.g. `!abc:example.org`).
    pub room_id: String,
}

impl MatrixConfig {
    pub fn new(
        homeserver: impl Into<String>,
        access_token: impl Into<String>,
        room_id: impl Into<String>,
    ) -> Self {
        Self {
            homeserver: homeserver.into(),
            access_token: access_token.into(),
            room_id: room_id.into(),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), NotifyFailure> {
        require("homeserver", &self.homeserver)?;
        require("access_token", &self.access_token)?;
        require("room_id", &self.room_id)?;
        join_url(&self.homeserver, &["_matrix"]).map(|_| ())
    }

    pub(crate) fn request(&self, title: &str, message: &str) -> Result<OutboundRequest, NotifyFailure> {
        self.validate()?;
        // Each event needs a fresh transaction id; a resend with the same id is deduplicated
        // by the homeserver.
        let txn_id = uuid::Uuid::new_v4().simple().to_string();
        let url = join_url(
            &self.homeserver,
            &[
                "_matrix",
                "client",
                "v3",
                "rooms",
                &self.room_id,
                "send",
                "m.room.message",
                &txn_id,
            ],
        )?;
        let payload = json!({
            "msgtype": "m.text",
            "body": format!("{title}\n{message}"),
            "format": "org.matrix.custom.html",
            "formatted_body": format!("<strong>{title}</strong><br>{message}"),
        });

        let mut req = OutboundRequest::post(url, Body::Json(payload))
            .header("Authorization", format!("Bearer {}", self.access_token));
        req.method = reqwest::Method::PUT;
        Ok(req)
    }

    pub(crate) fn destination(&self) -> String {
        format!("{} {}", self.homeserver.trim_end_matches('/'), self.room_id)
    }
}
