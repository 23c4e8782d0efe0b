//! reqwest-backed [`Notifier`]

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::debug;

use crate::{Backend, Body, NotifyFailure, Notifier, OutboundRequest, Result};

/// Default bound on a single delivery attempt.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Longest response body kept in an error message.
const MAX_ERROR_BODY: usize = 512;

/// Sends notifications over HTTP, one request per call, no retries.
#[derive(Debug, Clone)]
pub struct HttpNotifier {
    client: Client,
    timeout: Duration,
}

impl HttpNotifier {
    pub fn new() -> reqwest::Result<Self> {
        Self::with_timeout(DEFAULT_SEND_TIMEOUT)
    }

    /// Build a notifier whose every request is bounded by `timeout`.
    ///
    /// Fails if the HTTP client cannot be constructed (e.g. TLS backend init).
    pub fn with_timeout(timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("settle/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, timeout })
    }

    async fn execute(&self, request: OutboundRequest) -> std::result::Result<(), NotifyFailure> {
        let mut builder = self.client.request(request.method, request.url);
        for (name, value) in request.headers {
            builder = builder.header(name, value);
        }
        builder = match request.body {
            Body::Text(text) => builder
                .header(CONTENT_TYPE, "text/plain; charset=utf-8")
                .body(text),
            Body::Json(value) => builder.json(&value),
            Body::Form(fields) => builder.form(&fields),
        };

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                NotifyFailure::Timeout(self.timeout)
            } else {
                NotifyFailure::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let mut body = response.text().await.unwrap_or_default();
        if body.len() > MAX_ERROR_BODY {
            let mut cut = MAX_ERROR_BODY;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }
        Err(NotifyFailure::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn send(&self, backend: &Backend, title: &str, message: &str) -> Result<()> {
        let request = backend.request(title, message)?;
        debug!(backend = %backend.kind(), url = %request.url.path(), "sending notification");
        self.execute(request)
            .await
            .map_err(|cause| backend.error(cause))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        BackendKind, DiscordConfig, GotifyConfig, MatrixConfig, NtfyConfig, PushoverConfig,
        TelegramConfig,
    };
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_ntfy_delivery() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/alerts")
                    .header("title", "Sync Complete")
                    .header("tags", "sync,complete")
                    .body("Sync complete for docs");
                then.status(200);
            })
            .await;

        let backend = Backend::Ntfy(NtfyConfig {
            topic: "alerts".to_string(),
            server: server.base_url(),
        });
        HttpNotifier::new()
            .unwrap()
            .send(&backend, "Sync Complete", "Sync complete for docs")
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_pushover_form_delivery() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/1/messages.json")
                    .x_www_form_urlencoded_tuple("token", "app")
                    .x_www_form_urlencoded_tuple("user", "key")
                    .x_www_form_urlencoded_tuple("message", "done");
                then.status(200).json_body(json!({"status": 1}));
            })
            .await;

        let backend = Backend::Pushover(PushoverConfig {
            api_token: "app".to_string(),
            user_key: "key".to_string(),
            api_url: server.base_url(),
        });
        HttpNotifier::new()
            .unwrap()
            .send(&backend, "Sync Complete", "done")
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_discord_json_delivery() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/api/webhooks/1/abc").json_body(json!({
                    "content": "done",
                    "embeds": [{"title": "Sync Complete", "color": 5814783}]
                }));
                then.status(204);
            })
            .await;

        let backend = Backend::Discord(DiscordConfig::new(server.url("/api/webhooks/1/abc")));
        HttpNotifier::new()
            .unwrap()
            .send(&backend, "Sync Complete", "done")
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_telegram_delivery() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/bot123:ABC/sendMessage").json_body(json!({
                    "chat_id": "42",
                    "text": "*Sync Complete*\ndone",
                    "parse_mode": "Markdown"
                }));
                then.status(200).json_body(json!({"ok": true}));
            })
            .await;

        let backend = Backend::Telegram(TelegramConfig {
            bot_token: "123:ABC".to_string(),
            chat_id: "42".to_string(),
            api_url: server.base_url(),
        });
        HttpNotifier::new()
            .unwrap()
            .send(&backend, "Sync Complete", "done")
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_gotify_delivery() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/message")
                    .header("x-gotify-key", "apptoken")
                    .json_body(json!({"message": "done", "title": "Sync Complete", "priority": 5}));
                then.status(200);
            })
            .await;

        let backend = Backend::Gotify(GotifyConfig::new(server.base_url(), "apptoken"));
        HttpNotifier::new()
            .unwrap()
            .send(&backend, "Sync Complete", "done")
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_matrix_delivery() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(PUT)
                    .path_contains("/_matrix/client/v3/rooms/")
                    .path_contains("/send/m.room.message/")
                    .header("authorization", "Bearer secret");
                then.status(200).json_body(json!({"event_id": "$abc"}));
            })
            .await;

        let backend = Backend::Matrix(MatrixConfig::new(server.base_url(), "secret", "!room:example.org"));
        HttpNotifier::new()
            .unwrap()
            .send(&backend, "Sync Complete", "done")
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/message");
                then.status(401).body("invalid token");
            })
            .await;

        let backend = Backend::Gotify(GotifyConfig::new(server.base_url(), "bad"));
        let err = HttpNotifier::new()
            .unwrap()
            .send(&backend, "Sync Complete", "done")
            .await
            .unwrap_err();

        assert_eq!(err.backend, BackendKind::Gotify);
        assert_eq!(
            err.cause,
            NotifyFailure::Status {
                status: 401,
                body: "invalid token".to_string()
            }
        );
    }

    #[test]
    fn test_client_carries_requested_timeout() {
        let notifier = HttpNotifier::with_timeout(Duration::from_secs(3)).unwrap();
        assert_eq!(notifier.timeout, Duration::from_secs(3));
        assert_eq!(HttpNotifier::new().unwrap().timeout, DEFAULT_SEND_TIMEOUT);
    }

    #[tokio::test]
    async fn test_timeout_is_reported() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/slow");
                then.status(200).delay(Duration::from_secs(2));
            })
            .await;

        let backend = Backend::Ntfy(NtfyConfig {
            topic: "slow".to_string(),
            server: server.base_url(),
        });
        let notifier = HttpNotifier::with_timeout(Duration::from_millis(200)).unwrap();
        let err = notifier.send(&backend, "t", "m").await.unwrap_err();

        assert_eq!(err.cause, NotifyFailure::Timeout(Duration::from_millis(200)));
    }

    #[tokio::test]
    async fn test_invalid_config_makes_no_request() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.any_request();
                then.status(200);
            })
            .await;

        let backend = Backend::Ntfy(NtfyConfig {
            topic: String::new(),
            server: server.base_url(),
        });
        let err = HttpNotifier::new().unwrap().send(&backend, "t", "m").await.unwrap_err();

        assert!(matches!(err.cause, NotifyFailure::InvalidConfig(_)));
        assert_eq!(mock.hits_async().await, 0);
    }
}
