//! Backend-independent description of one outbound HTTP call

use crate::NotifyFailure;
use reqwest::{Method, Url};

/// A fully built request, ready to hand to an HTTP client.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(&'static str, String)>,
    pub body: Body,
}

/// Request payload encodings used by the supported services.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// `text/plain` body (ntfy)
    Text(String),
    /// JSON body
    Json(serde_json::Value),
    /// `application/x-www-form-urlencoded` body (Pushover)
    Form(Vec<(&'static str, String)>),
}

impl OutboundRequest {
    pub fn post(url: Url, body: Body) -> Self {
        Self {
            method: Method::POST,
            url,
            headers: Vec::new(),
            body,
        }
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    /// Look up a header value by name (case-insensitive).
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Parse a service base URL and append percent-encoded path segments.
///
/// Trailing slashes on `base` are ignored, so `https://ntfy.sh/` and
/// `https://ntfy.sh` produce the same result.
pub fn join_url(base: &str, segments: &[&str]) -> Result<Url, NotifyFailure> {
    let mut url = parse_url(base.trim_end_matches('/'))?;
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| NotifyFailure::InvalidConfig(format!("'{base}' cannot be a base URL")))?;
        path.pop_if_empty();
        path.extend(segments);
    }
    Ok(url)
}

/// Parse an absolute http(s) URL.
pub fn parse_url(raw: &str) -> Result<Url, NotifyFailure> {
    let url = Url::parse(raw)
        .map_err(|e| NotifyFailure::InvalidConfig(format!("invalid URL '{raw}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(NotifyFailure::InvalidConfig(format!(
            "unsupported URL scheme '{other}' in '{raw}'"
        ))),
    }
}

/// Fail with `InvalidConfig` when a required field is blank.
pub(crate) fn require(field: &str, value: &str) -> Result<(), NotifyFailure> {
    if value.trim().is_empty() {
        Err(NotifyFailure::InvalidConfig(format!("{field} must not be empty")))
    } else {
        Ok(())
    }
}
