//! Telegram adapter (reqwest + axum).
//!
//! `HttpTransport` implements the `tgkit-core` Transport port over the Bot API's
//! JSON endpoints. `webhook` and `polling` feed inbound updates into the core
//! dispatcher; `router` wires both from `Config`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

pub mod polling;
pub mod router;
pub mod webhook;

use tgkit_core::{config::Config, errors::Error, transport::Transport, Result};

#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpTransport {
    pub fn new(api_url: &str, token: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Transport(format!("http client: {e}")))?;

        Ok(Self {
            client,
            base_url: format!("{}/bot{token}", api_url.trim_end_matches('/')),
            token: token.to_string(),
        })
    }

    /// Client timeout leaves headroom over the long-poll timeout.
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let timeout = cfg.http_timeout.max(cfg.poll_timeout + Duration::from_secs(10));
        Self::new(&cfg.telegram_api_url, &cfg.telegram_bot_token, timeout)
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/{method}", self.base_url)
    }

    /// reqwest errors embed the request URL, which carries the token.
    fn map_err(&self, method: &str, e: reqwest::Error) -> Error {
        let msg = e.to_string().replace(&self.token, "<token>");
        Error::Transport(format!("{method}: {msg}"))
    }
}

#[derive(Deserialize)]
struct Envelope {
    ok: bool,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error_code: Option<i64>,
}

/// Unwrap a Bot API response body into its `result`.
pub fn parse_envelope(method: &str, status: u16, body: &[u8]) -> Result<Value> {
    let env: Envelope = serde_json::from_slice(body).map_err(|e| {
        Error::Transport(format!(
            "{method}: unexpected response (HTTP {status}): {e}"
        ))
    })?;

    if !env.ok {
        let code = env.error_code.unwrap_or(i64::from(status));
        let description = env
            .description
            .unwrap_or_else(|| "no description".to_string());
        return Err(Error::Transport(format!(
            "{method} failed ({code}): {description}"
        )));
    }

    env.result
        .ok_or_else(|| Error::Transport(format!("{method}: ok response without result")))
}

#[async_trait]
impl Transport for HttpTransport {
    async fn call(&self, method: &str, body: Value) -> Result<Value> {
        let resp = self
            .client
            .post(self.endpoint(method))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_err(method, e))?;

        let status = resp.status().as_u16();
        let bytes = resp.bytes().await.map_err(|e| self.map_err(method, e))?;
        let result = parse_envelope(method, status, &bytes);
        if let Err(e) = &result {
            tracing::debug!(method, status, error = %e, "bot api call failed");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn endpoint_includes_token_and_method() {
        let t = HttpTransport::new("https://api.telegram.org/", "123:abc", Duration::from_secs(5))
            .unwrap();
        assert_eq!(
            t.endpoint("sendMessage"),
            "https://api.telegram.org/bot123:abc/sendMessage"
        );
    }

    #[test]
    fn ok_envelope_yields_result() {
        let v = parse_envelope("getMe", 200, br#"{"ok":true,"result":{"id":1}}"#).unwrap();
        assert_eq!(v, json!({ "id": 1 }));
    }

    #[test]
    fn error_envelope_is_a_transport_failure() {
        let err = parse_envelope(
            "sendMessage",
            400,
            br#"{"ok":false,"error_code":400,"description":"Bad Request: chat not found"}"#,
        )
        .unwrap_err();
        match err {
            Error::Transport(msg) => {
                assert!(msg.contains("sendMessage failed (400)"));
                assert!(msg.contains("chat not found"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn non_json_body_is_a_transport_failure() {
        let err = parse_envelope("getMe", 502, b"<html>Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, Error::Transport(_)));

        let err = parse_envelope("getMe", 200, br#"{"ok":true}"#).unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }
}
