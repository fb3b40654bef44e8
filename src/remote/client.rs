//! Blocking HTTP client for the Telegram Bot API.

use super::{BotUser, RemoteApi, Update, WebhookInfo};
use crate::error::{Error, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Response envelope shared by every Bot API method.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error_code: Option<i64>,
}

/// Bot API client bound to one token.
///
/// Every request carries the agent-wide timeout, so a hung connection
/// becomes an [`Error::Remote`] rather than stalling startup.
pub struct TelegramApi {
    agent: ureq::Agent,
    base_url: String,
    token: String,
}

impl TelegramApi {
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("pollguard/", env!("CARGO_PKG_VERSION")))
            .build();

        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    /// Strip the token from any text that may echo the request URL.
    fn redact(&self, text: &str) -> String {
        if self.token.is_empty() {
            text.to_string()
        } else {
            text.replace(&self.token, "<redacted>")
        }
    }

    fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        debug!(method, "calling bot API");

        let response = match self.agent.post(&self.method_url(method)).send_json(params) {
            Ok(response) => response,
            // The API reports failures as JSON with a non-2xx status.
            Err(ureq::Error::Status(_, response)) => response,
            Err(e) => {
                return Err(Error::Remote(format!(
                    "{} request failed: {}",
                    method,
                    self.redact(&e.to_string())
                )));
            }
        };

        let status = response.status();
        let envelope: ApiResponse<T> = response.into_json().map_err(|e| {
            Error::Remote(format!(
                "{} returned an unreadable response (HTTP {}): {}",
                method,
                status,
                self.redact(&e.to_string())
            ))
        })?;

        interpret(method, envelope)
    }
}

fn interpret<T>(method: &str, envelope: ApiResponse<T>) -> Result<T> {
    if !envelope.ok {
        return Err(Error::Remote(format!(
            "{} failed ({}): {}",
            method,
            envelope
                .error_code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "no code".to_string()),
            envelope
                .description
                .unwrap_or_else(|| "no description".to_string())
        )));
    }

    envelope
        .result
        .ok_or_else(|| Error::Remote(format!("{} returned ok without a result", method)))
}

impl fmt::Debug for TelegramApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramApi")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl RemoteApi for TelegramApi {
    fn delete_webhook(&self) -> Result<()> {
        // Pending updates are handled by the drain step, not dropped here.
        let _: bool = self.call("deleteWebhook", json!({ "drop_pending_updates": false }))?;
        Ok(())
    }

    fn get_updates(&self, offset: i64, limit: u32) -> Result<Vec<Update>> {
        self.call(
            "getUpdates",
            json!({ "offset": offset, "limit": limit, "timeout": 0 }),
        )
    }

    fn webhook_info(&self) -> Result<WebhookInfo> {
        self.call("getWebhookInfo", json!({}))
    }

    fn get_me(&self) -> Result<BotUser> {
        self.call("getMe", json!({}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api() -> TelegramApi {
        TelegramApi::new(
            "https://api.example.test/",
            "123456:SECRET",
            Duration::from_secs(1),
        )
    }

    #[test]
    fn test_method_url_trims_trailing_slash() {
        assert_eq!(
            api().method_url("getMe"),
            "https://api.example.test/bot123456:SECRET/getMe"
        );
    }

    #[test]
    fn test_redact_hides_token() {
        let message = api().redact("https://api.example.test/bot123456:SECRET/getMe: Connection Failed");
        assert!(!message.contains("SECRET"));
        assert!(message.contains("<redacted>"));
    }

    #[test]
    fn test_debug_hides_token() {
        let debug = format!("{:?}", api());
        assert!(!debug.contains("SECRET"));
    }

    #[test]
    fn test_interpret_success() {
        let envelope: ApiResponse<bool> =
            serde_json::from_str(r#"{"ok": true, "result": true, "description": "Webhook is already deleted"}"#)
                .unwrap();
        assert!(interpret("deleteWebhook", envelope).unwrap());
    }

    #[test]
    fn test_interpret_api_error() {
        let envelope: ApiResponse<Vec<Update>> = serde_json::from_str(
            r#"{"ok": false, "error_code": 409, "description": "Conflict: can't use getUpdates method while webhook is active"}"#,
        )
        .unwrap();
        let err = interpret("getUpdates", envelope).unwrap_err();
        assert!(matches!(err, Error::Remote(_)));
        assert!(err.to_string().contains("409"));
        assert!(err.to_string().contains("webhook is active"));
    }

    #[test]
    fn test_interpret_ok_without_result() {
        let envelope: ApiResponse<WebhookInfo> = serde_json::from_str(r#"{"ok": true}"#).unwrap();
        assert!(interpret("getWebhookInfo", envelope).is_err());
    }

    #[test]
    fn test_updates_ignore_unknown_fields() {
        let envelope: ApiResponse<Vec<Update>> = serde_json::from_str(
            r#"{"ok": true, "result": [{"update_id": 7, "message": {"text": "hi"}}, {"update_id": 8}]}"#,
        )
        .unwrap();
        let updates = interpret("getUpdates", envelope).unwrap();
        assert_eq!(
            updates.iter().map(|u| u.update_id).collect::<Vec<_>>(),
            vec![7, 8]
        );
    }

    #[test]
    fn test_unreachable_host_is_remote_error_without_token() {
        // Port 9 on localhost is reserved (discard) and normally closed.
        let api = TelegramApi::new("http://127.0.0.1:9", "42:TOPSECRET", Duration::from_millis(500));
        let err = api.get_me().unwrap_err();
        assert!(matches!(err, Error::Remote(_)));
        assert!(!err.to_string().contains("TOPSECRET"));
    }
}
