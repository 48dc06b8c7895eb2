//! Telegram Bot API client and notifier.
//!
//! [`TelegramClient`] wraps a `reqwest::Client` plus the bot token and is
//! shared by the notifier and the command listener. It is cheap to clone and
//! safe for concurrent use, which is the only state the two tasks share.

use std::time::Duration;

use serde_json::Value;
use tracing::warn;

use super::{Notifier, NotifyError};

const DEFAULT_API_BASE: &str = "https://api.telegram.org";
const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;
// Must exceed the long-poll timeout used by the command listener.
const HTTP_REQUEST_TIMEOUT_SECS: u64 = 60;

/// A Telegram Bot API client bound to one bot token.
#[derive(Clone)]
pub struct TelegramClient {
    client: reqwest::Client,
    api_base: String,
    token: String,
}

impl TelegramClient {
    /// Creates a client with connect/request timeouts set.
    pub fn new(token: impl Into<String>) -> Self {
        let client = match reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS))
            .build()
        {
            Ok(client) => client,
            Err(error) => {
                warn!(error = %error, "failed to build Telegram HTTP client with timeouts; falling back to defaults");
                reqwest::Client::new()
            }
        };

        TelegramClient {
            client,
            api_base: DEFAULT_API_BASE.to_string(),
            token: token.into(),
        }
    }

    /// Overrides the API base URL. Used by tests to point at a local server.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    /// Calls a Bot API method and returns the decoded response on success.
    ///
    /// A response is successful only when the HTTP status is 2xx and the
    /// body carries `"ok": true`; anything else becomes [`NotifyError::Api`]
    /// with the API's `error_code` and `description` when available.
    pub async fn call(&self, method: &str, body: &Value) -> Result<Value, NotifyError> {
        let response = self
            .client
            .post(self.api_url(method))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let body_text = response.text().await?;
        let data: Value = serde_json::from_str(&body_text).unwrap_or(Value::Null);

        let ok = data.get("ok").and_then(Value::as_bool).unwrap_or(false);
        if status.is_success() && ok {
            return Ok(data);
        }

        let code = data
            .get("error_code")
            .and_then(Value::as_i64)
            .or(Some(i64::from(status.as_u16())));
        let description = data
            .get("description")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .unwrap_or(body_text);

        Err(NotifyError::Api { code, description })
    }
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Token deliberately omitted.
        f.debug_struct("TelegramClient")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

/// Sends relay notifications to one configured chat.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    client: TelegramClient,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(client: TelegramClient, chat_id: impl Into<String>) -> Self {
        TelegramNotifier {
            client,
            chat_id: chat_id.into(),
        }
    }
}

impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        let body = serde_json::json!({
            "chat_id": self.chat_id,
            "text": text,
        });
        self.client.call("sendMessage", &body).await?;
        Ok(())
    }
}
