//! Inbound command handling.
//!
//! A single `/start` command with a static greeting. The listener long-polls
//! `getUpdates` as an independent task; it shares only the Telegram client
//! with the relay loop and touches no relay state.

use serde_json::Value;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::notify::TelegramClient;

/// Reply to `/start`.
pub const START_GREETING: &str = "Привет! Я бот, который отправляет новые заявки в этот чат.";

/// Long-poll timeout passed to `getUpdates`.
const POLL_TIMEOUT_SECS: u64 = 30;
/// Delay before retrying after a failed poll.
const RETRY_DELAY_SECS: u64 = 5;

/// Returns the reply for a message text, if it is a recognized command.
///
/// Commands may carry a `@botname` suffix and trailing arguments; both are
/// ignored when matching.
pub fn command_reply(text: &str) -> Option<&'static str> {
    let first_token = text.trim().split_whitespace().next()?;
    let command = first_token.split('@').next().unwrap_or(first_token);
    match command {
        "/start" => Some(START_GREETING),
        _ => None,
    }
}

/// Runs the command listener until the token is cancelled.
///
/// Poll failures are logged and retried; the listener never gives up while
/// the process is running.
pub async fn run_listener(client: TelegramClient, shutdown: CancellationToken) {
    let mut offset: i64 = 0;
    info!("command listener started");

    loop {
        let body = serde_json::json!({
            "offset": offset,
            "timeout": POLL_TIMEOUT_SECS,
            "allowed_updates": ["message"],
        });

        let data = tokio::select! {
            _ = shutdown.cancelled() => break,
            result = client.call("getUpdates", &body) => match result {
                Ok(data) => data,
                Err(error) => {
                    warn!(error = %error, "getUpdates failed; retrying");
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(Duration::from_secs(RETRY_DELAY_SECS)) => {}
                    }
                    continue;
                }
            },
        };

        let updates = data
            .get("result")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        for update in updates {
            if let Some(update_id) = update.get("update_id").and_then(Value::as_i64) {
                offset = offset.max(update_id + 1);
            }

            let Some(message) = update.get("message") else {
                continue;
            };
            let chat_id = message
                .get("chat")
                .and_then(|chat| chat.get("id"))
                .and_then(Value::as_i64);
            let text = message.get("text").and_then(Value::as_str).unwrap_or("");

            let (Some(chat_id), Some(reply)) = (chat_id, command_reply(text)) else {
                continue;
            };

            let body = serde_json::json!({
                "chat_id": chat_id,
                "text": reply,
            });
            if let Err(error) = client.call("sendMessage", &body).await {
                warn!(chat_id, error = %error, "failed to answer command");
            }
        }
    }

    info!("command listener stopped");
}
