//! Outbound notification delivery.
//!
//! The relay loop consumes notifications through the [`Notifier`] trait: one
//! `send` operation, any failure non-fatal to the loop. The production
//! implementation is [`TelegramNotifier`], which posts `sendMessage` to the
//! Telegram Bot API.

use std::future::Future;

use thiserror::Error;

pub mod format;
pub mod telegram;

pub use format::format_notification;
pub use telegram::{TelegramClient, TelegramNotifier};

/// Errors raised while delivering a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The request never completed (connect error, timeout, broken body).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered but rejected the call.
    #[error("telegram api error (code={code:?}): {description}")]
    Api {
        code: Option<i64>,
        description: String,
    },
}

/// Delivers a formatted notification to the destination chat.
pub trait Notifier {
    /// Sends one notification. Failures are reported, not retried here: the
    /// relay loop leaves the request unrecorded and retries it next cycle.
    fn send(&self, text: &str) -> impl Future<Output = Result<(), NotifyError>> + Send;
}
