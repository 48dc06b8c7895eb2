//! Environment-based configuration.
//!
//! All settings come from environment variables, read once at startup.
//! The three credentials/endpoints are required; their absence is a fatal
//! startup error (the process exits before the relay loop starts).

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Bot credential for the Telegram API.
pub const ENV_TELEGRAM_TOKEN: &str = "TELEGRAM_TOKEN";
/// Destination chat for forwarded requests.
pub const ENV_TELEGRAM_CHAT_ID: &str = "TELEGRAM_CHAT_ID";
/// Source endpoint returning the JSON array of requests.
pub const ENV_API_URL: &str = "API_URL";
/// Optional inter-cycle delay in seconds.
pub const ENV_POLL_INTERVAL_SECS: &str = "REQUEST_RELAY_POLL_INTERVAL_SECS";
/// Optional path to the SQLite ledger database.
pub const ENV_DB_PATH: &str = "REQUEST_RELAY_DB_PATH";

const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
const DEFAULT_DB_PATH: &str = "requests.db";

/// Errors raised while reading configuration. Always fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("required environment variable `{0}` is not set")]
    MissingVar(&'static str),

    #[error("environment variable `{name}` has invalid value `{value}`")]
    InvalidVar { name: &'static str, value: String },
}

/// Process configuration, constructed once in `main` and shared from there.
#[derive(Debug, Clone)]
pub struct Config {
    /// Telegram bot token.
    pub telegram_token: String,

    /// Chat that receives forwarded requests.
    pub telegram_chat_id: String,

    /// URL of the site API returning candidate requests.
    pub api_url: String,

    /// Delay between relay cycles. Default: 5 seconds.
    pub poll_interval: Duration,

    /// Path to the SQLite ledger. Default: `requests.db`.
    pub db_path: PathBuf,
}

impl Config {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads configuration through a lookup function (injectable for tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let require = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::MissingVar(name))
        };

        let telegram_token = require(ENV_TELEGRAM_TOKEN)?;
        let telegram_chat_id = require(ENV_TELEGRAM_CHAT_ID)?;
        let api_url = require(ENV_API_URL)?;

        let poll_interval_secs = match lookup(ENV_POLL_INTERVAL_SECS) {
            Some(value) => value.parse::<u64>().map_err(|_| ConfigError::InvalidVar {
                name: ENV_POLL_INTERVAL_SECS,
                value,
            })?,
            None => DEFAULT_POLL_INTERVAL_SECS,
        };

        let db_path = lookup(ENV_DB_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));

        Ok(Config {
            telegram_token,
            telegram_chat_id,
            api_url,
            poll_interval: Duration::from_secs(poll_interval_secs),
            db_path,
        })
    }
}
