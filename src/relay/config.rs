//! Relay loop configuration.

use std::time::Duration;

/// Default inter-cycle delay (5 seconds).
const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Configuration for the relay loop.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Delay between the end of one cycle and the start of the next.
    pub poll_interval: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RelayConfig {
    /// Creates a config with the default interval.
    pub fn new() -> Self {
        RelayConfig {
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
        }
    }

    /// Sets the inter-cycle delay.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}
