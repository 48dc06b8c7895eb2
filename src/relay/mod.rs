//! The dedup relay loop.
//!
//! Repeatedly fetches the candidate batch, filters it against the ledger,
//! forwards unseen requests, and records them, with a fixed delay between
//! cycles. The loop is a single sequential task: cycle N+1 never starts
//! before cycle N's delay completes, which serializes all ledger access.

mod config;
#[allow(clippy::module_inception)]
mod relay;

#[cfg(test)]
mod tests;

pub use config::RelayConfig;
pub use relay::{CycleStats, Relay};
