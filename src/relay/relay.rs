//! The fetch-filter-forward-record cycle.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::ledger::{Ledger, LedgerError};
use crate::notify::{Notifier, format_notification};
use crate::source::RequestSource;
use crate::types::Request;

use super::RelayConfig;

/// Outcome counters for one relay cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleStats {
    /// Raw records returned by the source.
    pub fetched: usize,
    /// Requests sent this cycle (including any whose ledger insert failed).
    pub forwarded: usize,
    /// Requests skipped because the ledger already contained their id.
    pub skipped_seen: usize,
    /// Raw records rejected for a missing required field.
    pub skipped_malformed: usize,
    /// Send attempts that failed; these requests stay unrecorded.
    pub send_failures: usize,
    /// Ledger reads/writes that failed mid-cycle.
    pub storage_failures: usize,
}

/// The dedup relay: polls the source and forwards unseen requests.
///
/// Generic over its three collaborators so the loop can be exercised in
/// tests with in-memory implementations.
pub struct Relay<S, N, L> {
    source: S,
    notifier: N,
    ledger: L,
    config: RelayConfig,
}

impl<S, N, L> Relay<S, N, L>
where
    S: RequestSource,
    N: Notifier,
    L: Ledger,
{
    pub fn new(source: S, notifier: N, ledger: L, config: RelayConfig) -> Self {
        Relay {
            source,
            notifier,
            ledger,
            config,
        }
    }

    /// Runs cycles until the token is cancelled.
    ///
    /// Cancellation is observed at the inter-cycle delay, so an in-progress
    /// cycle always completes; the loop never overlaps itself.
    #[instrument(skip_all)]
    pub async fn run(&self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.config.poll_interval.as_secs(),
            "relay loop started"
        );

        loop {
            let stats = self.run_cycle().await;
            debug!(
                fetched = stats.fetched,
                forwarded = stats.forwarded,
                skipped_seen = stats.skipped_seen,
                skipped_malformed = stats.skipped_malformed,
                send_failures = stats.send_failures,
                storage_failures = stats.storage_failures,
                "cycle complete"
            );

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }

        info!("relay loop stopped");
    }

    /// Executes one fetch-and-forward cycle.
    ///
    /// Per record, in source order:
    /// 1. Validate required fields; malformed records are skipped and never
    ///    recorded, so the source re-offers them next cycle.
    /// 2. Skip ids the ledger already contains. A ledger read failure skips
    ///    the record (retried next cycle) without ending the cycle.
    /// 3. Format and send. A send failure leaves the request unrecorded for
    ///    retry next cycle.
    /// 4. Record in the ledger only after the send succeeded. A crash
    ///    between send and insert duplicates the notification on the next
    ///    run (accepted at-least-once behavior).
    pub async fn run_cycle(&self) -> CycleStats {
        let batch = self.source.fetch_batch().await;
        let mut stats = CycleStats {
            fetched: batch.len(),
            ..CycleStats::default()
        };

        for raw in &batch {
            let request = match Request::try_from_raw(raw) {
                Ok(request) => request,
                Err(error) => {
                    warn!(error = %error, "skipping malformed request");
                    stats.skipped_malformed += 1;
                    continue;
                }
            };

            match self.ledger.contains(request.id).await {
                Ok(true) => {
                    stats.skipped_seen += 1;
                    continue;
                }
                Ok(false) => {}
                Err(error) => {
                    warn!(id = %request.id, error = %error, "ledger check failed; will retry next cycle");
                    stats.storage_failures += 1;
                    continue;
                }
            }

            let text = format_notification(&request);
            if let Err(error) = self.notifier.send(&text).await {
                warn!(id = %request.id, error = %error, "send failed; will retry next cycle");
                stats.send_failures += 1;
                continue;
            }
            stats.forwarded += 1;

            match self.ledger.insert(&request).await {
                Ok(()) => {
                    info!(id = %request.id, "request forwarded");
                }
                Err(LedgerError::Duplicate(id)) => {
                    // The contains pre-check makes this unreachable in normal
                    // operation; treat as already sent either way.
                    warn!(id = %id, "request already recorded; treating as sent");
                }
                Err(error) => {
                    // Sent but not recorded: the next cycle re-sends it.
                    warn!(id = %request.id, error = %error, "failed to record forwarded request");
                    stats.storage_failures += 1;
                }
            }
        }

        stats
    }
}
