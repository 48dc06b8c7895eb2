//! Relay loop tests against in-memory collaborators.

use std::collections::VecDeque;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;

use crate::ledger::{Ledger, LedgerError};
use crate::notify::{Notifier, NotifyError};
use crate::source::RequestSource;
use crate::types::{RawRequest, Request, RequestId};

use super::{Relay, RelayConfig};

/// Replays scripted batches, one per cycle; empty once the script runs out.
#[derive(Clone, Default)]
struct ScriptedSource {
    batches: Arc<Mutex<VecDeque<Vec<RawRequest>>>>,
}

impl ScriptedSource {
    fn new(batches: Vec<Vec<RawRequest>>) -> Self {
        ScriptedSource {
            batches: Arc::new(Mutex::new(batches.into())),
        }
    }
}

impl RequestSource for ScriptedSource {
    async fn fetch_batch(&self) -> Vec<RawRequest> {
        self.batches.lock().unwrap().pop_front().unwrap_or_default()
    }
}

/// Records sent texts; can be scripted to fail the next N sends.
#[derive(Clone, Default)]
struct RecordingNotifier {
    sent: Arc<Mutex<Vec<String>>>,
    failures_remaining: Arc<Mutex<usize>>,
}

impl RecordingNotifier {
    fn fail_next(&self, count: usize) {
        *self.failures_remaining.lock().unwrap() = count;
    }

    fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        {
            let mut failures = self.failures_remaining.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(NotifyError::Api {
                    code: Some(502),
                    description: "scripted failure".to_string(),
                });
            }
        }
        self.sent.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// In-memory ledger with switches for simulating storage faults.
#[derive(Clone, Default)]
struct MemoryLedger {
    rows: Arc<Mutex<HashMap<i64, Request>>>,
    fail_contains: Arc<Mutex<bool>>,
    report_unseen: Arc<Mutex<bool>>,
}

impl MemoryLedger {
    fn set_fail_contains(&self, fail: bool) {
        *self.fail_contains.lock().unwrap() = fail;
    }

    /// Makes `contains` always answer false, bypassing the loop's pre-check
    /// so the insert-time duplicate constraint can be exercised.
    fn set_report_unseen(&self, unseen: bool) {
        *self.report_unseen.lock().unwrap() = unseen;
    }

    fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    fn seed(&self, request: Request) {
        self.rows.lock().unwrap().insert(request.id.0, request);
    }
}

impl Ledger for MemoryLedger {
    async fn contains(&self, id: RequestId) -> Result<bool, LedgerError> {
        if *self.fail_contains.lock().unwrap() {
            return Err(LedgerError::Storage(sqlx::Error::PoolTimedOut));
        }
        if *self.report_unseen.lock().unwrap() {
            return Ok(false);
        }
        Ok(self.rows.lock().unwrap().contains_key(&id.0))
    }

    async fn insert(&self, request: &Request) -> Result<(), LedgerError> {
        match self.rows.lock().unwrap().entry(request.id.0) {
            Entry::Occupied(_) => Err(LedgerError::Duplicate(request.id)),
            Entry::Vacant(slot) => {
                slot.insert(request.clone());
                Ok(())
            }
        }
    }
}

fn raw(id: i64) -> RawRequest {
    RawRequest {
        id: Some(id),
        name: Some(format!("name-{id}")),
        contact: Some(format!("contact-{id}")),
        text: Some(format!("text-{id}")),
        datetime: Some("2023-10-01 12:00:00".to_string()),
    }
}

fn relay(
    source: ScriptedSource,
    notifier: RecordingNotifier,
    ledger: MemoryLedger,
) -> Relay<ScriptedSource, RecordingNotifier, MemoryLedger> {
    Relay::new(source, notifier, ledger, RelayConfig::new())
}

#[tokio::test]
async fn same_batch_twice_sends_once() {
    let source = ScriptedSource::new(vec![vec![raw(1)], vec![raw(1)]]);
    let notifier = RecordingNotifier::default();
    let ledger = MemoryLedger::default();
    let relay = relay(source, notifier.clone(), ledger.clone());

    let first = relay.run_cycle().await;
    assert_eq!(first.forwarded, 1);
    assert!(ledger.contains(RequestId(1)).await.unwrap());

    let second = relay.run_cycle().await;
    assert_eq!(second.forwarded, 0);
    assert_eq!(second.skipped_seen, 1);

    assert_eq!(notifier.sent().len(), 1);
}

#[tokio::test]
async fn malformed_record_is_isolated() {
    let malformed = RawRequest {
        id: Some(2),
        name: None,
        ..raw(2)
    };
    let source = ScriptedSource::new(vec![vec![malformed, raw(3)]]);
    let notifier = RecordingNotifier::default();
    let ledger = MemoryLedger::default();
    let relay = relay(source, notifier.clone(), ledger.clone());

    let stats = relay.run_cycle().await;

    assert_eq!(stats.skipped_malformed, 1);
    assert_eq!(stats.forwarded, 1);
    assert_eq!(notifier.sent().len(), 1);
    assert!(!ledger.contains(RequestId(2)).await.unwrap());
    assert!(ledger.contains(RequestId(3)).await.unwrap());
}

#[tokio::test]
async fn missing_name_batch_sends_nothing() {
    let malformed = RawRequest {
        id: Some(2),
        name: None,
        ..raw(2)
    };
    let source = ScriptedSource::new(vec![vec![malformed]]);
    let notifier = RecordingNotifier::default();
    let ledger = MemoryLedger::default();
    let relay = relay(source, notifier.clone(), ledger.clone());

    relay.run_cycle().await;

    assert!(notifier.sent().is_empty());
    assert!(!ledger.contains(RequestId(2)).await.unwrap());
}

#[tokio::test]
async fn send_failure_leaves_request_for_retry() {
    let source = ScriptedSource::new(vec![vec![raw(1)], vec![raw(1)]]);
    let notifier = RecordingNotifier::default();
    notifier.fail_next(1);
    let ledger = MemoryLedger::default();
    let relay = relay(source, notifier.clone(), ledger.clone());

    let first = relay.run_cycle().await;
    assert_eq!(first.send_failures, 1);
    assert_eq!(first.forwarded, 0);
    assert!(!ledger.contains(RequestId(1)).await.unwrap());

    let second = relay.run_cycle().await;
    assert_eq!(second.forwarded, 1);
    assert_eq!(notifier.sent().len(), 1);
    assert!(ledger.contains(RequestId(1)).await.unwrap());
}

#[tokio::test]
async fn empty_batch_processes_nothing() {
    // An exhausted script behaves like a fetch failure: empty batch.
    let source = ScriptedSource::default();
    let notifier = RecordingNotifier::default();
    let ledger = MemoryLedger::default();
    let relay = relay(source, notifier.clone(), ledger.clone());

    let stats = relay.run_cycle().await;

    assert_eq!(stats.fetched, 0);
    assert!(notifier.sent().is_empty());
    assert_eq!(ledger.len(), 0);
}

#[tokio::test]
async fn duplicate_id_within_batch_is_caught_by_ledger() {
    // Records are processed strictly in order, so the first occurrence is
    // recorded before the second is checked.
    let source = ScriptedSource::new(vec![vec![raw(5), raw(5)]]);
    let notifier = RecordingNotifier::default();
    let ledger = MemoryLedger::default();
    let relay = relay(source, notifier.clone(), ledger.clone());

    let stats = relay.run_cycle().await;

    assert_eq!(stats.forwarded, 1);
    assert_eq!(stats.skipped_seen, 1);
    assert_eq!(notifier.sent().len(), 1);
}

#[tokio::test]
async fn ledger_read_failure_skips_record_without_insert() {
    let source = ScriptedSource::new(vec![vec![raw(1)], vec![raw(1)]]);
    let notifier = RecordingNotifier::default();
    let ledger = MemoryLedger::default();
    ledger.set_fail_contains(true);
    let relay = relay(source, notifier.clone(), ledger.clone());

    let first = relay.run_cycle().await;
    assert_eq!(first.storage_failures, 1);
    assert_eq!(first.forwarded, 0);
    assert!(notifier.sent().is_empty());
    assert_eq!(ledger.len(), 0);

    // Storage recovers; the same record is retried and delivered.
    ledger.set_fail_contains(false);
    let second = relay.run_cycle().await;
    assert_eq!(second.forwarded, 1);
    assert_eq!(notifier.sent().len(), 1);
}

#[tokio::test]
async fn duplicate_insert_is_treated_as_sent() {
    let source = ScriptedSource::new(vec![vec![raw(9)]]);
    let notifier = RecordingNotifier::default();
    let ledger = MemoryLedger::default();
    ledger.seed(Request::try_from_raw(&raw(9)).unwrap());
    // Bypass the pre-check so the insert hits the duplicate constraint.
    ledger.set_report_unseen(true);
    let relay = relay(source, notifier.clone(), ledger.clone());

    let stats = relay.run_cycle().await;

    // The send happened (accepted at-least-once behavior) and the duplicate
    // insert was swallowed rather than escalated.
    assert_eq!(stats.forwarded, 1);
    assert_eq!(stats.storage_failures, 0);
    assert_eq!(notifier.sent().len(), 1);
}

#[tokio::test]
async fn notification_text_uses_fixed_layout() {
    let source = ScriptedSource::new(vec![vec![raw(1)]]);
    let notifier = RecordingNotifier::default();
    let relay = relay(source, notifier.clone(), MemoryLedger::default());

    relay.run_cycle().await;

    assert_eq!(
        notifier.sent()[0],
        "Новая заявка:\n\
         Имя: name-1\n\
         Контактные данные: contact-1\n\
         Текст заявки: text-1\n\
         Дата и время: 2023-10-01 12:00:00"
    );
}

#[tokio::test]
async fn run_stops_on_cancellation() {
    let source = ScriptedSource::new(vec![vec![raw(1)]]);
    let notifier = RecordingNotifier::default();
    let relay = relay(source, notifier.clone(), MemoryLedger::default());

    // The loop always finishes the in-progress cycle before observing
    // cancellation at the inter-cycle delay.
    let shutdown = CancellationToken::new();
    shutdown.cancel();
    relay.run(shutdown).await;

    assert_eq!(notifier.sent().len(), 1);
}
