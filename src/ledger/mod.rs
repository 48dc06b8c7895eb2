//! Durable ledger of forwarded requests.
//!
//! The ledger is the dedup set: a request id present in the ledger has
//! already been forwarded and must not be sent again. Entries are created
//! only after a send succeeds, never updated, never deleted.
//!
//! The [`Ledger`] trait is the seam between the relay loop and storage.
//! Production uses [`SqliteLedger`]; tests use in-memory implementations.
//!
//! # Example (mock for testing)
//!
//! ```ignore
//! #[derive(Clone, Default)]
//! struct MemoryLedger {
//!     rows: Arc<Mutex<HashMap<i64, Request>>>,
//! }
//!
//! impl Ledger for MemoryLedger {
//!     async fn contains(&self, id: RequestId) -> Result<bool, LedgerError> {
//!         Ok(self.rows.lock().unwrap().contains_key(&id.0))
//!     }
//!
//!     async fn insert(&self, request: &Request) -> Result<(), LedgerError> {
//!         match self.rows.lock().unwrap().entry(request.id.0) {
//!             Entry::Occupied(_) => Err(LedgerError::Duplicate(request.id)),
//!             Entry::Vacant(slot) => {
//!                 slot.insert(request.clone());
//!                 Ok(())
//!             }
//!         }
//!     }
//! }
//! ```

use std::future::Future;

use thiserror::Error;

use crate::types::{Request, RequestId};

pub mod sqlite;

pub use sqlite::SqliteLedger;

/// Errors raised by ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The backing store could not be read or written.
    ///
    /// This is a true access failure, distinguishable from "id not present"
    /// (which `contains` reports as `Ok(false)`).
    #[error("ledger storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// An entry with this id already exists.
    ///
    /// The relay loop's `contains` pre-check makes this unreachable in normal
    /// operation; the constraint protects the invariant if the pre-check is
    /// skipped or raced.
    #[error("request {0} is already recorded in the ledger")]
    Duplicate(RequestId),
}

/// Persistent set of request ids that have already been forwarded.
pub trait Ledger {
    /// Returns whether an entry with this id exists.
    fn contains(&self, id: RequestId) -> impl Future<Output = Result<bool, LedgerError>> + Send;

    /// Appends a new entry. Fails with [`LedgerError::Duplicate`] if the id
    /// is already recorded.
    fn insert(&self, request: &Request) -> impl Future<Output = Result<(), LedgerError>> + Send;
}
