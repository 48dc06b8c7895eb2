//! SQLite-backed ledger.
//!
//! A single table keyed by request id. The full record is retained for audit
//! even though the id alone would suffice for dedup. The schema is created
//! idempotently on every open, so a fresh deployment and a restart follow the
//! same path.

use std::path::Path;
use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

use super::{Ledger, LedgerError};
use crate::types::{Request, RequestId};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS requests (
  id INTEGER PRIMARY KEY,
  name TEXT,
  contact TEXT,
  text TEXT,
  datetime TEXT
)
"#;

/// A ledger stored in a SQLite database file.
#[derive(Clone)]
pub struct SqliteLedger {
    pool: SqlitePool,
}

impl SqliteLedger {
    /// Opens (or creates) the ledger at the given path and ensures the schema
    /// exists.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let opts =
            SqliteConnectOptions::from_str(&format!("sqlite://{}?mode=rwc", path.as_ref().display()))?
                .journal_mode(SqliteJournalMode::Wal)
                .create_if_missing(true);
        Self::from_options(opts).await
    }

    /// Opens an in-memory ledger. Used by tests.
    pub async fn open_in_memory() -> Result<Self, LedgerError> {
        Self::from_options(SqliteConnectOptions::from_str("sqlite::memory:")?).await
    }

    async fn from_options(opts: SqliteConnectOptions) -> Result<Self, LedgerError> {
        // One connection: the relay loop is the only writer, and a single
        // connection keeps an in-memory database from being dropped between
        // pool checkouts.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await?;

        sqlx::query(SCHEMA).execute(&pool).await?;

        Ok(SqliteLedger { pool })
    }
}

impl Ledger for SqliteLedger {
    async fn contains(&self, id: RequestId) -> Result<bool, LedgerError> {
        let row = sqlx::query("SELECT id FROM requests WHERE id = ?1")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn insert(&self, request: &Request) -> Result<(), LedgerError> {
        let result = sqlx::query(
            "INSERT INTO requests (id, name, contact, text, datetime) VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(request.id.0)
        .bind(&request.name)
        .bind(&request.contact)
        .bind(&request.text)
        .bind(&request.datetime)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(LedgerError::Duplicate(request.id))
            }
            Err(error) => Err(LedgerError::Storage(error)),
        }
    }
}

impl std::fmt::Debug for SqliteLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteLedger").finish_non_exhaustive()
    }
}
