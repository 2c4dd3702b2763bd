//! Request log storage subsystem.
//!
//! # Data Flow
//! ```text
//! POST request (forwarding engine)
//!     → RequestLog::record (never fails the caller)
//!     → LogStore::insert (serialized, assigns next id)
//!     → background trim (coalesced, keeps newest MAX_LOG_RECORDS)
//!
//! Management endpoints
//!     → RequestLog::list_newest / count / clear (errors surfaced)
//! ```
//!
//! # Design Decisions
//! - Storage is injected as `Arc<dyn LogStore>`: memory for tests, SQLite in production
//! - Every mutation (insert, clear, trim) is mutually exclusive with the others
//! - Ids are never reused, not even after a clear

pub mod memory;
pub mod record;
pub mod sqlite;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::observability::metrics;

pub use memory::MemoryLogStore;
pub use record::{LogRecord, NewLogRecord, Payload};
pub use sqlite::SqliteLogStore;

/// Maximum number of records retained.
pub const MAX_LOG_RECORDS: usize = 1000;

/// Errors raised by a log store backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("log storage unavailable: {0}")]
    Database(#[from] sqlx::Error),

    #[error("log storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("log record {id} is corrupt: {reason}")]
    Corrupt { id: i64, reason: String },
}

/// Durable, concurrent-safe storage of request log records.
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Persist `record`, returning its newly assigned id.
    async fn insert(&self, record: NewLogRecord) -> Result<i64, StoreError>;

    /// Up to `limit` records, newest (highest id) first.
    async fn list_newest(&self, limit: usize) -> Result<Vec<LogRecord>, StoreError>;

    /// Number of records currently stored.
    async fn count(&self) -> Result<u64, StoreError>;

    /// Delete every record, returning how many were removed.
    async fn clear(&self) -> Result<u64, StoreError>;

    /// Delete all but the newest `keep` records, returning how many were removed.
    async fn trim(&self, keep: usize) -> Result<u64, StoreError>;
}

/// Front of the log store used by the rest of the proxy.
///
/// Enforces the retention cap with a background trim after each insert.
#[derive(Clone)]
pub struct RequestLog {
    store: Arc<dyn LogStore>,
    trim_pending: Arc<AtomicBool>,
}

impl RequestLog {
    pub fn new(store: Arc<dyn LogStore>) -> Self {
        Self {
            store,
            trim_pending: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Record a POST request. Failures are logged and swallowed.
    pub async fn record(&self, record: NewLogRecord) -> Option<i64> {
        let endpoint = record.endpoint.clone();
        match self.store.insert(record).await {
            Ok(id) => {
                tracing::debug!(id, endpoint = %endpoint, "Request logged");
                metrics::record_log_write(true);
                self.schedule_trim();
                Some(id)
            }
            Err(e) => {
                tracing::error!(endpoint = %endpoint, error = %e, "Failed to log request");
                metrics::record_log_write(false);
                None
            }
        }
    }

    /// Newest records first, capped at [`MAX_LOG_RECORDS`].
    pub async fn list_newest(&self, limit: usize) -> Result<Vec<LogRecord>, StoreError> {
        self.store.list_newest(limit.min(MAX_LOG_RECORDS)).await
    }

    pub async fn count(&self) -> Result<u64, StoreError> {
        self.store.count().await
    }

    pub async fn clear(&self) -> Result<u64, StoreError> {
        let deleted = self.store.clear().await?;
        tracing::info!(deleted, "Request log cleared");
        Ok(deleted)
    }

    /// Run a trim immediately on the caller's task.
    pub async fn trim_now(&self) -> Result<u64, StoreError> {
        self.store.trim(MAX_LOG_RECORDS).await
    }

    fn schedule_trim(&self) {
        // A trim is already queued; it will see this insert.
        if self.trim_pending.swap(true, Ordering::AcqRel) {
            return;
        }

        let store = Arc::clone(&self.store);
        let pending = Arc::clone(&self.trim_pending);
        tokio::spawn(async move {
            pending.store(false, Ordering::Release);
            match store.trim(MAX_LOG_RECORDS).await {
                Ok(0) => {}
                Ok(removed) => {
                    tracing::debug!(removed, "Trimmed request log");
                    metrics::record_log_trim(removed);
                }
                Err(e) => tracing::warn!(error = %e, "Failed to trim request log"),
            }
        });
    }
}
