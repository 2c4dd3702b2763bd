//! In-memory log store.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::store::record::{LogRecord, NewLogRecord};
use crate::store::{LogStore, StoreError};

#[derive(Debug)]
struct Inner {
    next_id: i64,
    /// Oldest first.
    records: VecDeque<LogRecord>,
}

/// Log store kept in process memory.
#[derive(Debug)]
pub struct MemoryLogStore {
    inner: RwLock<Inner>,
}

impl MemoryLogStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                next_id: 1,
                records: VecDeque::new(),
            }),
        }
    }
}

impl Default for MemoryLogStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LogStore for MemoryLogStore {
    async fn insert(&self, record: NewLogRecord) -> Result<i64, StoreError> {
        let mut inner = self.inner.write().await;
        let id = inner.next_id;
        inner.next_id += 1;
        inner.records.push_back(record.with_id(id));
        Ok(id)
    }

    async fn list_newest(&self, limit: usize) -> Result<Vec<LogRecord>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.records.iter().rev().take(limit).cloned().collect())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.inner.read().await.records.len() as u64)
    }

    async fn clear(&self) -> Result<u64, StoreError> {
        let mut inner = self.inner.write().await;
        let deleted = inner.records.len() as u64;
        inner.records.clear();
        Ok(deleted)
    }

    async fn trim(&self, keep: usize) -> Result<u64, StoreError> {
        let mut inner = self.inner.write().await;
        let excess = inner.records.len().saturating_sub(keep);
        inner.records.drain(..excess);
        Ok(excess as u64)
    }
}
