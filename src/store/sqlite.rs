//! SQLite-backed log store.
//!
//! Records live in a single `request_logs` table keyed by an
//! `AUTOINCREMENT` id, so ids are never reused. The database runs in WAL
//! mode: readers see a consistent snapshot while a write is in progress.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tokio::sync::Mutex;

use crate::store::record::{LogRecord, NewLogRecord, Payload};
use crate::store::{LogStore, StoreError};

const CREATE_TABLE: &str = "
CREATE TABLE IF NOT EXISTS request_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    endpoint TEXT NOT NULL,
    payload TEXT,
    payload_kind TEXT,
    headers TEXT NOT NULL,
    remote_addr TEXT NOT NULL,
    user_agent TEXT
)";

const CREATE_TIMESTAMP_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_request_logs_timestamp ON request_logs(timestamp DESC)";

#[derive(Debug, sqlx::FromRow)]
struct LogRow {
    id: i64,
    timestamp: String,
    endpoint: String,
    payload: Option<String>,
    payload_kind: Option<String>,
    headers: String,
    remote_addr: String,
    user_agent: Option<String>,
}

impl TryFrom<LogRow> for LogRecord {
    type Error = StoreError;

    fn try_from(row: LogRow) -> Result<Self, Self::Error> {
        let payload = match (row.payload_kind.as_deref(), row.payload) {
            (Some(kind), Some(stored)) => Some(
                Payload::from_stored(kind, stored)
                    .map_err(|reason| StoreError::Corrupt { id: row.id, reason })?,
            ),
            _ => None,
        };

        Ok(LogRecord {
            id: row.id,
            timestamp: row.timestamp,
            endpoint: row.endpoint,
            payload,
            headers: row.headers,
            remote_addr: row.remote_addr,
            user_agent: row.user_agent,
        })
    }
}

/// Log store persisted to a SQLite database file.
pub struct SqliteLogStore {
    pool: SqlitePool,
    /// Serializes insert, clear and trim.
    write_lock: Mutex<()>,
}

impl SqliteLogStore {
    /// Open (creating if needed) the database at `path`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        sqlx::query(CREATE_TABLE).execute(&pool).await?;
        sqlx::query(CREATE_TIMESTAMP_INDEX).execute(&pool).await?;

        tracing::info!(path = %path.display(), "Request log database opened");

        Ok(Self {
            pool,
            write_lock: Mutex::new(()),
        })
    }

    /// Close the connection pool, flushing the WAL.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl LogStore for SqliteLogStore {
    async fn insert(&self, record: NewLogRecord) -> Result<i64, StoreError> {
        let _guard = self.write_lock.lock().await;

        let result = sqlx::query(
            "INSERT INTO request_logs (timestamp, endpoint, payload, payload_kind, headers, remote_addr, user_agent) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&record.timestamp)
        .bind(&record.endpoint)
        .bind(record.payload.as_ref().map(Payload::to_stored))
        .bind(record.payload.as_ref().map(Payload::kind))
        .bind(&record.headers)
        .bind(&record.remote_addr)
        .bind(&record.user_agent)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn list_newest(&self, limit: usize) -> Result<Vec<LogRecord>, StoreError> {
        let rows: Vec<LogRow> = sqlx::query_as(
            "SELECT id, timestamp, endpoint, payload, payload_kind, headers, remote_addr, user_agent \
             FROM request_logs ORDER BY id DESC LIMIT ?1",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(LogRecord::try_from).collect()
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM request_logs")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    async fn clear(&self) -> Result<u64, StoreError> {
        let _guard = self.write_lock.lock().await;
        let result = sqlx::query("DELETE FROM request_logs")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn trim(&self, keep: usize) -> Result<u64, StoreError> {
        let _guard = self.write_lock.lock().await;
        // The subquery yields the newest id that falls outside the window, or NULL.
        let result = sqlx::query(
            "DELETE FROM request_logs WHERE id <= \
             (SELECT id FROM request_logs ORDER BY id DESC LIMIT 1 OFFSET ?1)",
        )
        .bind(keep as i64)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue};
    use serde_json::json;
    use std::sync::Arc;

    fn record(endpoint: &str, payload: Option<Payload>) -> NewLogRecord {
        let mut headers = HeaderMap::new();
        headers.insert("user-agent", HeaderValue::from_static("test-agent/1.0"));
        NewLogRecord::capture(endpoint, payload, &headers, "192.168.1.20:40000")
    }

    #[tokio::test]
    async fn insert_and_list_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteLogStore::open(dir.path().join("logs.db")).await.unwrap();

        let first = store
            .insert(record("/api/widgets", Some(Payload::Json(json!({"a": 1})))))
            .await
            .unwrap();
        let second = store
            .insert(record("/upload", Some(Payload::Text("raw=1".into()))))
            .await
            .unwrap();
        let third = store.insert(record("/empty", None)).await.unwrap();
        assert!(first < second && second < third);

        let records = store.list_newest(10).await.unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].endpoint, "/empty");
        assert_eq!(records[0].payload, None);
        assert_eq!(records[1].payload, Some(Payload::Text("raw=1".into())));
        assert_eq!(records[2].payload, Some(Payload::Json(json!({"a": 1}))));
        assert_eq!(records[2].user_agent.as_deref(), Some("test-agent/1.0"));
        assert_eq!(records[2].remote_addr, "192.168.1.20:40000");
    }

    #[tokio::test]
    async fn records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("logs.db");

        let store = SqliteLogStore::open(&path).await.unwrap();
        store.insert(record("/persisted", None)).await.unwrap();
        store.close().await;

        let reopened = SqliteLogStore::open(&path).await.unwrap();
        assert_eq!(reopened.count().await.unwrap(), 1);
        let next = reopened.insert(record("/after", None)).await.unwrap();
        assert_eq!(next, 2);
    }

    #[tokio::test]
    async fn trim_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteLogStore::open(dir.path().join("logs.db")).await.unwrap();
        for i in 0..12 {
            store.insert(record(&format!("/r/{}", i), None)).await.unwrap();
        }

        assert_eq!(store.trim(20).await.unwrap(), 0);
        assert_eq!(store.trim(5).await.unwrap(), 7);
        assert_eq!(store.trim(5).await.unwrap(), 0);

        let ids: Vec<i64> = store.list_newest(100).await.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![12, 11, 10, 9, 8]);

        assert_eq!(store.clear().await.unwrap(), 5);
        assert_eq!(store.clear().await.unwrap(), 0);
        assert_eq!(store.count().await.unwrap(), 0);
        assert_eq!(store.insert(record("/again", None)).await.unwrap(), 13);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_inserts_are_serialized() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(SqliteLogStore::open(dir.path().join("logs.db")).await.unwrap());

        let mut handles = Vec::new();
        for i in 0..50 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.insert(record(&format!("/p/{}", i), None)).await.unwrap()
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.sort_unstable();
        assert_eq!(ids, (1..=50).collect::<Vec<i64>>());
        assert_eq!(store.count().await.unwrap(), 50);
    }
}
