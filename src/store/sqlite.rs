//! SQLite event store
//!
//! Durable backend behind the `sqlite` feature flag. Schema is created on
//! connect; sequence numbers come from the rowid, so they match the
//! in-memory backend's contract (start at 1, strictly increasing).

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::{debug, info};

use super::backend::{EventStore, StoredEvent};
use super::error::{StoreError, StoreResult};
use crate::event::{parse_event_timestamp, EventRecord};

const SCHEMA_SQL: [&str; 2] = [
    r"CREATE TABLE IF NOT EXISTS events (
        sequence INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp TEXT NOT NULL,
        object_id TEXT NOT NULL,
        read_increment INTEGER NOT NULL,
        size_gb REAL NOT NULL,
        recency_days INTEGER NOT NULL,
        latency_requirement_ms INTEGER NOT NULL,
        cost_per_gb REAL NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_events_object_id ON events (object_id)",
];

/// SQLite-backed append-only event store.
#[derive(Debug, Clone)]
pub struct SqliteEventStore {
    pool: SqlitePool,
}

impl SqliteEventStore {
    /// Connect to the given database URL and create the schema if needed.
    ///
    /// # Errors
    /// Returns [`StoreError::Connection`] if the connection fails and
    /// [`StoreError::Query`] if schema creation fails.
    ///
    /// # Panics
    /// Panics if `url` is empty.
    pub async fn new(url: &str) -> StoreResult<Self> {
        assert!(!url.is_empty(), "database url must not be empty");

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .map_err(|e| StoreError::connection(e.to_string()))?;

        let store = Self::from_pool(pool).await?;
        info!(url, "sqlite event store ready");
        Ok(store)
    }

    /// Wrap an existing pool, creating the schema if needed.
    ///
    /// # Errors
    /// Returns [`StoreError::Query`] if schema creation fails.
    pub async fn from_pool(pool: SqlitePool) -> StoreResult<Self> {
        for statement in SCHEMA_SQL {
            sqlx::query(statement)
                .execute(&pool)
                .await
                .map_err(|e| StoreError::query(e.to_string()))?;
        }
        Ok(Self { pool })
    }
}

fn row_to_stored(row: &SqliteRow) -> StoreResult<StoredEvent> {
    let sequence: i64 = row
        .try_get("sequence")
        .map_err(|e| StoreError::query(e.to_string()))?;
    let raw_timestamp: String = row
        .try_get("timestamp")
        .map_err(|e| StoreError::query(e.to_string()))?;
    let timestamp = parse_event_timestamp(&raw_timestamp).ok_or_else(|| {
        StoreError::internal(format!("unparseable stored timestamp: {raw_timestamp}"))
    })?;

    let object_id: String = row
        .try_get("object_id")
        .map_err(|e| StoreError::query(e.to_string()))?;
    let read_increment: i64 = row
        .try_get("read_increment")
        .map_err(|e| StoreError::query(e.to_string()))?;
    let size_gb: f64 = row
        .try_get("size_gb")
        .map_err(|e| StoreError::query(e.to_string()))?;
    let recency_days: i64 = row
        .try_get("recency_days")
        .map_err(|e| StoreError::query(e.to_string()))?;
    let latency_requirement_ms: i64 = row
        .try_get("latency_requirement_ms")
        .map_err(|e| StoreError::query(e.to_string()))?;
    let cost_per_gb: f64 = row
        .try_get("cost_per_gb")
        .map_err(|e| StoreError::query(e.to_string()))?;

    Ok(StoredEvent {
        sequence: u64::try_from(sequence).unwrap_or(0),
        event: EventRecord::new(
            timestamp,
            object_id,
            u64::try_from(read_increment).unwrap_or(0),
            size_gb,
            u64::try_from(recency_days).unwrap_or(0),
            u64::try_from(latency_requirement_ms).unwrap_or(0),
            cost_per_gb,
        ),
    })
}

#[async_trait]
impl EventStore for SqliteEventStore {
    #[tracing::instrument(skip(self, event), fields(object_id = %event.object_id))]
    async fn append(&self, event: &EventRecord) -> StoreResult<u64> {
        event.validate()?;

        let result = sqlx::query(
            "INSERT INTO events \
             (timestamp, object_id, read_increment, size_gb, recency_days, \
              latency_requirement_ms, cost_per_gb) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(event.timestamp.to_rfc3339())
        .bind(&event.object_id)
        .bind(i64::try_from(event.read_increment).unwrap_or(i64::MAX))
        .bind(event.size_gb)
        .bind(i64::try_from(event.recency_days).unwrap_or(i64::MAX))
        .bind(i64::try_from(event.latency_requirement_ms).unwrap_or(i64::MAX))
        .bind(event.cost_per_gb)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::query(e.to_string()))?;

        let sequence = u64::try_from(result.last_insert_rowid()).unwrap_or(0);
        debug!(sequence, "event appended");
        Ok(sequence)
    }

    async fn object_ids(&self) -> StoreResult<Vec<String>> {
        let rows = sqlx::query("SELECT DISTINCT object_id FROM events ORDER BY object_id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::query(e.to_string()))?;

        rows.iter()
            .map(|row| {
                row.try_get("object_id")
                    .map_err(|e| StoreError::query(e.to_string()))
            })
            .collect()
    }

    async fn events_for(&self, object_id: &str) -> StoreResult<Vec<StoredEvent>> {
        let rows = sqlx::query("SELECT * FROM events WHERE object_id = ? ORDER BY sequence")
            .bind(object_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::query(e.to_string()))?;

        rows.iter().map(row_to_stored).collect()
    }

    async fn latest_records(&self) -> StoreResult<HashMap<String, StoredEvent>> {
        let rows = sqlx::query(
            "SELECT e.* FROM events e \
             JOIN (SELECT object_id, MAX(sequence) AS max_seq FROM events GROUP BY object_id) m \
             ON e.object_id = m.object_id AND e.sequence = m.max_seq",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::query(e.to_string()))?;

        let mut latest = HashMap::with_capacity(rows.len());
        for row in &rows {
            let stored = row_to_stored(row)?;
            latest.insert(stored.event.object_id.clone(), stored);
        }
        Ok(latest)
    }

    async fn history_snapshot(&self) -> StoreResult<BTreeMap<String, Vec<StoredEvent>>> {
        let rows = sqlx::query("SELECT * FROM events ORDER BY object_id, sequence")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::query(e.to_string()))?;

        let mut snapshot: BTreeMap<String, Vec<StoredEvent>> = BTreeMap::new();
        for row in &rows {
            let stored = row_to_stored(row)?;
            snapshot
                .entry(stored.event.object_id.clone())
                .or_default()
                .push(stored);
        }
        Ok(snapshot)
    }

    async fn event_count(&self) -> StoreResult<usize> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM events")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::query(e.to_string()))?;

        let count: i64 = row
            .try_get("count")
            .map_err(|e| StoreError::query(e.to_string()))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

// =============================================================================
// Tests
// =============================================================================
