//! Ingestion - decode telemetry payloads and append them to the store
//!
//! `TigerStyle`: The ingest loop never dies on bad input. Malformed payloads
//! and validation rejects are counted and logged; only the caller shutting
//! the channel stops the loop.

use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::dst::TimeSource;
use crate::event::{parse_event_timestamp, EventRecord, ValidationError};
use crate::store::{EventStore, StoreError};

// =============================================================================
// Wire Payload
// =============================================================================

/// The JSON wire shape of one telemetry event.
///
/// Producers may omit fields; omissions default to zero and a missing or
/// unparseable timestamp falls back to ingest time.
#[derive(Debug, Clone, Deserialize)]
pub struct EventPayload {
    /// Producer timestamp, RFC 3339 or naive ISO-8601
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Object identifier
    #[serde(default)]
    pub object_id: String,
    /// Reads since the previous event
    #[serde(default)]
    pub read_increment: i64,
    /// Object size in gigabytes
    #[serde(default)]
    pub size_gb: f64,
    /// Days since last access
    #[serde(default)]
    pub recency_days: i64,
    /// Required read latency in milliseconds
    #[serde(default)]
    pub latency_requirement_ms: i64,
    /// Storage cost rate per gigabyte
    #[serde(default)]
    pub cost_per_gb: f64,
}

impl EventPayload {
    /// Convert into a validated [`EventRecord`].
    ///
    /// # Errors
    /// Returns [`ValidationError`] for negative counters or any invariant
    /// the record itself rejects.
    pub fn into_record(
        self,
        received_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<EventRecord, ValidationError> {
        let timestamp = self
            .timestamp
            .as_deref()
            .and_then(parse_event_timestamp)
            .unwrap_or(received_at);

        let read_increment = to_counter("read_increment", self.read_increment)?;
        let recency_days = to_counter("recency_days", self.recency_days)?;
        let latency_requirement_ms =
            to_counter("latency_requirement_ms", self.latency_requirement_ms)?;

        let record = EventRecord::new(
            timestamp,
            self.object_id,
            read_increment,
            self.size_gb,
            recency_days,
            latency_requirement_ms,
            self.cost_per_gb,
        );
        record.validate()?;
        Ok(record)
    }
}

fn to_counter(field: &'static str, value: i64) -> Result<u64, ValidationError> {
    u64::try_from(value).map_err(|_| ValidationError::NegativeField {
        field,
        value: value as f64,
    })
}

// =============================================================================
// Errors and Stats
// =============================================================================

/// Errors from ingesting a single payload.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IngestError {
    /// The payload was not valid JSON for the wire shape
    #[error("payload decode failed: {message}")]
    Decode {
        /// Decoder error detail
        message: String,
    },

    /// The store rejected or failed the append
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Counters for a completed ingest run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IngestStats {
    /// Payloads pulled off the channel
    pub received: u64,
    /// Events appended to the store
    pub stored: u64,
    /// Payloads dropped as malformed or invalid
    pub rejected: u64,
    /// Appends that failed for store-side reasons
    pub failed: u64,
}

// =============================================================================
// Ingestor
// =============================================================================

/// Pulls raw telemetry payloads and appends valid events to the store.
#[derive(Debug, Clone)]
pub struct Ingestor<S> {
    store: Arc<S>,
    time: TimeSource,
}

impl<S: EventStore> Ingestor<S> {
    /// Create an ingestor on system time.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self::with_time(store, TimeSource::system())
    }

    /// Create an ingestor with an explicit time source.
    #[must_use]
    pub fn with_time(store: Arc<S>, time: TimeSource) -> Self {
        Self { store, time }
    }

    /// Decode one raw JSON payload and append it.
    ///
    /// # Errors
    /// Returns [`IngestError::Decode`] for malformed JSON and
    /// [`IngestError::Store`] for validation or store failures.
    pub async fn ingest_json(&self, raw: &[u8]) -> Result<u64, IngestError> {
        let payload: EventPayload =
            serde_json::from_slice(raw).map_err(|e| IngestError::Decode {
                message: e.to_string(),
            })?;

        let record = payload
            .into_record(self.time.now())
            .map_err(StoreError::Validation)?;

        let sequence = self.store.append(&record).await?;
        debug!(object_id = %record.object_id, sequence, "event ingested");
        Ok(sequence)
    }

    /// Drain the channel until it closes, ingesting every payload.
    ///
    /// Bad payloads are dropped and counted; the loop only ends when all
    /// senders are gone.
    pub async fn run(&self, mut payloads: mpsc::Receiver<Vec<u8>>) -> IngestStats {
        let mut stats = IngestStats::default();

        while let Some(raw) = payloads.recv().await {
            stats.received += 1;
            match self.ingest_json(&raw).await {
                Ok(_) => stats.stored += 1,
                Err(IngestError::Decode { message }) => {
                    warn!(error = %message, "payload dropped: decode failed");
                    stats.rejected += 1;
                }
                Err(IngestError::Store(StoreError::Validation(err))) => {
                    warn!(error = %err, "payload dropped: validation failed");
                    stats.rejected += 1;
                }
                Err(IngestError::Store(err)) => {
                    warn!(error = %err, "append failed");
                    stats.failed += 1;
                }
            }
        }

        info!(
            received = stats.received,
            stored = stats.stored,
            rejected = stats.rejected,
            failed = stats.failed,
            "ingest channel closed"
        );
        stats
    }
}

// =============================================================================
// Tests
// =============================================================================
