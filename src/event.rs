//! Event Record - one telemetry observation for a storage object
//!
//! `TigerStyle`: Explicit types, validation at the boundary, immutable once
//! stored.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{EVENT_OBJECT_ID_BYTES_MAX, EVENT_SIZE_GB_MAX};

// =============================================================================
// Validation Errors
// =============================================================================

/// Errors raised by event validation.
///
/// A malformed event is dropped by the ingestion loop; it never corrupts
/// stored state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Object identifier is empty
    #[error("object_id is empty")]
    EmptyObjectId,

    /// Object identifier exceeds the size limit
    #[error("object_id too long: {len} bytes (max {max})")]
    ObjectIdTooLong {
        /// Actual length in bytes
        len: usize,
        /// Maximum allowed length
        max: usize,
    },

    /// A numeric field is negative
    #[error("negative value for {field}: {value}")]
    NegativeField {
        /// Name of the offending field
        field: &'static str,
        /// The rejected value
        value: f64,
    },

    /// A float field is NaN or infinite
    #[error("non-finite value for {field}")]
    NonFiniteField {
        /// Name of the offending field
        field: &'static str,
    },

    /// A float field exceeds its sanity limit
    #[error("out-of-range value for {field}: {value} (max {max})")]
    OutOfRangeField {
        /// Name of the offending field
        field: &'static str,
        /// The rejected value
        value: f64,
        /// Maximum allowed value
        max: f64,
    },
}

// =============================================================================
// EventRecord
// =============================================================================

/// One immutable telemetry observation for a storage object.
///
/// Events are appended to the store exactly as received; they are never
/// mutated afterwards. Per-object history order is the store's arrival
/// order, not the producer timestamp (clock skew is tolerated).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// When the producer observed the event
    pub timestamp: DateTime<Utc>,
    /// Identifier of the storage object this event describes
    pub object_id: String,
    /// Reads observed since the previous event for this object
    pub read_increment: u64,
    /// Current size of the object in gigabytes
    pub size_gb: f64,
    /// Days since last access, as reported by the producer
    pub recency_days: u64,
    /// Required read latency in milliseconds
    pub latency_requirement_ms: u64,
    /// Current storage cost rate per gigabyte
    pub cost_per_gb: f64,
}

impl EventRecord {
    /// Create a new event record.
    ///
    /// The record is not validated here; `append` validates before
    /// persisting (see [`crate::store::EventStore`]).
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        timestamp: DateTime<Utc>,
        object_id: impl Into<String>,
        read_increment: u64,
        size_gb: f64,
        recency_days: u64,
        latency_requirement_ms: u64,
        cost_per_gb: f64,
    ) -> Self {
        Self {
            timestamp,
            object_id: object_id.into(),
            read_increment,
            size_gb,
            recency_days,
            latency_requirement_ms,
            cost_per_gb,
        }
    }

    /// Validate the record against the invariants in the data model.
    ///
    /// # Errors
    /// Returns [`ValidationError`] for an empty or oversized `object_id`,
    /// or a negative, non-finite, or out-of-range float field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.object_id.is_empty() {
            return Err(ValidationError::EmptyObjectId);
        }
        if self.object_id.len() > EVENT_OBJECT_ID_BYTES_MAX {
            return Err(ValidationError::ObjectIdTooLong {
                len: self.object_id.len(),
                max: EVENT_OBJECT_ID_BYTES_MAX,
            });
        }

        validate_float("size_gb", self.size_gb)?;
        validate_float("cost_per_gb", self.cost_per_gb)?;

        if self.size_gb > EVENT_SIZE_GB_MAX {
            return Err(ValidationError::OutOfRangeField {
                field: "size_gb",
                value: self.size_gb,
                max: EVENT_SIZE_GB_MAX,
            });
        }

        Ok(())
    }
}

/// Check a float field for NaN/infinity and sign.
fn validate_float(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteField { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeField { field, value });
    }
    Ok(())
}

// =============================================================================
// Timestamp Parsing
// =============================================================================

/// Parse a producer timestamp.
///
/// Accepts RFC 3339 (`2024-01-01T00:00:00Z`) and naive ISO-8601 without an
/// offset (`2024-01-01T00:00:00.123456`, treated as UTC); the latter is what
/// the reference producer emits.
#[must_use]
pub fn parse_event_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
}

// =============================================================================
// Tests
// =============================================================================
