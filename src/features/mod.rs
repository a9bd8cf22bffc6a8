//! Feature Aggregation - fold an object's event history into a model input
//!
//! `TigerStyle`: Aggregation is a pure function of (history, now); the async
//! wrapper only fetches. Field order in the output vector is a compatibility
//! contract with the model and must never change.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tracing::debug;

use crate::constants::{FEATURE_READ_WINDOW_MS, FEATURE_VECTOR_FIELDS_COUNT};
use crate::store::{EventStore, StoreError, StoredEvent};

/// Positional field order of [`FeatureVector::as_array`].
///
/// The model was trained against exactly this order.
pub const FEATURE_FIELD_ORDER: [&str; FEATURE_VECTOR_FIELDS_COUNT] = [
    "size_gb",
    "reads_last_7d",
    "recency_days",
    "latency_requirement_ms",
    "cost_per_gb",
];

// =============================================================================
// Errors
// =============================================================================

/// Errors from feature aggregation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AggregationError {
    /// Stored history contains a non-finite float
    #[error("non-finite value in stored history for {object_id}")]
    NonFinite {
        /// The affected object
        object_id: String,
    },

    /// The underlying store failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

// =============================================================================
// FeatureVector
// =============================================================================

/// The aggregated per-object model input.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FeatureVector {
    /// Object this vector describes
    pub object_id: String,
    /// Latest reported size in gigabytes
    pub size_gb: f64,
    /// Sum of read increments inside the trailing read window
    pub reads_last_7d: f64,
    /// Latest reported days since last access
    pub recency_days: f64,
    /// Latest reported latency requirement in milliseconds
    pub latency_requirement_ms: f64,
    /// Latest reported storage cost rate
    pub cost_per_gb: f64,
}

impl FeatureVector {
    /// An all-zero vector for an object with no usable history.
    #[must_use]
    pub fn zeroed(object_id: impl Into<String>) -> Self {
        Self {
            object_id: object_id.into(),
            size_gb: 0.0,
            reads_last_7d: 0.0,
            recency_days: 0.0,
            latency_requirement_ms: 0.0,
            cost_per_gb: 0.0,
        }
    }

    /// Positional array form, ordered per [`FEATURE_FIELD_ORDER`].
    #[must_use]
    pub fn as_array(&self) -> [f64; FEATURE_VECTOR_FIELDS_COUNT] {
        [
            self.size_gb,
            self.reads_last_7d,
            self.recency_days,
            self.latency_requirement_ms,
            self.cost_per_gb,
        ]
    }
}

// =============================================================================
// Aggregator
// =============================================================================

/// Configuration for feature aggregation.
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Trailing window for the read count feature, in milliseconds
    pub read_window_ms: u64,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            read_window_ms: FEATURE_READ_WINDOW_MS,
        }
    }
}

impl AggregatorConfig {
    /// Override the trailing read window.
    ///
    /// # Panics
    /// Panics if `ms` is zero.
    #[must_use]
    pub fn with_read_window_ms(mut self, ms: u64) -> Self {
        assert!(ms > 0, "read window must be positive");
        self.read_window_ms = ms;
        self
    }
}

/// Computes feature vectors from stored event history.
#[derive(Debug, Clone)]
pub struct FeatureAggregator<S> {
    store: Arc<S>,
    config: AggregatorConfig,
}

impl<S: EventStore> FeatureAggregator<S> {
    /// Create an aggregator over the given store.
    #[must_use]
    pub fn new(store: Arc<S>, config: AggregatorConfig) -> Self {
        Self { store, config }
    }

    /// Aggregate one object's history as read from the store.
    ///
    /// # Errors
    /// Returns [`AggregationError::Store`] if the read fails and
    /// [`AggregationError::NonFinite`] if stored floats are corrupt.
    pub async fn features_for(
        &self,
        object_id: &str,
        now: DateTime<Utc>,
    ) -> Result<FeatureVector, AggregationError> {
        let history = self.store.events_for(object_id).await?;
        self.features_from_history(object_id, &history, now)
    }

    /// Aggregate a history already in hand.
    ///
    /// Latest-value fields come from the last event in arrival order; the
    /// read count sums increments whose producer timestamp falls inside the
    /// trailing window ending at `now`. An empty history yields a zeroed
    /// vector, so never-seen objects still classify (they land COLD).
    ///
    /// # Errors
    /// Returns [`AggregationError::NonFinite`] if stored floats are corrupt.
    pub fn features_from_history(
        &self,
        object_id: &str,
        history: &[StoredEvent],
        now: DateTime<Utc>,
    ) -> Result<FeatureVector, AggregationError> {
        let Some(last) = history.last() else {
            debug!(object_id, "no history, zeroed features");
            return Ok(FeatureVector::zeroed(object_id));
        };

        // A window wider than the representable past means "all history"
        let window = Duration::milliseconds(
            i64::try_from(self.config.read_window_ms).unwrap_or(i64::MAX / 2),
        );
        let cutoff = now
            .checked_sub_signed(window)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        let mut reads: u64 = 0;
        for stored in history {
            if stored.event.timestamp >= cutoff {
                reads = reads.saturating_add(stored.event.read_increment);
            }
        }

        let vector = FeatureVector {
            object_id: object_id.to_string(),
            size_gb: last.event.size_gb,
            reads_last_7d: reads as f64,
            recency_days: last.event.recency_days as f64,
            latency_requirement_ms: last.event.latency_requirement_ms as f64,
            cost_per_gb: last.event.cost_per_gb,
        };

        // Postcondition: stored events are validated on append, so any
        // non-finite value here means the store itself is corrupt.
        if vector.as_array().iter().any(|v| !v.is_finite()) {
            return Err(AggregationError::NonFinite {
                object_id: object_id.to_string(),
            });
        }

        Ok(vector)
    }
}

// =============================================================================
// Tests
// =============================================================================
