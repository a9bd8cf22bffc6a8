//! `TigerStyle` Constants
//!
//! All limits use big-endian naming: `CATEGORY_SPECIFICS_UNIT_LIMIT`
//! Example: `ACTIVITY_LOG_CAPACITY_DEFAULT` (not `DEFAULT_LOG_CAPACITY`)
//!
//! Every constant includes units in the name:
//! - _`BYTES_MAX` for size limits
//! - _MS for milliseconds
//! - _`COUNT_MAX/DEFAULT` for quantity limits

// =============================================================================
// Event Limits
// =============================================================================

/// Maximum length of an object identifier
pub const EVENT_OBJECT_ID_BYTES_MAX: usize = 256;

/// Maximum object size accepted from producers, in gigabytes
pub const EVENT_SIZE_GB_MAX: f64 = 1_000_000.0;

// =============================================================================
// Feature Aggregation
// =============================================================================

/// Number of fields in a feature vector (order is fixed, model-sensitive)
pub const FEATURE_VECTOR_FIELDS_COUNT: usize = 5;

/// Trailing window for the read-count feature (7 days)
pub const FEATURE_READ_WINDOW_MS: u64 = 7 * TIME_MS_PER_DAY;

// =============================================================================
// Activity Log
// =============================================================================

/// Default number of retained activity entries
pub const ACTIVITY_LOG_CAPACITY_DEFAULT: usize = 12;

/// Maximum configurable activity log capacity
pub const ACTIVITY_LOG_CAPACITY_MAX: usize = 1024;

/// Default number of entries returned by the query surface
pub const ACTIVITY_LOG_RECENT_COUNT_DEFAULT: usize = 10;

// =============================================================================
// Classification Pipeline
// =============================================================================

/// Default time budget for one classification pass
pub const PIPELINE_PASS_TIMEOUT_MS_DEFAULT: u64 = 30_000;

/// Default interval between scheduled classification passes
pub const PIPELINE_PASS_INTERVAL_MS_DEFAULT: u64 = 2_000;

// =============================================================================
// Ingestion
// =============================================================================

/// Default depth of the ingestion payload channel
pub const INGEST_CHANNEL_CAPACITY_DEFAULT: usize = 1024;

// =============================================================================
// Simulation Model Thresholds
// =============================================================================

/// Reads in the trailing window at or above which an object is HOT
pub const SIM_MODEL_HOT_READS_MIN: f64 = 30.0;

/// Latency requirement at or below which an active object is HOT
pub const SIM_MODEL_HOT_LATENCY_MS_MAX: f64 = 10.0;

/// Days without access at or above which an idle object is COLD
pub const SIM_MODEL_COLD_RECENCY_DAYS_MIN: f64 = 30.0;

/// Reads in the trailing window at or below which a stale object is COLD
pub const SIM_MODEL_COLD_READS_MAX: f64 = 5.0;

// =============================================================================
// DST (Deterministic Simulation Testing) Limits
// =============================================================================

/// Maximum probability for fault injection (1.0 = 100%)
pub const DST_FAULT_PROBABILITY_MAX: f64 = 1.0;

/// Maximum time advance per step in milliseconds
pub const DST_TIME_ADVANCE_MS_MAX: u64 = 365 * TIME_MS_PER_DAY;

// =============================================================================
// Time Constants
// =============================================================================

/// Milliseconds per second
pub const TIME_MS_PER_SEC: u64 = 1000;

/// Milliseconds per minute
pub const TIME_MS_PER_MIN: u64 = 60 * TIME_MS_PER_SEC;

/// Milliseconds per hour
pub const TIME_MS_PER_HOUR: u64 = 60 * TIME_MS_PER_MIN;

/// Milliseconds per day
pub const TIME_MS_PER_DAY: u64 = 24 * TIME_MS_PER_HOUR;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_constants_consistent() {
        assert_eq!(TIME_MS_PER_MIN, 60_000);
        assert_eq!(TIME_MS_PER_HOUR, 3_600_000);
        assert_eq!(TIME_MS_PER_DAY, 86_400_000);
    }

    #[test]
    fn test_feature_window_is_seven_days() {
        assert_eq!(FEATURE_READ_WINDOW_MS, 7 * 86_400_000);
    }

    #[test]
    fn test_activity_log_limits_valid() {
        assert!(ACTIVITY_LOG_CAPACITY_DEFAULT > 0);
        assert!(ACTIVITY_LOG_CAPACITY_DEFAULT <= ACTIVITY_LOG_CAPACITY_MAX);
        assert!(ACTIVITY_LOG_RECENT_COUNT_DEFAULT <= ACTIVITY_LOG_CAPACITY_DEFAULT);
    }

    #[test]
    fn test_sim_model_thresholds_ordered() {
        assert!(SIM_MODEL_COLD_READS_MAX < SIM_MODEL_HOT_READS_MIN);
    }
}
