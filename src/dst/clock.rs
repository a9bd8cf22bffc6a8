//! Simulated and real time sources
//!
//! `TigerStyle`: Deterministic, controllable time for simulation. Time only
//! moves forward.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::constants::{DST_TIME_ADVANCE_MS_MAX, TIME_MS_PER_SEC};

// =============================================================================
// SimClock
// =============================================================================

/// A simulated clock for deterministic testing.
///
/// Thread-safe via `Arc<AtomicU64>`; clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    /// Current time in milliseconds since epoch
    current_ms: Arc<AtomicU64>,
}

impl SimClock {
    /// Create a new clock starting at time zero (Unix epoch).
    #[must_use]
    pub fn new() -> Self {
        Self {
            current_ms: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Create a clock starting at the given millisecond timestamp.
    #[must_use]
    pub fn at_ms(start_ms: u64) -> Self {
        Self {
            current_ms: Arc::new(AtomicU64::new(start_ms)),
        }
    }

    /// Create a clock starting at the given `DateTime`.
    #[must_use]
    pub fn at_datetime(dt: DateTime<Utc>) -> Self {
        Self::at_ms(dt.timestamp_millis().max(0) as u64)
    }

    /// Get current time in milliseconds.
    #[must_use]
    pub fn now_ms(&self) -> u64 {
        self.current_ms.load(Ordering::SeqCst)
    }

    /// Get current time in seconds (truncated).
    #[must_use]
    pub fn now_secs(&self) -> u64 {
        self.now_ms() / TIME_MS_PER_SEC
    }

    /// Get current time as `DateTime<Utc>`.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.now_ms() as i64)
            .unwrap_or_else(|| DateTime::from_timestamp(0, 0).unwrap())
    }

    /// Advance time by the given milliseconds, returning the new time.
    ///
    /// # Panics
    /// Panics if `ms` exceeds `DST_TIME_ADVANCE_MS_MAX`.
    pub fn advance_ms(&self, ms: u64) -> u64 {
        // Preconditions
        assert!(
            ms <= DST_TIME_ADVANCE_MS_MAX,
            "advance_ms({ms}) exceeds max ({DST_TIME_ADVANCE_MS_MAX})"
        );

        let old_time = self.current_ms.fetch_add(ms, Ordering::SeqCst);
        let new_time = old_time.saturating_add(ms);

        // Postcondition
        assert!(new_time >= old_time, "time must not go backwards");

        new_time
    }

    /// Advance time by a chrono `Duration`.
    ///
    /// # Panics
    /// Panics if the duration is negative.
    pub fn advance(&self, duration: chrono::Duration) {
        assert!(
            duration >= chrono::Duration::zero(),
            "cannot go back in time"
        );
        self.advance_ms(duration.num_milliseconds() as u64);
    }

    /// Set time to an absolute value.
    ///
    /// # Panics
    /// Panics if the new time is behind the current time.
    pub fn set_ms(&self, ms: u64) {
        let current = self.now_ms();
        assert!(ms >= current, "cannot set time backwards: {ms} < {current}");
        self.current_ms.store(ms, Ordering::SeqCst);
    }

    /// Get elapsed milliseconds since a given timestamp.
    ///
    /// # Panics
    /// Panics if `since` is in the future.
    #[must_use]
    pub fn elapsed_since(&self, since: u64) -> u64 {
        let current = self.now_ms();
        assert!(
            since <= current,
            "elapsed_since({since}) is in the future (now={current})"
        );
        current - since
    }
}

// =============================================================================
// TimeSource
// =============================================================================

/// Where components read "now" from.
///
/// Production components default to the system clock; tests swap in a
/// [`SimClock`] for deterministic timestamps.
#[derive(Debug, Clone, Default)]
pub enum TimeSource {
    /// Wall-clock time via `Utc::now`
    #[default]
    System,
    /// Simulated time, shared across clones
    Sim(SimClock),
}

impl TimeSource {
    /// System wall-clock time.
    #[must_use]
    pub fn system() -> Self {
        Self::System
    }

    /// Simulated time driven by the given clock.
    #[must_use]
    pub fn sim(clock: SimClock) -> Self {
        Self::Sim(clock)
    }

    /// Current time from this source.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Self::System => Utc::now(),
            Self::Sim(clock) => clock.now(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_time() {
        let clock = SimClock::new();
        assert_eq!(clock.now_ms(), 0);
        assert_eq!(clock.now_secs(), 0);
    }

    #[test]
    fn test_at_ms() {
        let clock = SimClock::at_ms(5000);
        assert_eq!(clock.now_ms(), 5000);
        assert_eq!(clock.now_secs(), 5);
    }

    #[test]
    fn test_at_datetime_round_trip() {
        let dt = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
            .unwrap()
            .to_utc();
        let clock = SimClock::at_datetime(dt);
        assert_eq!(clock.now(), dt);
    }

    #[test]
    fn test_advance_accumulates() {
        let clock = SimClock::new();
        clock.advance_ms(100);
        clock.advance_ms(200);
        clock.advance(chrono::Duration::milliseconds(300));
        assert_eq!(clock.now_ms(), 600);
    }

    #[test]
    #[should_panic(expected = "advance_ms")]
    fn test_advance_exceeds_max() {
        let clock = SimClock::new();
        clock.advance_ms(DST_TIME_ADVANCE_MS_MAX + 1);
    }

    #[test]
    #[should_panic(expected = "cannot set time backwards")]
    fn test_set_ms_backwards() {
        let clock = SimClock::new();
        clock.advance_ms(1000);
        clock.set_ms(500);
    }

    #[test]
    fn test_elapsed_since() {
        let clock = SimClock::new();
        let start = clock.now_ms();
        clock.advance_ms(500);
        assert_eq!(clock.elapsed_since(start), 500);
    }

    #[test]
    fn test_clone_shares_time() {
        let clock1 = SimClock::new();
        let clock2 = clock1.clone();
        clock1.advance_ms(1000);
        assert_eq!(clock2.now_ms(), 1000);
    }

    #[test]
    fn test_time_source_sim() {
        let clock = SimClock::at_ms(86_400_000);
        let source = TimeSource::sim(clock.clone());
        assert_eq!(source.now(), clock.now());
        clock.advance_ms(1000);
        assert_eq!(source.now(), clock.now());
    }
}
