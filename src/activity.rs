//! Activity Log - bounded, human-readable record of recent decisions
//!
//! `TigerStyle`: Fixed capacity, newest first, oldest evicted. This is the
//! operator-facing trace, not an audit log; the event store is the durable
//! record.

use std::collections::VecDeque;
use std::sync::RwLock;

use crate::constants::{
    ACTIVITY_LOG_CAPACITY_DEFAULT, ACTIVITY_LOG_CAPACITY_MAX, ACTIVITY_LOG_RECENT_COUNT_DEFAULT,
};
use crate::dst::TimeSource;

/// Bounded in-memory log of recent pipeline activity.
///
/// Entries are timestamped strings like `14:03:07 → object OBJ_0042
/// classified HOT, promoted to high-performance tier`. Thread-safe; shared
/// via `Arc` between the pipeline and the query surface.
#[derive(Debug)]
pub struct ActivityLog {
    entries: RwLock<VecDeque<String>>,
    capacity: usize,
    time: TimeSource,
}

impl ActivityLog {
    /// Create a log with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(ACTIVITY_LOG_CAPACITY_DEFAULT)
    }

    /// Create a log with a custom capacity.
    ///
    /// # Panics
    /// Panics if `capacity` is zero or exceeds the maximum.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be positive");
        assert!(
            capacity <= ACTIVITY_LOG_CAPACITY_MAX,
            "capacity {capacity} exceeds max ({ACTIVITY_LOG_CAPACITY_MAX})"
        );

        Self {
            entries: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity,
            time: TimeSource::system(),
        }
    }

    /// Use the given time source for entry timestamps.
    #[must_use]
    pub fn with_time_source(mut self, time: TimeSource) -> Self {
        self.time = time;
        self
    }

    /// Append a message, evicting the oldest entry if at capacity.
    pub fn append(&self, message: &str) {
        let stamp = self.time.now().format("%H:%M:%S");
        let entry = format!("{stamp} → {message}");

        let mut entries = self.entries.write().unwrap();
        entries.push_front(entry);
        entries.truncate(self.capacity);
    }

    /// The most recent `count` entries, newest first.
    #[must_use]
    pub fn recent(&self, count: usize) -> Vec<String> {
        let entries = self.entries.read().unwrap();
        entries.iter().take(count).cloned().collect()
    }

    /// The most recent entries at the default count.
    #[must_use]
    pub fn recent_default(&self) -> Vec<String> {
        self.recent(ACTIVITY_LOG_RECENT_COUNT_DEFAULT)
    }

    /// Number of entries currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The configured capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
