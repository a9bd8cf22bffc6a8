//! In-memory event store
//!
//! `TigerStyle`: The simulation-first backend. Deterministic, fast, and able
//! to inject faults, so pipeline behavior under storage failure is testable
//! without a real database.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tracing::debug;

use super::backend::{EventStore, StoredEvent};
use super::error::{StoreError, StoreResult};
use crate::dst::{FaultInjector, FaultType};
use crate::event::EventRecord;

#[derive(Debug, Default)]
struct Inner {
    /// Next sequence number to assign (starts at 1)
    next_sequence: u64,
    /// Per-object history, arrival order
    histories: BTreeMap<String, Vec<StoredEvent>>,
    /// Total events appended
    total: usize,
}

/// In-memory append-only event store.
///
/// Used in production for ephemeral deployments and in tests everywhere.
/// Thread-safe; clones are cheap and share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryEventStore {
    inner: Arc<RwLock<Inner>>,
    faults: Option<Arc<FaultInjector>>,
}

impl MemoryEventStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                next_sequence: 1,
                ..Inner::default()
            })),
            faults: None,
        }
    }

    /// Create a store that consults the given fault injector on every
    /// operation.
    #[must_use]
    pub fn with_fault_injector(faults: Arc<FaultInjector>) -> Self {
        let mut store = Self::new();
        store.faults = Some(faults);
        store
    }

    fn maybe_inject(&self, operation: &str) -> StoreResult<()> {
        if let Some(ref faults) = self.faults {
            if let Some(fault_type) = faults.should_inject(operation) {
                match fault_type {
                    FaultType::StoreWriteFail | FaultType::StoreReadFail => {
                        debug!(operation, fault = fault_type.as_str(), "injected fault");
                        return Err(StoreError::simulated_fault(fault_type.as_str()));
                    }
                    // Model faults belong to the classifier, not the store
                    _ => {}
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    #[tracing::instrument(skip(self, event), fields(object_id = %event.object_id))]
    async fn append(&self, event: &EventRecord) -> StoreResult<u64> {
        event.validate()?;
        self.maybe_inject("append")?;

        let mut inner = self.inner.write().unwrap();
        let sequence = inner.next_sequence;
        inner.next_sequence += 1;
        inner.total += 1;
        inner
            .histories
            .entry(event.object_id.clone())
            .or_default()
            .push(StoredEvent {
                sequence,
                event: event.clone(),
            });

        debug!(sequence, "event appended");
        Ok(sequence)
    }

    async fn object_ids(&self) -> StoreResult<Vec<String>> {
        self.maybe_inject("object_ids")?;

        let inner = self.inner.read().unwrap();
        // BTreeMap keys are already sorted
        Ok(inner.histories.keys().cloned().collect())
    }

    async fn events_for(&self, object_id: &str) -> StoreResult<Vec<StoredEvent>> {
        self.maybe_inject("events_for")?;

        let inner = self.inner.read().unwrap();
        Ok(inner.histories.get(object_id).cloned().unwrap_or_default())
    }

    async fn latest_records(&self) -> StoreResult<HashMap<String, StoredEvent>> {
        self.maybe_inject("latest_records")?;

        let inner = self.inner.read().unwrap();
        Ok(inner
            .histories
            .iter()
            .filter_map(|(object_id, history)| {
                history
                    .last()
                    .map(|stored| (object_id.clone(), stored.clone()))
            })
            .collect())
    }

    async fn history_snapshot(&self) -> StoreResult<BTreeMap<String, Vec<StoredEvent>>> {
        self.maybe_inject("history_snapshot")?;

        let inner = self.inner.read().unwrap();
        Ok(inner.histories.clone())
    }

    async fn event_count(&self) -> StoreResult<usize> {
        self.maybe_inject("event_count")?;

        let inner = self.inner.read().unwrap();
        Ok(inner.total)
    }
}

// =============================================================================
// Tests
// =============================================================================
