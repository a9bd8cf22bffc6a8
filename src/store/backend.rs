//! Event Store trait
//!
//! `TigerStyle`: Trait-based backends so production storage and simulation
//! are interchangeable behind one contract.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::StoreResult;
use crate::event::EventRecord;

/// An event as persisted, paired with its store-assigned sequence number.
///
/// Sequence numbers start at 1 and strictly increase in arrival order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEvent {
    /// Store-assigned, strictly increasing sequence number
    pub sequence: u64,
    /// The event payload
    pub event: EventRecord,
}

/// Append-only store for telemetry events.
///
/// Implementations must validate events before appending and must preserve
/// arrival order per object.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Append a validated event, returning its sequence number.
    ///
    /// Events that fail validation are rejected with
    /// [`StoreError::Validation`](super::StoreError::Validation) and leave
    /// the store unchanged.
    async fn append(&self, event: &EventRecord) -> StoreResult<u64>;

    /// List distinct object ids, sorted ascending.
    async fn object_ids(&self) -> StoreResult<Vec<String>>;

    /// Full history for one object, in arrival order.
    ///
    /// Returns an empty vector for unknown objects.
    async fn events_for(&self, object_id: &str) -> StoreResult<Vec<StoredEvent>>;

    /// The most recently appended event per object.
    async fn latest_records(&self) -> StoreResult<HashMap<String, StoredEvent>>;

    /// Every object's full history, read at a single logical point.
    ///
    /// One aggregation pass works from one snapshot so all objects are
    /// classified against the same state.
    async fn history_snapshot(&self) -> StoreResult<BTreeMap<String, Vec<StoredEvent>>>;

    /// Total number of events appended.
    async fn event_count(&self) -> StoreResult<usize>;
}
