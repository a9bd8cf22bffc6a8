//! Event Store - durable, append-only telemetry history
//!
//! One trait, multiple backends: in-memory for simulation and ephemeral
//! deployments, SQLite (feature `sqlite`) for durability.

mod backend;
mod error;
mod memory;
#[cfg(feature = "sqlite")]
mod sqlite;

pub use backend::{EventStore, StoredEvent};
pub use error::{StoreError, StoreResult};
pub use memory::MemoryEventStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteEventStore;
