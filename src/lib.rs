//! # Strata
//!
//! Telemetry-driven storage tier classification.
//!
//! Strata ingests per-object telemetry events, folds each object's history
//! into a feature vector, asks a tier model whether the object belongs on
//! the HOT, WARM, or COLD tier, and publishes the resulting placement
//! snapshot together with a bounded human-readable activity log.
//!
//! Simulation-first: every backend (store, model, clock, randomness, faults)
//! has a deterministic stand-in, so the whole pipeline runs byte-for-byte
//! reproducibly in tests.
//!
//! ## Quickstart
//!
//! ```
//! use std::sync::Arc;
//! use strata::{
//!     EventRecord, EventStore, MemoryEventStore, PipelineConfig, SimTierModel, TieringPipeline,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(MemoryEventStore::new());
//!     store
//!         .append(&EventRecord::new(
//!             chrono::Utc::now(),
//!             "OBJ_0001",
//!             42,   // reads since last event
//!             12.5, // size_gb
//!             0,    // recency_days
//!             5,    // latency_requirement_ms
//!             0.05, // cost_per_gb
//!         ))
//!         .await?;
//!
//!     let pipeline =
//!         TieringPipeline::load(store, SimTierModel::new(), PipelineConfig::default()).await?;
//!     let outcome = pipeline.run_pass().await?;
//!     assert_eq!(outcome.classified, 1);
//!
//!     for object in pipeline.list_classified_objects() {
//!         println!("{} -> {}", object.object_id, object.tier);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]

pub mod activity;
pub mod classifier;
pub mod constants;
pub mod dst;
pub mod event;
pub mod features;
pub mod ingest;
pub mod pipeline;
pub mod store;
pub mod telemetry;

pub use activity::ActivityLog;
pub use classifier::{ClassifierAdapter, ClassifierError, SimTierModel, Tier, TierModel};
pub use dst::{DeterministicRng, FaultConfig, FaultInjector, FaultType, SimClock, TimeSource};
pub use event::{EventRecord, ValidationError};
pub use features::{
    AggregationError, AggregatorConfig, FeatureAggregator, FeatureVector, FEATURE_FIELD_ORDER,
};
pub use ingest::{EventPayload, IngestError, IngestStats, Ingestor};
pub use pipeline::{
    ClassifiedObject, PassError, PassOutcome, PipelineConfig, TieringPipeline,
};
pub use store::{EventStore, MemoryEventStore, StoreError, StoreResult, StoredEvent};
#[cfg(feature = "sqlite")]
pub use store::SqliteEventStore;
pub use telemetry::{init_tracing, TelemetryConfig, TelemetryError};
