//! Tiering Pipeline - orchestrate aggregate, classify, publish
//!
//! `TigerStyle`: One pass is atomic from the reader's point of view. The
//! published snapshot only ever holds complete decisions; a failed pass
//! leaves the previous snapshot standing.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::activity::ActivityLog;
use crate::classifier::{ClassifierAdapter, ClassifierError, Tier, TierModel};
use crate::constants::{
    ACTIVITY_LOG_CAPACITY_DEFAULT, PIPELINE_PASS_INTERVAL_MS_DEFAULT,
    PIPELINE_PASS_TIMEOUT_MS_DEFAULT,
};
use crate::dst::TimeSource;
use crate::features::{AggregatorConfig, FeatureAggregator, FeatureVector};
use crate::store::{EventStore, StoreError};

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the tiering pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Wall-time budget for one pass
    pub pass_timeout: Duration,
    /// Interval between periodic passes
    pub pass_interval: Duration,
    /// Activity log capacity
    pub log_capacity: usize,
    /// Feature aggregation settings
    pub aggregator: AggregatorConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            pass_timeout: Duration::from_millis(PIPELINE_PASS_TIMEOUT_MS_DEFAULT),
            pass_interval: Duration::from_millis(PIPELINE_PASS_INTERVAL_MS_DEFAULT),
            log_capacity: ACTIVITY_LOG_CAPACITY_DEFAULT,
            aggregator: AggregatorConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Override the per-pass timeout.
    #[must_use]
    pub fn with_pass_timeout(mut self, timeout: Duration) -> Self {
        self.pass_timeout = timeout;
        self
    }

    /// Override the periodic pass interval.
    #[must_use]
    pub fn with_pass_interval(mut self, interval: Duration) -> Self {
        self.pass_interval = interval;
        self
    }

    /// Override the activity log capacity.
    #[must_use]
    pub fn with_log_capacity(mut self, capacity: usize) -> Self {
        self.log_capacity = capacity;
        self
    }

    /// Override the aggregator configuration.
    #[must_use]
    pub fn with_aggregator(mut self, aggregator: AggregatorConfig) -> Self {
        self.aggregator = aggregator;
        self
    }
}

// =============================================================================
// Outputs and Errors
// =============================================================================

/// One object's published classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedObject {
    /// The object
    pub object_id: String,
    /// Features the decision was made from
    pub features: FeatureVector,
    /// The tier decision
    pub tier: Tier,
    /// When the pass that produced this decision started
    pub decided_at: DateTime<Utc>,
}

/// Summary of one completed pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PassOutcome {
    /// Objects classified and published
    pub classified: usize,
    /// Objects skipped (aggregation failure or bad model label)
    pub skipped: usize,
}

/// Errors that abort a whole pass.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PassError {
    /// Reading the event store failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The classifier failed at batch level
    #[error("classifier error: {0}")]
    Classifier(ClassifierError),

    /// The pass exceeded its time budget
    #[error("pass timed out after {budget_ms} ms")]
    Timeout {
        /// The exceeded budget in milliseconds
        budget_ms: u64,
    },
}

// =============================================================================
// TieringPipeline
// =============================================================================

/// The orchestrator: aggregates features, classifies, and publishes the
/// resulting tier snapshot plus activity log entries.
pub struct TieringPipeline<S, M> {
    store: Arc<S>,
    adapter: ClassifierAdapter<M>,
    aggregator: FeatureAggregator<S>,
    snapshot: RwLock<HashMap<String, ClassifiedObject>>,
    log: Arc<ActivityLog>,
    time: TimeSource,
    config: PipelineConfig,
}

impl<S: EventStore, M: TierModel> TieringPipeline<S, M> {
    /// Load a pipeline over the given store and model, on system time.
    ///
    /// # Errors
    /// Returns [`ClassifierError::ModelUnavailable`] if the model cannot be
    /// loaded.
    pub async fn load(
        store: Arc<S>,
        model: M,
        config: PipelineConfig,
    ) -> Result<Self, ClassifierError> {
        Self::load_with_time(store, model, config, TimeSource::system()).await
    }

    /// Load a pipeline with an explicit time source.
    ///
    /// # Errors
    /// Returns [`ClassifierError::ModelUnavailable`] if the model cannot be
    /// loaded.
    pub async fn load_with_time(
        store: Arc<S>,
        model: M,
        config: PipelineConfig,
        time: TimeSource,
    ) -> Result<Self, ClassifierError> {
        let adapter = ClassifierAdapter::load(model).await?;
        let aggregator = FeatureAggregator::new(Arc::clone(&store), config.aggregator.clone());
        let log = Arc::new(
            ActivityLog::with_capacity(config.log_capacity).with_time_source(time.clone()),
        );

        info!(model = adapter.model_name(), "tiering pipeline loaded");

        Ok(Self {
            store,
            adapter,
            aggregator,
            snapshot: RwLock::new(HashMap::new()),
            log,
            time,
            config,
        })
    }

    /// Run one classification pass under the configured time budget.
    ///
    /// # Errors
    /// Returns [`PassError`] if the store read or the classification batch
    /// fails, or the budget is exceeded. The published snapshot is untouched
    /// on error.
    #[tracing::instrument(skip(self))]
    pub async fn run_pass(&self) -> Result<PassOutcome, PassError> {
        let budget = self.config.pass_timeout;
        match tokio::time::timeout(budget, self.execute_pass()).await {
            Ok(result) => result,
            Err(_) => {
                let budget_ms = budget.as_millis() as u64;
                error!(budget_ms, "classification pass timed out");
                self.log
                    .append(&format!("classification pass timed out after {budget_ms} ms"));
                Err(PassError::Timeout { budget_ms })
            }
        }
    }

    async fn execute_pass(&self) -> Result<PassOutcome, PassError> {
        let now = self.time.now();

        let histories = match self.store.history_snapshot().await {
            Ok(histories) => histories,
            Err(err) => {
                warn!(error = %err, "pass aborted: store read failed");
                self.log
                    .append(&format!("classification pass aborted: {err}"));
                return Err(err.into());
            }
        };

        let mut batch = Vec::with_capacity(histories.len());
        let mut skipped = 0_usize;
        for (object_id, history) in &histories {
            match self
                .aggregator
                .features_from_history(object_id, history, now)
            {
                Ok(vector) => batch.push(vector),
                Err(err) => {
                    warn!(object_id, error = %err, "object skipped: aggregation failed");
                    self.log
                        .append(&format!("object {object_id} skipped: {err}"));
                    skipped += 1;
                }
            }
        }

        if batch.is_empty() {
            debug!("nothing to classify");
            return Ok(PassOutcome {
                classified: 0,
                skipped,
            });
        }

        let decisions = match self.adapter.classify(&batch).await {
            Ok(decisions) => decisions,
            Err(err) => {
                warn!(error = %err, "pass aborted: classifier failed");
                self.log
                    .append(&format!("classification pass aborted: {err}"));
                return Err(PassError::Classifier(err));
            }
        };

        let mut classified = Vec::with_capacity(decisions.len());
        for (vector, decision) in batch.into_iter().zip(decisions) {
            match decision {
                Ok(tier) => classified.push(ClassifiedObject {
                    object_id: vector.object_id.clone(),
                    features: vector,
                    tier,
                    decided_at: now,
                }),
                Err(err) => {
                    self.log
                        .append(&format!("object {} skipped: {err}", vector.object_id));
                    skipped += 1;
                }
            }
        }

        // Publish all decisions under one write lock. Last write wins for
        // objects carried over from earlier passes.
        {
            let mut snapshot = self.snapshot.write().unwrap();
            for object in &classified {
                snapshot.insert(object.object_id.clone(), object.clone());
            }
        }

        for object in &classified {
            self.log.append(&decision_message(object));
        }

        let outcome = PassOutcome {
            classified: classified.len(),
            skipped,
        };
        info!(
            classified = outcome.classified,
            skipped = outcome.skipped,
            "classification pass complete"
        );
        Ok(outcome)
    }

    /// Run passes on the configured interval until `shutdown` turns true.
    ///
    /// Pass failures are logged and do not stop the loop; transient store
    /// and model errors are expected to clear on a later pass.
    pub async fn run_periodic(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.config.pass_interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(err) = self.run_pass().await {
                        warn!(error = %err, "periodic pass failed");
                    }
                }
                result = shutdown.changed() => {
                    if result.is_err() || *shutdown.borrow() {
                        info!("tiering pipeline shutting down");
                        return;
                    }
                }
            }
        }
    }

    // =========================================================================
    // Query surface
    // =========================================================================

    /// All currently classified objects, sorted by object id.
    #[must_use]
    pub fn list_classified_objects(&self) -> Vec<ClassifiedObject> {
        let snapshot = self.snapshot.read().unwrap();
        let mut objects: Vec<ClassifiedObject> = snapshot.values().cloned().collect();
        objects.sort_by(|a, b| a.object_id.cmp(&b.object_id));
        objects
    }

    /// The current classification for one object, if any.
    #[must_use]
    pub fn classification_for(&self, object_id: &str) -> Option<ClassifiedObject> {
        self.snapshot.read().unwrap().get(object_id).cloned()
    }

    /// The most recent activity log entries, newest first.
    #[must_use]
    pub fn recent_log_entries(&self, count: usize) -> Vec<String> {
        self.log.recent(count)
    }

    /// The shared activity log.
    #[must_use]
    pub fn activity_log(&self) -> Arc<ActivityLog> {
        Arc::clone(&self.log)
    }

    /// The underlying event store.
    #[must_use]
    pub fn store(&self) -> Arc<S> {
        Arc::clone(&self.store)
    }
}

fn decision_message(object: &ClassifiedObject) -> String {
    let action = match object.tier {
        Tier::Hot => "promoted to high-performance tier",
        Tier::Warm => "held on standard tier",
        Tier::Cold => "archived to cold tier",
    };
    format!(
        "object {} classified {}, {action}",
        object.object_id, object.tier
    )
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::SimTierModel;
    use crate::dst::{DeterministicRng, FaultConfig, FaultInjector, FaultType, SimClock};
    use crate::event::EventRecord;
    use crate::store::MemoryEventStore;
    use chrono::TimeZone;

    fn sim_clock() -> SimClock {
        SimClock::at_datetime(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap())
    }

    fn event(clock: &SimClock, object_id: &str, reads: u64, latency_ms: u64) -> EventRecord {
        EventRecord::new(clock.now(), object_id, reads, 10.0, 1, latency_ms, 0.02)
    }

    async fn pipeline_over(
        store: Arc<MemoryEventStore>,
        clock: &SimClock,
    ) -> TieringPipeline<MemoryEventStore, SimTierModel> {
        TieringPipeline::load_with_time(
            store,
            SimTierModel::new(),
            PipelineConfig::default(),
            TimeSource::sim(clock.clone()),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_empty_store_pass() {
        let clock = sim_clock();
        let pipeline = pipeline_over(Arc::new(MemoryEventStore::new()), &clock).await;

        let outcome = pipeline.run_pass().await.unwrap();
        assert_eq!(outcome, PassOutcome::default());
        assert!(pipeline.list_classified_objects().is_empty());
    }

    #[tokio::test]
    async fn test_pass_classifies_all_objects() {
        let clock = sim_clock();
        let store = Arc::new(MemoryEventStore::new());
        store.append(&event(&clock, "hot_obj", 50, 100)).await.unwrap();
        store.append(&event(&clock, "warm_obj", 10, 100)).await.unwrap();

        let pipeline = pipeline_over(Arc::clone(&store), &clock).await;
        let outcome = pipeline.run_pass().await.unwrap();

        assert_eq!(outcome.classified, 2);
        assert_eq!(outcome.skipped, 0);

        let objects = pipeline.list_classified_objects();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].object_id, "hot_obj");
        assert_eq!(objects[0].tier, Tier::Hot);
        assert_eq!(objects[1].tier, Tier::Warm);
    }

    #[tokio::test]
    async fn test_reclassification_overwrites() {
        let clock = sim_clock();
        let store = Arc::new(MemoryEventStore::new());
        store.append(&event(&clock, "obj", 50, 100)).await.unwrap();

        let pipeline = pipeline_over(Arc::clone(&store), &clock).await;
        pipeline.run_pass().await.unwrap();
        assert_eq!(pipeline.classification_for("obj").unwrap().tier, Tier::Hot);

        // Reads age out of the window, object cools off
        clock.advance(chrono::Duration::days(40));
        let mut stale = event(&clock, "obj", 0, 100);
        stale.recency_days = 40;
        store.append(&stale).await.unwrap();

        pipeline.run_pass().await.unwrap();
        assert_eq!(pipeline.classification_for("obj").unwrap().tier, Tier::Cold);
        assert_eq!(pipeline.list_classified_objects().len(), 1);
    }

    #[tokio::test]
    async fn test_decision_log_entries() {
        let clock = sim_clock();
        let store = Arc::new(MemoryEventStore::new());
        store.append(&event(&clock, "obj", 50, 100)).await.unwrap();

        let pipeline = pipeline_over(store, &clock).await;
        pipeline.run_pass().await.unwrap();

        let entries = pipeline.recent_log_entries(5);
        assert_eq!(entries.len(), 1);
        assert!(entries[0]
            .ends_with("object obj classified HOT, promoted to high-performance tier"));
    }

    #[tokio::test]
    async fn test_store_failure_aborts_and_preserves_snapshot() {
        let clock = sim_clock();
        let store = Arc::new(MemoryEventStore::new());
        store.append(&event(&clock, "obj", 50, 100)).await.unwrap();

        let pipeline = pipeline_over(Arc::clone(&store), &clock).await;
        pipeline.run_pass().await.unwrap();
        assert_eq!(pipeline.list_classified_objects().len(), 1);

        // Same store state, but a pipeline whose store reads now fail
        let mut injector = FaultInjector::new(DeterministicRng::new(42));
        injector.register(
            FaultConfig::new(FaultType::StoreReadFail, 1.0).with_filter("history_snapshot"),
        );
        let failing_store = MemoryEventStore::with_fault_injector(Arc::new(injector));
        failing_store
            .append(&event(&clock, "obj", 50, 100))
            .await
            .unwrap();

        let failing_pipeline = pipeline_over(Arc::new(failing_store), &clock).await;
        let result = failing_pipeline.run_pass().await;
        assert!(matches!(result, Err(PassError::Store(_))));
        assert!(failing_pipeline.list_classified_objects().is_empty());

        let entries = failing_pipeline.recent_log_entries(5);
        assert!(entries[0].contains("classification pass aborted"));
    }

    #[tokio::test]
    async fn test_model_unavailable_aborts_pass() {
        let clock = sim_clock();
        let store = Arc::new(MemoryEventStore::new());
        store.append(&event(&clock, "obj", 50, 100)).await.unwrap();

        // ensure_ready passes (filter), predict fails
        let mut injector = FaultInjector::new(DeterministicRng::new(42));
        injector.register(
            FaultConfig::new(FaultType::ModelUnavailable, 1.0).with_filter("predict"),
        );
        let model = SimTierModel::with_fault_injector(Arc::new(injector));

        let pipeline = TieringPipeline::load_with_time(
            store,
            model,
            PipelineConfig::default(),
            TimeSource::sim(clock.clone()),
        )
        .await
        .unwrap();

        let result = pipeline.run_pass().await;
        assert!(matches!(result, Err(PassError::Classifier(_))));
        assert!(pipeline.list_classified_objects().is_empty());
    }

    #[tokio::test]
    async fn test_bad_label_skips_object_only() {
        let clock = sim_clock();
        let store = Arc::new(MemoryEventStore::new());
        store.append(&event(&clock, "obj_a", 50, 100)).await.unwrap();
        store.append(&event(&clock, "obj_b", 50, 100)).await.unwrap();

        // Invalid labels on the first predict only; both objects get UNKNOWN
        let mut injector = FaultInjector::new(DeterministicRng::new(42));
        injector.register(
            FaultConfig::new(FaultType::ModelInvalidLabel, 1.0)
                .with_filter("predict")
                .with_max_injections(1),
        );
        let model = SimTierModel::with_fault_injector(Arc::new(injector));

        let pipeline = TieringPipeline::load_with_time(
            store,
            model,
            PipelineConfig::default(),
            TimeSource::sim(clock.clone()),
        )
        .await
        .unwrap();

        let outcome = pipeline.run_pass().await.unwrap();
        assert_eq!(outcome.classified, 0);
        assert_eq!(outcome.skipped, 2);

        // Next pass the fault budget is spent and both classify
        let outcome = pipeline.run_pass().await.unwrap();
        assert_eq!(outcome.classified, 2);
        assert_eq!(outcome.skipped, 0);
    }

    /// Model that hangs long enough to blow any small pass budget.
    struct StalledModel;

    #[async_trait::async_trait]
    impl TierModel for StalledModel {
        async fn ensure_ready(&self) -> Result<(), ClassifierError> {
            Ok(())
        }

        async fn predict(
            &self,
            _batch: &[crate::features::FeatureVector],
        ) -> Result<Vec<String>, ClassifierError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Vec::new())
        }

        fn name(&self) -> &str {
            "stalled"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_pass_timeout() {
        let clock = sim_clock();
        let store = Arc::new(MemoryEventStore::new());
        store.append(&event(&clock, "obj", 1, 100)).await.unwrap();

        let config = PipelineConfig::default().with_pass_timeout(Duration::from_millis(50));
        let pipeline = TieringPipeline::load_with_time(
            store,
            StalledModel,
            config,
            TimeSource::sim(clock.clone()),
        )
        .await
        .unwrap();

        let result = pipeline.run_pass().await;
        assert_eq!(result, Err(PassError::Timeout { budget_ms: 50 }));

        let entries = pipeline.recent_log_entries(5);
        assert!(entries[0].contains("timed out"));
    }

    #[tokio::test]
    async fn test_periodic_shutdown() {
        let clock = sim_clock();
        let store = Arc::new(MemoryEventStore::new());
        store.append(&event(&clock, "obj", 50, 100)).await.unwrap();

        let config = PipelineConfig::default().with_pass_interval(Duration::from_millis(5));
        let pipeline = Arc::new(
            TieringPipeline::load_with_time(
                store,
                SimTierModel::new(),
                config,
                TimeSource::sim(clock.clone()),
            )
            .await
            .unwrap(),
        );

        let (tx, rx) = watch::channel(false);
        let runner = {
            let pipeline = Arc::clone(&pipeline);
            tokio::spawn(async move { pipeline.run_periodic(rx).await })
        };

        tokio::time::sleep(Duration::from_millis(30)).await;
        tx.send(true).unwrap();
        runner.await.unwrap();

        assert_eq!(pipeline.list_classified_objects().len(), 1);
    }
}
