//! Simulated tier model
//!
//! Deterministic rule-based stand-in for the trained model. The rules mirror
//! the decision boundaries the real model learns, so simulation runs produce
//! plausible tier mixes.

use std::sync::Arc;

use async_trait::async_trait;

use super::{ClassifierError, Tier, TierModel};
use crate::constants::{
    SIM_MODEL_COLD_READS_MAX, SIM_MODEL_COLD_RECENCY_DAYS_MIN, SIM_MODEL_HOT_LATENCY_MS_MAX,
    SIM_MODEL_HOT_READS_MIN,
};
use crate::dst::{FaultInjector, FaultType};
use crate::features::FeatureVector;

/// Deterministic rule-based tier model for simulation and tests.
///
/// Rules, in precedence order:
/// 1. COLD when recency and read count both look dormant
/// 2. HOT when reads are heavy or the latency requirement is tight
/// 3. WARM otherwise
#[derive(Debug, Clone, Default)]
pub struct SimTierModel {
    faults: Option<Arc<FaultInjector>>,
}

impl SimTierModel {
    /// Create a sim model with no fault injection.
    #[must_use]
    pub fn new() -> Self {
        Self { faults: None }
    }

    /// Create a sim model that consults the given fault injector.
    #[must_use]
    pub fn with_fault_injector(faults: Arc<FaultInjector>) -> Self {
        Self {
            faults: Some(faults),
        }
    }

    fn rule_label(vector: &FeatureVector) -> Tier {
        if vector.recency_days >= SIM_MODEL_COLD_RECENCY_DAYS_MIN
            && vector.reads_last_7d <= SIM_MODEL_COLD_READS_MAX
        {
            return Tier::Cold;
        }
        if vector.reads_last_7d >= SIM_MODEL_HOT_READS_MIN
            || vector.latency_requirement_ms <= SIM_MODEL_HOT_LATENCY_MS_MAX
        {
            return Tier::Hot;
        }
        Tier::Warm
    }
}

#[async_trait]
impl TierModel for SimTierModel {
    async fn ensure_ready(&self) -> Result<(), ClassifierError> {
        if let Some(ref faults) = self.faults {
            if faults.should_inject("ensure_ready") == Some(FaultType::ModelUnavailable) {
                return Err(ClassifierError::model_unavailable("injected fault"));
            }
        }
        Ok(())
    }

    async fn predict(&self, batch: &[FeatureVector]) -> Result<Vec<String>, ClassifierError> {
        if let Some(ref faults) = self.faults {
            match faults.should_inject("predict") {
                Some(FaultType::ModelUnavailable) => {
                    return Err(ClassifierError::model_unavailable("injected fault"));
                }
                Some(FaultType::ModelInvalidLabel) => {
                    return Ok(batch.iter().map(|_| "UNKNOWN".to_string()).collect());
                }
                _ => {}
            }
        }

        Ok(batch
            .iter()
            .map(|vector| Self::rule_label(vector).as_str().to_string())
            .collect())
    }

    fn name(&self) -> &str {
        "sim-rule-model"
    }
}

// =============================================================================
// Tests
// =============================================================================
