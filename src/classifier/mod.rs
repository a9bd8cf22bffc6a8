//! Tier Classification - turn feature vectors into tier decisions
//!
//! `TigerStyle`: The model is behind a trait so a deterministic simulation
//! stands in for the real thing in tests. The adapter owns the contract:
//! batch pairing by position, label domain checks, fail-fast load.

mod sim;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::features::FeatureVector;

pub use sim::SimTierModel;

// =============================================================================
// Tier
// =============================================================================

/// A storage tier decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    /// Frequently accessed, latency-sensitive
    Hot,
    /// Moderate access
    Warm,
    /// Rarely accessed, archival
    Cold,
}

impl Tier {
    /// Canonical uppercase label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hot => "HOT",
            Self::Warm => "WARM",
            Self::Cold => "COLD",
        }
    }

    /// Parse a model label, case-insensitively.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "HOT" => Some(Self::Hot),
            "WARM" => Some(Self::Warm),
            "COLD" => Some(Self::Cold),
            _ => None,
        }
    }

    /// All tiers.
    #[must_use]
    pub fn all() -> [Self; 3] {
        [Self::Hot, Self::Warm, Self::Cold]
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Errors from classification.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassifierError {
    /// The model could not be loaded or reached
    #[error("model unavailable: {message}")]
    ModelUnavailable {
        /// Error detail
        message: String,
    },

    /// The model returned a different number of labels than inputs
    #[error("batch length mismatch: sent {expected} vectors, got {got} labels")]
    BatchLengthMismatch {
        /// Vectors sent
        expected: usize,
        /// Labels received
        got: usize,
    },

    /// The model returned a label outside the tier domain
    #[error("model returned out-of-domain label {label:?} for {object_id}")]
    Contract {
        /// The affected object
        object_id: String,
        /// The offending label
        label: String,
    },
}

impl ClassifierError {
    /// Create a model-unavailable error.
    #[must_use]
    pub fn model_unavailable(message: impl Into<String>) -> Self {
        Self::ModelUnavailable {
            message: message.into(),
        }
    }
}

// =============================================================================
// TierModel
// =============================================================================

/// A trained tier prediction model.
///
/// `predict` takes a batch and returns one raw label per input, in order.
/// Labels are opaque strings here; the adapter maps them into [`Tier`].
#[async_trait]
pub trait TierModel: Send + Sync {
    /// Verify the model is loaded and usable.
    ///
    /// # Errors
    /// Returns [`ClassifierError::ModelUnavailable`] if not.
    async fn ensure_ready(&self) -> Result<(), ClassifierError>;

    /// Predict one raw label per feature vector, positionally.
    ///
    /// # Errors
    /// Returns [`ClassifierError::ModelUnavailable`] if inference fails.
    async fn predict(&self, batch: &[FeatureVector]) -> Result<Vec<String>, ClassifierError>;

    /// Human-readable model name for logs.
    fn name(&self) -> &str;
}

// =============================================================================
// ClassifierAdapter
// =============================================================================

/// Wraps a [`TierModel`] and enforces the classification contract.
#[derive(Debug, Clone)]
pub struct ClassifierAdapter<M> {
    model: M,
}

impl<M: TierModel> ClassifierAdapter<M> {
    /// Load the adapter, verifying the model is ready.
    ///
    /// Fail-fast: a missing model is a startup error, not something to
    /// discover on the first pass.
    ///
    /// # Errors
    /// Returns [`ClassifierError::ModelUnavailable`] if the model is not
    /// usable.
    pub async fn load(model: M) -> Result<Self, ClassifierError> {
        model.ensure_ready().await?;
        Ok(Self { model })
    }

    /// Classify a batch of feature vectors.
    ///
    /// The outer `Result` is the batch: `Err` means no decision was made
    /// for any input (model down, length mismatch). The inner per-row
    /// `Result` carries out-of-domain labels as [`ClassifierError::Contract`]
    /// so one bad row never discards its neighbors' decisions.
    ///
    /// # Errors
    /// Returns [`ClassifierError::ModelUnavailable`] or
    /// [`ClassifierError::BatchLengthMismatch`] for batch-level failures.
    pub async fn classify(
        &self,
        batch: &[FeatureVector],
    ) -> Result<Vec<Result<Tier, ClassifierError>>, ClassifierError> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let labels = self.model.predict(batch).await?;
        if labels.len() != batch.len() {
            return Err(ClassifierError::BatchLengthMismatch {
                expected: batch.len(),
                got: labels.len(),
            });
        }

        let decisions = batch
            .iter()
            .zip(labels)
            .map(|(vector, label)| {
                Tier::parse(&label).ok_or_else(|| {
                    warn!(
                        object_id = %vector.object_id,
                        label = %label,
                        model = self.model.name(),
                        "out-of-domain model label"
                    );
                    ClassifierError::Contract {
                        object_id: vector.object_id.clone(),
                        label,
                    }
                })
            })
            .collect();

        Ok(decisions)
    }

    /// The wrapped model's name.
    #[must_use]
    pub fn model_name(&self) -> &str {
        self.model.name()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedModel {
        labels: Vec<String>,
        ready: bool,
    }

    #[async_trait]
    impl TierModel for FixedModel {
        async fn ensure_ready(&self) -> Result<(), ClassifierError> {
            if self.ready {
                Ok(())
            } else {
                Err(ClassifierError::model_unavailable("model file missing"))
            }
        }

        async fn predict(&self, _batch: &[FeatureVector]) -> Result<Vec<String>, ClassifierError> {
            Ok(self.labels.clone())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn vectors(count: usize) -> Vec<FeatureVector> {
        (0..count)
            .map(|i| FeatureVector::zeroed(format!("OBJ_{i:04}")))
            .collect()
    }

    #[test]
    fn test_tier_parse_case_insensitive() {
        assert_eq!(Tier::parse("hot"), Some(Tier::Hot));
        assert_eq!(Tier::parse("Warm"), Some(Tier::Warm));
        assert_eq!(Tier::parse(" COLD "), Some(Tier::Cold));
        assert_eq!(Tier::parse("LUKEWARM"), None);
        assert_eq!(Tier::parse(""), None);
    }

    #[test]
    fn test_tier_display_round_trip() {
        for tier in Tier::all() {
            assert_eq!(Tier::parse(&tier.to_string()), Some(tier));
        }
    }

    #[tokio::test]
    async fn test_load_fails_fast_when_model_missing() {
        let result = ClassifierAdapter::load(FixedModel {
            labels: vec![],
            ready: false,
        })
        .await;
        assert!(matches!(
            result,
            Err(ClassifierError::ModelUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_classify_pairs_by_position() {
        let adapter = ClassifierAdapter::load(FixedModel {
            labels: vec!["HOT".into(), "COLD".into()],
            ready: true,
        })
        .await
        .unwrap();

        let decisions = adapter.classify(&vectors(2)).await.unwrap();
        assert_eq!(decisions[0], Ok(Tier::Hot));
        assert_eq!(decisions[1], Ok(Tier::Cold));
    }

    #[tokio::test]
    async fn test_classify_empty_batch() {
        let adapter = ClassifierAdapter::load(FixedModel {
            labels: vec![],
            ready: true,
        })
        .await
        .unwrap();

        assert!(adapter.classify(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_length_mismatch_is_batch_error() {
        let adapter = ClassifierAdapter::load(FixedModel {
            labels: vec!["HOT".into()],
            ready: true,
        })
        .await
        .unwrap();

        let result = adapter.classify(&vectors(3)).await;
        assert_eq!(
            result,
            Err(ClassifierError::BatchLengthMismatch {
                expected: 3,
                got: 1
            })
        );
    }

    #[tokio::test]
    async fn test_bad_label_is_row_error_only() {
        let adapter = ClassifierAdapter::load(FixedModel {
            labels: vec!["HOT".into(), "TEPID".into(), "COLD".into()],
            ready: true,
        })
        .await
        .unwrap();

        let decisions = adapter.classify(&vectors(3)).await.unwrap();
        assert_eq!(decisions[0], Ok(Tier::Hot));
        assert!(matches!(
            decisions[1],
            Err(ClassifierError::Contract { ref label, .. }) if label == "TEPID"
        ));
        assert_eq!(decisions[2], Ok(Tier::Cold));
    }
}
