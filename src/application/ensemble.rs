//! Combines the three sub-model outputs into one calibrated decision.
//!
//! The classifier already speaks probability; the two anomaly scores are
//! squashed through a sigmoid before weighting. If any sub-model fails the
//! whole call fails; a partial ensemble must never be presented as full
//! ensemble confidence.

use crate::application::models::ModelScorer;
use crate::domain::errors::ScoringError;
use crate::domain::score::ScoreResult;
use serde::{Deserialize, Serialize};

/// Ensemble combination weights. Configuration, not constants: the defaults
/// carry no calibration evidence and must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnsembleWeights {
    pub classifier: f64,
    pub isolation: f64,
    pub reconstruction: f64,
}

impl Default for EnsembleWeights {
    fn default() -> Self {
        Self {
            classifier: 0.5,
            isolation: 0.25,
            reconstruction: 0.25,
        }
    }
}

impl EnsembleWeights {
    pub fn sum(&self) -> f64 {
        self.classifier + self.isolation + self.reconstruction
    }
}

/// Default decision threshold on the combined probability.
pub const DEFAULT_DECISION_THRESHOLD: f64 = 0.5;

/// Stateless per-call scorer over three trained sub-models.
#[derive(Debug, Clone, Copy)]
pub struct ScorerEnsemble {
    weights: EnsembleWeights,
    decision_threshold: f64,
}

impl Default for ScorerEnsemble {
    fn default() -> Self {
        Self::new(EnsembleWeights::default(), DEFAULT_DECISION_THRESHOLD)
    }
}

impl ScorerEnsemble {
    pub fn new(weights: EnsembleWeights, decision_threshold: f64) -> Self {
        Self {
            weights,
            decision_threshold,
        }
    }

    pub fn weights(&self) -> EnsembleWeights {
        self.weights
    }

    pub fn decision_threshold(&self) -> f64 {
        self.decision_threshold
    }

    /// Runs all three sub-models over one scaled vector and combines them.
    pub fn score(
        &self,
        classifier: &dyn ModelScorer,
        isolation: &dyn ModelScorer,
        reconstruction: &dyn ModelScorer,
        features: &[f64],
    ) -> Result<ScoreResult, ScoringError> {
        let fraud_probability_rf = run(classifier, features)?;
        let anomaly_score_if = run(isolation, features)?;
        let anomaly_score_ae = run(reconstruction, features)?;

        let normalized_score_if = sigmoid(anomaly_score_if);
        let normalized_score_ae = sigmoid(anomaly_score_ae);

        let combined_fraud_probability = self.weights.classifier * fraud_probability_rf
            + self.weights.isolation * normalized_score_if
            + self.weights.reconstruction * normalized_score_ae;

        Ok(ScoreResult {
            is_fraud: combined_fraud_probability > self.decision_threshold,
            fraud_probability_rf,
            anomaly_score_if,
            anomaly_score_ae,
            normalized_score_if,
            normalized_score_ae,
            combined_fraud_probability,
        })
    }
}

fn run(model: &dyn ModelScorer, features: &[f64]) -> Result<f64, ScoringError> {
    model
        .score(features)
        .map_err(|reason| ScoringError::ScoringUnavailable {
            model: model.name().to_string(),
            reason,
        })
}

/// Logistic squashing to (0, 1).
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
