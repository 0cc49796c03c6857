use serde::{Deserialize, Serialize};

/// Full per-call scoring output.
///
/// Carries every raw and normalized sub-model value alongside the combined
/// probability so operators can audit which sub-model drove a flag. Never
/// persisted; constructed once per inference call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub is_fraud: bool,
    /// Positive-class probability from the supervised classifier.
    pub fraud_probability_rf: f64,
    /// Raw isolation anomaly score (larger = more anomalous).
    pub anomaly_score_if: f64,
    /// Raw mean squared reconstruction error.
    pub anomaly_score_ae: f64,
    /// Sigmoid-normalized isolation contribution in [0, 1].
    pub normalized_score_if: f64,
    /// Sigmoid-normalized reconstruction contribution in [0, 1].
    pub normalized_score_ae: f64,
    pub combined_fraud_probability: f64,
}

impl ScoreResult {
    /// Copy with every float rounded to 4 decimal places, the precision of
    /// the external response contract.
    pub fn rounded(&self) -> ScoreResult {
        ScoreResult {
            is_fraud: self.is_fraud,
            fraud_probability_rf: round4(self.fraud_probability_rf),
            anomaly_score_if: round4(self.anomaly_score_if),
            anomaly_score_ae: round4(self.anomaly_score_ae),
            normalized_score_if: round4(self.normalized_score_if),
            normalized_score_ae: round4(self.normalized_score_ae),
            combined_fraud_probability: round4(self.combined_fraud_probability),
        }
    }
}

/// Rounds to 4 decimal places.
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
