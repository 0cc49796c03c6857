/// Interface every trained sub-model exposes to the ensemble.
///
/// A model is an opaque scorer over the scaled feature vector; what the
/// number means (probability, anomaly score, reconstruction error) is the
/// ensemble's business.
pub trait ModelScorer: Send + Sync {
    /// Scores one scaled feature vector.
    fn score(&self, features: &[f64]) -> Result<f64, String>;

    /// Stable model name used in diagnostics and errors.
    fn name(&self) -> &'static str;
}
