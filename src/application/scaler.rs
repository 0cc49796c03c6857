//! Z-score normalization with training-time statistics.
//!
//! Statistics are fitted once over the training matrix and then frozen; the
//! inference path only ever applies them. Standard deviation is floored to
//! [`STD_EPSILON`] at application time so constant features never divide by
//! zero.

use crate::domain::errors::ScoringError;
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Distribution};

/// Floor for per-feature standard deviation.
pub const STD_EPSILON: f64 = 1e-8;

/// Per-feature (mean, standard deviation) pairs in feature order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerStats {
    means: Vec<f64>,
    stds: Vec<f64>,
}

impl ScalerStats {
    /// Fits column statistics over the training feature matrix.
    ///
    /// Rows must all share the same length; the matrix must be non-empty.
    pub fn fit(matrix: &[Vec<f64>]) -> Self {
        let width = matrix.first().map(Vec::len).unwrap_or(0);
        let mut means = Vec::with_capacity(width);
        let mut stds = Vec::with_capacity(width);

        for col in 0..width {
            let column: Vec<f64> = matrix.iter().map(|row| row[col]).collect();
            let data = Data::new(column);
            means.push(data.mean().unwrap_or(0.0));
            // Sample std dev; None for a single observation.
            stds.push(data.std_dev().unwrap_or(0.0));
        }

        Self { means, stds }
    }

    pub fn len(&self) -> usize {
        self.means.len()
    }

    pub fn is_empty(&self) -> bool {
        self.means.is_empty()
    }

    /// Applies `(x - mean) / max(std, STD_EPSILON)` elementwise.
    pub fn transform(&self, vector: &[f64]) -> Result<Vec<f64>, ScoringError> {
        if vector.len() != self.means.len() {
            return Err(ScoringError::DimensionMismatch {
                expected: self.means.len(),
                actual: vector.len(),
            });
        }

        Ok(vector
            .iter()
            .zip(self.means.iter().zip(self.stds.iter()))
            .map(|(x, (mean, std))| (x - mean) / std.max(STD_EPSILON))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_at_training_mean_scales_to_zero() {
        let matrix = vec![vec![1.0, 10.0], vec![3.0, 20.0], vec![5.0, 30.0]];
        let stats = ScalerStats::fit(&matrix);

        let scaled = stats.transform(&[3.0, 20.0]).unwrap();
        assert!(scaled[0].abs() < 1e-12);
        assert!(scaled[1].abs() < 1e-12);
    }

    #[test]
    fn test_zero_variance_feature_never_raises() {
        let matrix = vec![vec![7.0], vec![7.0], vec![7.0]];
        let stats = ScalerStats::fit(&matrix);

        let scaled = stats.transform(&[9.0]).unwrap();
        assert!(scaled[0].is_finite());
        assert!(scaled[0] > 0.0);
    }

    #[test]
    fn test_dimension_mismatch_is_rejected() {
        let matrix = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
        let stats = ScalerStats::fit(&matrix);

        let err = stats.transform(&[1.0]).unwrap_err();
        assert!(matches!(
            err,
            ScoringError::DimensionMismatch {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_transform_is_pure() {
        let matrix = vec![vec![0.0], vec![2.0]];
        let stats = ScalerStats::fit(&matrix);

        let a = stats.transform(&[5.0]).unwrap();
        let b = stats.transform(&[5.0]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_round_trip_preserves_stats() {
        let matrix = vec![vec![1.0, 5.0], vec![2.0, 7.0], vec![4.0, 8.0]];
        let stats = ScalerStats::fit(&matrix);

        let json = serde_json::to_string(&stats).unwrap();
        let restored: ScalerStats = serde_json::from_str(&json).unwrap();
        assert_eq!(stats, restored);
    }
}
