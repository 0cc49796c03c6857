//! Supervised fraud classifier backed by a smartcore random forest.
//!
//! The forest is a regressor fitted on 0/1 fraud labels: the mean of the
//! trees' votes, clamped to [0, 1], is the positive-class probability. The
//! model serializes through serde_json like every other bundle component.

use super::scorer::ModelScorer;
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;

/// Hyperparameters for fitting the classifier. Fixed, not searched.
#[derive(Debug, Clone, Copy)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: u16,
    pub min_samples_split: usize,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            min_samples_split: 5,
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct ForestClassifier {
    n_features: usize,
    model: RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>,
}

impl ForestClassifier {
    /// Fits the forest on scaled feature rows and 0/1 fraud labels.
    pub fn fit(rows: &[Vec<f64>], labels: &[f64], params: ForestParams) -> Result<Self, String> {
        let n_features = rows.first().map(Vec::len).unwrap_or(0);
        if n_features == 0 || rows.len() != labels.len() {
            return Err(format!(
                "invalid training shape: {} rows x {} features, {} labels",
                rows.len(),
                n_features,
                labels.len()
            ));
        }

        let x = DenseMatrix::from_2d_vec(&rows.to_vec())
            .map_err(|e| format!("matrix creation failed: {e}"))?;
        let forest_params = RandomForestRegressorParameters::default()
            .with_n_trees(params.n_trees)
            .with_max_depth(params.max_depth)
            .with_min_samples_split(params.min_samples_split);

        let model = RandomForestRegressor::fit(&x, &labels.to_vec(), forest_params)
            .map_err(|e| format!("training failed: {e}"))?;

        Ok(Self { n_features, model })
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }
}

impl ModelScorer for ForestClassifier {
    fn score(&self, features: &[f64]) -> Result<f64, String> {
        if features.len() != self.n_features {
            return Err(format!(
                "expected {} features, got {}",
                self.n_features,
                features.len()
            ));
        }

        let input = DenseMatrix::from_2d_vec(&vec![features.to_vec()])
            .map_err(|e| format!("matrix creation failed: {e}"))?;
        let predictions = self
            .model
            .predict(&input)
            .map_err(|e| format!("prediction failed: {e}"))?;

        let raw = predictions
            .first()
            .copied()
            .ok_or_else(|| "no prediction returned".to_string())?;
        if !raw.is_finite() {
            return Err(format!("non-finite prediction: {raw}"));
        }

        Ok(raw.clamp(0.0, 1.0))
    }

    fn name(&self) -> &'static str {
        "random_forest"
    }
}
