//! Isolation-forest anomaly model.
//!
//! Classic isolation trees: each tree recursively splits on a random feature
//! at a random threshold between the partition's min and max, down to a
//! height limit of ceil(log2(sample_size)). Points isolated in few splits
//! are anomalous. The exposed score is `s - 0.5` where `s` is the standard
//! anomaly score in (0, 1), so larger means more anomalous and inliers sit
//! near or below zero, matching the sign convention of the ensemble.

use super::scorer::ModelScorer;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Hyperparameters for fitting the isolation forest. Fixed, not searched.
#[derive(Debug, Clone, Copy)]
pub struct IsolationParams {
    pub n_trees: usize,
    pub sample_size: usize,
    pub seed: u64,
}

impl Default for IsolationParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            sample_size: 256,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum IsoNode {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<IsoNode>,
        right: Box<IsoNode>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsolationForestModel {
    n_features: usize,
    sample_size: usize,
    trees: Vec<IsoNode>,
}

impl IsolationForestModel {
    /// Fits the forest on scaled feature rows. Deterministic for a fixed
    /// seed, so retraining over identical data yields identical trees.
    pub fn fit(rows: &[Vec<f64>], params: IsolationParams) -> Result<Self, String> {
        let n_features = rows.first().map(Vec::len).unwrap_or(0);
        if n_features == 0 {
            return Err("cannot fit isolation forest on an empty matrix".to_string());
        }

        let sample_size = params.sample_size.min(rows.len()).max(2);
        let height_limit = (sample_size as f64).log2().ceil() as usize;
        let mut rng = StdRng::seed_from_u64(params.seed);

        let trees = (0..params.n_trees.max(1))
            .map(|_| {
                let sample = Self::draw_sample(rows, sample_size, &mut rng);
                Self::build_tree(&sample, 0, height_limit, &mut rng)
            })
            .collect();

        Ok(Self {
            n_features,
            sample_size,
            trees,
        })
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    fn draw_sample<'a>(
        rows: &'a [Vec<f64>],
        sample_size: usize,
        rng: &mut StdRng,
    ) -> Vec<&'a [f64]> {
        if rows.len() <= sample_size {
            return rows.iter().map(Vec::as_slice).collect();
        }
        rand::seq::index::sample(rng, rows.len(), sample_size)
            .iter()
            .map(|i| rows[i].as_slice())
            .collect()
    }

    fn build_tree(rows: &[&[f64]], depth: usize, height_limit: usize, rng: &mut StdRng) -> IsoNode {
        if depth >= height_limit || rows.len() <= 1 {
            return IsoNode::Leaf { size: rows.len() };
        }

        let feature = rng.random_range(0..rows[0].len());
        let (min, max) = rows.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |acc, row| {
            (acc.0.min(row[feature]), acc.1.max(row[feature]))
        });
        if !(max > min) {
            // Constant partition along the chosen feature.
            return IsoNode::Leaf { size: rows.len() };
        }

        let threshold = rng.random_range(min..max);
        let (left, right): (Vec<&[f64]>, Vec<&[f64]>) = rows
            .iter()
            .copied()
            .partition(|row| row[feature] < threshold);
        if left.is_empty() || right.is_empty() {
            return IsoNode::Leaf { size: rows.len() };
        }

        IsoNode::Split {
            feature,
            threshold,
            left: Box::new(Self::build_tree(&left, depth + 1, height_limit, rng)),
            right: Box::new(Self::build_tree(&right, depth + 1, height_limit, rng)),
        }
    }

    fn path_length(node: &IsoNode, features: &[f64], depth: f64) -> f64 {
        match node {
            IsoNode::Leaf { size } => depth + average_path_length(*size),
            IsoNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if features[*feature] < *threshold {
                    Self::path_length(left, features, depth + 1.0)
                } else {
                    Self::path_length(right, features, depth + 1.0)
                }
            }
        }
    }
}

impl ModelScorer for IsolationForestModel {
    fn score(&self, features: &[f64]) -> Result<f64, String> {
        if features.len() != self.n_features {
            return Err(format!(
                "expected {} features, got {}",
                self.n_features,
                features.len()
            ));
        }

        let mean_path: f64 = self
            .trees
            .iter()
            .map(|tree| Self::path_length(tree, features, 0.0))
            .sum::<f64>()
            / self.trees.len() as f64;

        let normalizer = average_path_length(self.sample_size);
        let anomaly = 2f64.powf(-mean_path / normalizer);
        // Center so inliers fall near or below zero.
        Ok(anomaly - 0.5)
    }

    fn name(&self) -> &'static str {
        "isolation_forest"
    }
}

const EULER_MASCHERONI: f64 = 0.577_215_664_901_532_9;

/// Expected path length of an unsuccessful BST search over `n` points.
fn average_path_length(n: usize) -> f64 {
    if n <= 1 {
        return 0.0;
    }
    let n = n as f64;
    2.0 * ((n - 1.0).ln() + EULER_MASCHERONI) - 2.0 * (n - 1.0) / n
}
