//! Reconstruction-based anomaly model.
//!
//! A linear encode/decode pair over the top-k principal components of the
//! training matrix, extracted by power iteration with deflation. The score
//! is the mean squared error between the centered input and its
//! reconstruction; inputs far from the training distribution reconstruct
//! poorly and score high. Fitting is fully deterministic.

use super::scorer::ModelScorer;
use serde::{Deserialize, Serialize};

/// Hyperparameters for fitting the reconstruction model. Fixed, not searched.
#[derive(Debug, Clone, Copy)]
pub struct ReconstructionParams {
    /// Number of principal components kept by the encoder.
    pub components: usize,
}

impl Default for ReconstructionParams {
    fn default() -> Self {
        Self { components: 4 }
    }
}

const POWER_ITERATIONS: usize = 200;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconstructionModel {
    mean: Vec<f64>,
    /// Orthonormal component rows, each of feature length.
    components: Vec<Vec<f64>>,
}

impl ReconstructionModel {
    /// Fits the encoder on scaled feature rows.
    pub fn fit(rows: &[Vec<f64>], params: ReconstructionParams) -> Result<Self, String> {
        let width = rows.first().map(Vec::len).unwrap_or(0);
        if width == 0 {
            return Err("cannot fit reconstruction model on an empty matrix".to_string());
        }

        let n = rows.len() as f64;
        let mean: Vec<f64> = (0..width)
            .map(|col| rows.iter().map(|row| row[col]).sum::<f64>() / n)
            .collect();

        let mut covariance = vec![vec![0.0; width]; width];
        for row in rows {
            for i in 0..width {
                let di = row[i] - mean[i];
                for j in i..width {
                    let dj = row[j] - mean[j];
                    covariance[i][j] += di * dj / n;
                }
            }
        }
        for i in 0..width {
            for j in 0..i {
                covariance[i][j] = covariance[j][i];
            }
        }

        let k = params.components.clamp(1, width);
        let mut components = Vec::with_capacity(k);
        for c in 0..k {
            let (component, eigenvalue) = dominant_eigenvector(&covariance, c);
            if eigenvalue <= f64::EPSILON {
                break;
            }
            deflate(&mut covariance, &component, eigenvalue);
            components.push(component);
        }

        Ok(Self { mean, components })
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Encode to component space, decode back, and report the mean squared
    /// reconstruction error against the centered input.
    fn reconstruction_error(&self, features: &[f64]) -> f64 {
        let width = self.mean.len();
        let centered: Vec<f64> = features
            .iter()
            .zip(self.mean.iter())
            .map(|(x, m)| x - m)
            .collect();

        let mut reconstructed = vec![0.0; width];
        for component in &self.components {
            let coordinate: f64 = component
                .iter()
                .zip(centered.iter())
                .map(|(c, x)| c * x)
                .sum();
            for (r, c) in reconstructed.iter_mut().zip(component.iter()) {
                *r += coordinate * c;
            }
        }

        centered
            .iter()
            .zip(reconstructed.iter())
            .map(|(x, r)| (x - r).powi(2))
            .sum::<f64>()
            / width as f64
    }
}

impl ModelScorer for ReconstructionModel {
    fn score(&self, features: &[f64]) -> Result<f64, String> {
        if features.len() != self.mean.len() {
            return Err(format!(
                "expected {} features, got {}",
                self.mean.len(),
                features.len()
            ));
        }
        Ok(self.reconstruction_error(features))
    }

    fn name(&self) -> &'static str {
        "reconstruction"
    }
}

/// Power iteration with a deterministic, dense starting vector.
fn dominant_eigenvector(matrix: &[Vec<f64>], component_index: usize) -> (Vec<f64>, f64) {
    let width = matrix.len();
    let mut v: Vec<f64> = (0..width)
        .map(|i| ((i + component_index * width + 1) as f64).sin())
        .collect();
    normalize(&mut v);

    for _ in 0..POWER_ITERATIONS {
        let mut next = mat_vec(matrix, &v);
        if normalize(&mut next) == 0.0 {
            break;
        }
        v = next;
    }

    let eigenvalue: f64 = mat_vec(matrix, &v)
        .iter()
        .zip(v.iter())
        .map(|(a, b)| a * b)
        .sum();
    (v, eigenvalue)
}

fn deflate(matrix: &mut [Vec<f64>], component: &[f64], eigenvalue: f64) {
    for (i, row) in matrix.iter_mut().enumerate() {
        for (j, entry) in row.iter_mut().enumerate() {
            *entry -= eigenvalue * component[i] * component[j];
        }
    }
}

fn mat_vec(matrix: &[Vec<f64>], v: &[f64]) -> Vec<f64> {
    matrix
        .iter()
        .map(|row| row.iter().zip(v.iter()).map(|(a, b)| a * b).sum())
        .collect()
}

fn normalize(v: &mut [f64]) -> f64 {
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
    norm
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Points spread along one axis, tight on the other.
    fn line_rows() -> Vec<Vec<f64>> {
        (0..100)
            .map(|i| {
                let t = i as f64 / 10.0;
                vec![t, 0.01 * (i % 3) as f64]
            })
            .collect()
    }

    #[test]
    fn test_point_on_training_manifold_scores_low() {
        let rows = line_rows();
        let model =
            ReconstructionModel::fit(&rows, ReconstructionParams { components: 1 }).unwrap();

        let on_line = model.score(&[5.0, 0.01]).unwrap();
        let off_line = model.score(&[5.0, 40.0]).unwrap();

        assert!(on_line < 0.01, "on-manifold error too large: {on_line}");
        assert!(off_line > on_line * 100.0);
    }

    #[test]
    fn test_training_mean_reconstructs_exactly() {
        let rows = vec![vec![2.0, 4.0], vec![4.0, 8.0], vec![6.0, 12.0]];
        let model =
            ReconstructionModel::fit(&rows, ReconstructionParams { components: 2 }).unwrap();

        let at_mean = model.score(&[4.0, 8.0]).unwrap();
        assert!(at_mean.abs() < 1e-9);
    }

    #[test]
    fn test_fit_is_deterministic() {
        let rows = line_rows();
        let a = ReconstructionModel::fit(&rows, ReconstructionParams::default()).unwrap();
        let b = ReconstructionModel::fit(&rows, ReconstructionParams::default()).unwrap();

        let sample = [3.0, 1.5];
        assert_eq!(a.score(&sample).unwrap(), b.score(&sample).unwrap());
    }

    #[test]
    fn test_wrong_dimension_is_an_error() {
        let model = ReconstructionModel::fit(&line_rows(), ReconstructionParams::default()).unwrap();
        assert!(model.score(&[1.0, 2.0, 3.0]).is_err());
    }

    #[test]
    fn test_serde_round_trip_reproduces_scores() {
        let model = ReconstructionModel::fit(&line_rows(), ReconstructionParams::default()).unwrap();
        let sample = [7.0, 2.0];
        let before = model.score(&sample).unwrap();

        let json = serde_json::to_string(&model).unwrap();
        let restored: ReconstructionModel = serde_json::from_str(&json).unwrap();
        assert_eq!(before, restored.score(&sample).unwrap());
    }
}
