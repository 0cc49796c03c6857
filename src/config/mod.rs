//! Configuration module for fraudscore.
//!
//! Ensemble weights, the decision threshold and the bundle location are
//! configuration, not code: the shipped defaults (0.5/0.25/0.25, 0.5)
//! carry no calibration evidence and are meant to be overridden once
//! labeled evaluation data says otherwise.

use crate::application::ensemble::{DEFAULT_DECISION_THRESHOLD, EnsembleWeights};
use anyhow::{Context, Result, bail};
use std::env;
use std::path::PathBuf;

/// Tolerance for the weight-sum check.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Scoring service configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ScoringConfig {
    pub weights: EnsembleWeights,
    pub decision_threshold: f64,
    pub bundle_path: PathBuf,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: EnsembleWeights::default(),
            decision_threshold: DEFAULT_DECISION_THRESHOLD,
            bundle_path: PathBuf::from("data/fraud_bundle.json"),
        }
    }
}

impl ScoringConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = EnsembleWeights::default();
        let config = Self {
            weights: EnsembleWeights {
                classifier: Self::parse_f64("CLASSIFIER_WEIGHT", defaults.classifier)?,
                isolation: Self::parse_f64("ISOLATION_WEIGHT", defaults.isolation)?,
                reconstruction: Self::parse_f64(
                    "RECONSTRUCTION_WEIGHT",
                    defaults.reconstruction,
                )?,
            },
            decision_threshold: Self::parse_f64(
                "DECISION_THRESHOLD",
                DEFAULT_DECISION_THRESHOLD,
            )?,
            bundle_path: PathBuf::from(
                env::var("BUNDLE_PATH").unwrap_or_else(|_| "data/fraud_bundle.json".to_string()),
            ),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let w = &self.weights;
        for (name, value) in [
            ("classifier_weight", w.classifier),
            ("isolation_weight", w.isolation),
            ("reconstruction_weight", w.reconstruction),
        ] {
            if !(0.0..=1.0).contains(&value) {
                bail!("{name} must be within [0, 1], got {value}");
            }
        }
        if (w.sum() - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            bail!(
                "ensemble weights must sum to 1.0, got {} + {} + {} = {}",
                w.classifier,
                w.isolation,
                w.reconstruction,
                w.sum()
            );
        }
        if !(self.decision_threshold > 0.0 && self.decision_threshold < 1.0) {
            bail!(
                "decision_threshold must be within (0, 1), got {}",
                self.decision_threshold
            );
        }
        Ok(())
    }

    fn parse_f64(key: &str, default: f64) -> Result<f64> {
        match env::var(key) {
            Ok(value) => value
                .parse::<f64>()
                .with_context(|| format!("Failed to parse {key} - must be a real number")),
            Err(_) => Ok(default),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ScoringConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.weights.classifier, 0.5);
        assert_eq!(config.weights.isolation, 0.25);
        assert_eq!(config.weights.reconstruction, 0.25);
        assert_eq!(config.decision_threshold, 0.5);
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let mut config = ScoringConfig::default();
        config.weights.classifier = 0.9;

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("sum to 1.0"));
    }

    #[test]
    fn test_weight_out_of_range_is_rejected() {
        let mut config = ScoringConfig::default();
        config.weights.classifier = 1.5;
        config.weights.isolation = -0.25;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_threshold_must_be_strictly_inside_unit_interval() {
        let mut config = ScoringConfig::default();
        config.decision_threshold = 1.0;
        assert!(config.validate().is_err());

        config.decision_threshold = 0.0;
        assert!(config.validate().is_err());

        config.decision_threshold = 0.65;
        assert!(config.validate().is_ok());
    }
}
