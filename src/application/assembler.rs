//! Orders named feature values into the persisted feature vector.
//!
//! The feature order is data that travels with the artifact bundle, not code:
//! a silently reordered vector produces plausible-looking but wrong scores,
//! so any mismatch between the assembled name set and the persisted order
//! fails loudly with both differences spelled out.

use crate::domain::errors::ScoringError;
use std::collections::HashMap;

/// Assembles a fixed-order vector from named feature values.
#[derive(Debug, Clone, Copy)]
pub struct FeatureVectorAssembler<'a> {
    feature_order: &'a [String],
}

impl<'a> FeatureVectorAssembler<'a> {
    pub fn new(feature_order: &'a [String]) -> Self {
        Self { feature_order }
    }

    pub fn len(&self) -> usize {
        self.feature_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feature_order.is_empty()
    }

    /// Orders `named` per the persisted feature order.
    ///
    /// Fails with [`ScoringError::ConfigurationMismatch`] when the assembled
    /// name set is not exactly the persisted set, extra and missing names
    /// both included.
    pub fn assemble(&self, named: &HashMap<String, f64>) -> Result<Vec<f64>, ScoringError> {
        let missing: Vec<String> = self
            .feature_order
            .iter()
            .filter(|name| !named.contains_key(*name))
            .cloned()
            .collect();
        let unexpected: Vec<String> = {
            let mut extras: Vec<String> = named
                .keys()
                .filter(|name| !self.feature_order.contains(name))
                .cloned()
                .collect();
            extras.sort_unstable();
            extras
        };

        if !missing.is_empty() || !unexpected.is_empty() {
            return Err(ScoringError::ConfigurationMismatch {
                missing,
                unexpected,
            });
        }

        Ok(self
            .feature_order
            .iter()
            .map(|name| named[name])
            .collect())
    }
}
