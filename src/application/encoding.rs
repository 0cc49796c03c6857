//! Categorical encoding with a stable "unseen value" convention.
//!
//! Codes are dense integers `0..N-1` assigned in sorted order of the distinct
//! training values, so two independent fits over the same multiset produce
//! identical mappings. Any value unseen at training time encodes to the
//! sentinel code `N` (one past the last valid code) for every field; unseen
//! values are expected input, never an error.

use crate::domain::errors::ScoringError;
use crate::domain::features::CATEGORICAL_FIELDS;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Immutable label→code mapping for one categorical column.
///
/// The code of a value is its position in the sorted distinct-value list, so
/// lookup is a binary search and the persisted form is just that list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedField {
    classes: Vec<String>,
}

impl EncodedField {
    /// Fits a mapping over the observed training values of one column.
    pub fn fit<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut classes: Vec<String> = values
            .into_iter()
            .map(|v| v.as_ref().to_string())
            .collect();
        classes.sort_unstable();
        classes.dedup();
        Self { classes }
    }

    /// Returns the trained code, or the sentinel for an unseen value.
    pub fn encode(&self, value: &str) -> u32 {
        match self.classes.binary_search_by(|c| c.as_str().cmp(value)) {
            Ok(code) => code as u32,
            Err(_) => self.sentinel(),
        }
    }

    /// The reserved "unknown category" code: one past the last valid code.
    pub fn sentinel(&self) -> u32 {
        self.classes.len() as u32
    }

    /// Number of distinct training-time values.
    pub fn cardinality(&self) -> usize {
        self.classes.len()
    }
}

/// One trained encoder per categorical column.
///
/// The field set is closed: asking for a field outside
/// [`CATEGORICAL_FIELDS`] is a configuration error at the call site, not an
/// encoding concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncoderRegistry {
    fields: BTreeMap<String, EncodedField>,
}

impl EncoderRegistry {
    /// Fits one encoder per column from the training column values.
    pub fn fit(columns: &BTreeMap<String, Vec<String>>) -> Self {
        let fields = columns
            .iter()
            .map(|(name, values)| (name.clone(), EncodedField::fit(values)))
            .collect();
        Self { fields }
    }

    /// Encodes `value` for `field`, with the sentinel for unseen values.
    pub fn encode(&self, field: &str, value: &str) -> Result<u32, ScoringError> {
        match self.fields.get(field) {
            Some(encoder) => Ok(encoder.encode(value)),
            None => Err(ScoringError::UnknownField {
                field: field.to_string(),
            }),
        }
    }

    pub fn field(&self, name: &str) -> Option<&EncodedField> {
        self.fields.get(name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// True when the registry carries exactly the closed categorical set.
    pub fn covers_categorical_fields(&self) -> bool {
        self.fields.len() == CATEGORICAL_FIELDS.len()
            && CATEGORICAL_FIELDS
                .iter()
                .all(|field| self.fields.contains_key(*field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_assigns_dense_sorted_codes() {
        let field = EncodedField::fit(["online", "atm", "pos", "atm"]);

        assert_eq!(field.cardinality(), 3);
        assert_eq!(field.encode("atm"), 0);
        assert_eq!(field.encode("online"), 1);
        assert_eq!(field.encode("pos"), 2);
    }

    #[test]
    fn test_two_fits_over_same_multiset_agree() {
        let a = EncodedField::fit(["x", "y", "z", "y"]);
        let b = EncodedField::fit(["z", "y", "x", "x"]);

        for value in ["x", "y", "z", "never_seen"] {
            assert_eq!(a.encode(value), b.encode(value));
        }
    }

    #[test]
    fn test_unseen_value_encodes_to_sentinel() {
        let field = EncodedField::fit(["a", "b", "c"]);

        assert_eq!(field.sentinel(), 3);
        assert_eq!(field.encode("d"), 3);
        // Repeated calls stay deterministic.
        assert_eq!(field.encode("d"), 3);
    }

    #[test]
    fn test_encode_is_stable_across_calls() {
        let field = EncodedField::fit(["alpha", "beta"]);
        for _ in 0..3 {
            assert_eq!(field.encode("alpha"), 0);
            assert_eq!(field.encode("beta"), 1);
        }
    }

    #[test]
    fn test_registry_rejects_unknown_field() {
        let mut columns = BTreeMap::new();
        columns.insert("merchant".to_string(), vec!["acme".to_string()]);
        let registry = EncoderRegistry::fit(&columns);

        let err = registry.encode("merchnat", "acme").unwrap_err();
        assert!(matches!(err, ScoringError::UnknownField { .. }));
    }

    #[test]
    fn test_registry_survives_serde_round_trip() {
        let mut columns = BTreeMap::new();
        for field in CATEGORICAL_FIELDS {
            columns.insert(
                field.to_string(),
                vec!["a".to_string(), "b".to_string(), "c".to_string()],
            );
        }
        let registry = EncoderRegistry::fit(&columns);

        let json = serde_json::to_string(&registry).unwrap();
        let restored: EncoderRegistry = serde_json::from_str(&json).unwrap();

        assert!(restored.covers_categorical_fields());
        assert_eq!(restored.encode("merchant", "b").unwrap(), 1);
        assert_eq!(restored.encode("merchant", "unseen").unwrap(), 3);
    }
}
