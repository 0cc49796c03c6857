use std::path::PathBuf;
use thiserror::Error;

/// Errors raised on the per-call scoring path
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("Invalid input: {reason}")]
    InputValidation { reason: String },

    #[error(
        "Feature set does not match persisted feature order: missing {missing:?}, unexpected {unexpected:?}"
    )]
    ConfigurationMismatch {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    #[error("Feature vector length {actual} does not match persisted statistics length {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Sub-model '{model}' failed to produce a score: {reason}")]
    ScoringUnavailable { model: String, reason: String },

    #[error("Unknown categorical field: {field}")]
    UnknownField { field: String },
}

/// Errors raised when loading or saving an artifact bundle
#[derive(Debug, Error)]
pub enum BundleError {
    #[error("Artifact bundle not found at {path:?}")]
    NotFound { path: PathBuf },

    #[error("Artifact bundle corrupt: {reason}")]
    Corrupt { reason: String },

    #[error("Artifact bundle I/O failure: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_mismatch_formatting() {
        let err = ScoringError::ConfigurationMismatch {
            missing: vec!["merchant".to_string()],
            unexpected: vec!["merchnat".to_string()],
        };

        let msg = err.to_string();
        assert!(msg.contains("merchant"));
        assert!(msg.contains("merchnat"));
    }

    #[test]
    fn test_dimension_mismatch_formatting() {
        let err = ScoringError::DimensionMismatch {
            expected: 14,
            actual: 13,
        };

        let msg = err.to_string();
        assert!(msg.contains("14"));
        assert!(msg.contains("13"));
    }
}
