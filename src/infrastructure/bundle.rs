//! Artifact bundle persistence.
//!
//! The bundle is the versioned, immutable snapshot of everything a scoring
//! process needs: encoders, scaler statistics, the persisted feature order
//! and the three trained models, serialized as one JSON document. Saving is
//! temp-file-then-rename so a concurrently running loader never observes a
//! partially written bundle; loading validates cross-component consistency
//! eagerly so a bad deployment fails at startup, not on the first call.

use crate::application::encoding::EncoderRegistry;
use crate::application::models::{ForestClassifier, IsolationForestModel, ReconstructionModel};
use crate::application::scaler::ScalerStats;
use crate::domain::errors::BundleError;
use crate::domain::features::FEATURE_ORDER;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// Bump on any incompatible change to the bundle layout.
pub const BUNDLE_SCHEMA_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
pub struct ArtifactBundle {
    pub schema_version: u32,
    pub created_at: DateTime<Utc>,
    pub feature_order: Vec<String>,
    pub encoders: EncoderRegistry,
    pub scaler: ScalerStats,
    pub classifier: ForestClassifier,
    pub isolation: IsolationForestModel,
    pub reconstruction: ReconstructionModel,
}

impl ArtifactBundle {
    /// Writes the full snapshot atomically (temp file, then rename).
    pub fn save(&self, path: &Path) -> Result<(), BundleError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string(self).map_err(|e| BundleError::Corrupt {
            reason: format!("serialization failed: {e}"),
        })?;

        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, content)?;
        fs::rename(&temp_path, path)?;

        info!(path = %path.display(), "Saved artifact bundle");
        Ok(())
    }

    /// Loads and eagerly validates a bundle.
    pub fn load(path: &Path) -> Result<Self, BundleError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(BundleError::NotFound {
                    path: path.to_path_buf(),
                });
            }
            Err(e) => return Err(BundleError::Io(e)),
        };

        let bundle: ArtifactBundle =
            serde_json::from_str(&content).map_err(|e| BundleError::Corrupt {
                reason: format!("deserialization failed: {e}"),
            })?;
        bundle.validate()?;

        info!(
            path = %path.display(),
            created_at = %bundle.created_at,
            features = bundle.feature_order.len(),
            "Loaded artifact bundle"
        );
        Ok(bundle)
    }

    /// Cross-component consistency, checked at load time.
    pub fn validate(&self) -> Result<(), BundleError> {
        if self.schema_version != BUNDLE_SCHEMA_VERSION {
            return Err(corrupt(format!(
                "unsupported schema version {} (expected {})",
                self.schema_version, BUNDLE_SCHEMA_VERSION
            )));
        }

        // The scaler statistics and the models are positionally bound to the
        // order used at fit time, so the persisted list must match element
        // for element. A permuted list would pass a set comparison and then
        // score silently misaligned.
        if self
            .feature_order
            .iter()
            .map(String::as_str)
            .ne(FEATURE_ORDER.iter().copied())
        {
            return Err(corrupt(
                "feature order does not match the scoring vocabulary".to_string(),
            ));
        }

        let width = self.feature_order.len();
        if self.scaler.len() != width {
            return Err(corrupt(format!(
                "scaler statistics length {} does not match feature order length {}",
                self.scaler.len(),
                width
            )));
        }
        if self.classifier.n_features() != width {
            return Err(corrupt(format!(
                "classifier expects {} features, feature order has {}",
                self.classifier.n_features(),
                width
            )));
        }
        if self.isolation.n_features() != width {
            return Err(corrupt(format!(
                "isolation model expects {} features, feature order has {}",
                self.isolation.n_features(),
                width
            )));
        }
        if self.reconstruction.n_features() != width {
            return Err(corrupt(format!(
                "reconstruction model expects {} features, feature order has {}",
                self.reconstruction.n_features(),
                width
            )));
        }

        if !self.encoders.covers_categorical_fields() {
            let present: Vec<&str> = self.encoders.field_names().collect();
            return Err(corrupt(format!(
                "encoder registry does not cover the categorical fields (has {present:?})"
            )));
        }

        Ok(())
    }
}

fn corrupt(reason: String) -> BundleError {
    BundleError::Corrupt { reason }
}
