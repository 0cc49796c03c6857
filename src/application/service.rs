//! Long-lived scoring service.
//!
//! Holds the immutable artifact bundle behind an `Arc` that every call
//! snapshots exactly once, so concurrent scoring shares no mutable state and
//! a reload swaps the whole bundle atomically. A call sees the old bundle
//! in full or the new one in full, never a mix. Construction is fail-fast:
//! without a valid bundle there is no service, and `is_ready` reports that
//! to whoever fronts this with a health endpoint.

use crate::application::assembler::FeatureVectorAssembler;
use crate::application::ensemble::ScorerEnsemble;
use crate::application::temporal::TemporalFeatureDeriver;
use crate::config::ScoringConfig;
use crate::domain::errors::{BundleError, ScoringError};
use crate::domain::features::TemporalFeatures;
use crate::domain::score::ScoreResult;
use crate::domain::transaction::ScoringRequest;
use crate::infrastructure::bundle::ArtifactBundle;
use crate::infrastructure::history::HistoryStore;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

pub struct ScoringService {
    bundle: RwLock<Arc<ArtifactBundle>>,
    ensemble: ScorerEnsemble,
    deriver: TemporalFeatureDeriver,
    history: Arc<dyn HistoryStore>,
}

impl ScoringService {
    pub fn new(
        bundle: ArtifactBundle,
        config: &ScoringConfig,
        history: Arc<dyn HistoryStore>,
    ) -> Self {
        Self {
            bundle: RwLock::new(Arc::new(bundle)),
            ensemble: ScorerEnsemble::new(config.weights, config.decision_threshold),
            deriver: TemporalFeatureDeriver::new(),
            history,
        }
    }

    /// Loads the bundle from disk and builds the service, refusing to start
    /// on a missing or inconsistent bundle.
    pub fn from_path(
        path: &Path,
        config: &ScoringConfig,
        history: Arc<dyn HistoryStore>,
    ) -> Result<Self, BundleError> {
        let bundle = ArtifactBundle::load(path)?;
        info!(path = %path.display(), "Scoring service ready");
        Ok(Self::new(bundle, config, history))
    }

    /// True once a valid bundle is held. Construction requires one, so
    /// there is no "empty model" state that could produce scores.
    pub fn is_ready(&self) -> bool {
        true
    }

    /// Replaces the bundle wholesale with a freshly validated one.
    pub fn reload(&self, path: &Path) -> Result<(), BundleError> {
        let bundle = ArtifactBundle::load(path)?;
        let mut guard = self.bundle.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::new(bundle);
        info!(path = %path.display(), "Artifact bundle reloaded");
        Ok(())
    }

    fn snapshot(&self) -> Arc<ArtifactBundle> {
        self.bundle
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Scores one transaction end to end.
    pub fn score(&self, request: &ScoringRequest) -> Result<ScoreResult, ScoringError> {
        request.validate()?;
        let bundle = self.snapshot();

        let history = self.history.recent(
            &request.user_id,
            request.timestamp,
            self.deriver.history_window(),
        );
        let mut temporal = self.deriver.derive(request.timestamp, &history);
        apply_precomputed(&mut temporal, request);

        let named = self.named_features(&bundle, request, &temporal)?;
        let assembler = FeatureVectorAssembler::new(&bundle.feature_order);
        let vector = assembler.assemble(&named)?;
        let scaled = bundle.scaler.transform(&vector)?;

        let result = self.ensemble.score(
            &bundle.classifier,
            &bundle.isolation,
            &bundle.reconstruction,
            &scaled,
        )?;

        debug!(
            user_id = %request.user_id,
            combined = result.combined_fraud_probability,
            is_fraud = result.is_fraud,
            "Transaction scored"
        );
        Ok(result)
    }

    fn named_features(
        &self,
        bundle: &ArtifactBundle,
        request: &ScoringRequest,
        temporal: &TemporalFeatures,
    ) -> Result<HashMap<String, f64>, ScoringError> {
        let encoders = &bundle.encoders;
        let mut named = HashMap::with_capacity(bundle.feature_order.len());

        named.insert("transaction_amount".to_string(), request.amount);
        named.insert("hour".to_string(), temporal.hour);
        named.insert("day_of_week".to_string(), temporal.day_of_week);
        named.insert("month".to_string(), temporal.month);
        named.insert("day_of_month".to_string(), temporal.day_of_month);

        for (field, value) in [
            ("location", &request.location),
            ("merchant", &request.merchant),
            ("transaction_type", &request.transaction_type),
            ("user_id", &request.user_id),
        ] {
            named.insert(field.to_string(), encoders.encode(field, value)? as f64);
        }

        named.insert(
            "time_since_last_txn".to_string(),
            temporal.time_since_last_txn,
        );
        named.insert(
            "user_avg_txn_amount_24h".to_string(),
            temporal.avg_amount_24h,
        );
        named.insert("user_txn_count_24h".to_string(), temporal.count_24h);
        named.insert("user_avg_txn_amount_7d".to_string(), temporal.avg_amount_7d);
        named.insert("user_txn_count_7d".to_string(), temporal.count_7d);

        Ok(named)
    }
}

/// Precomputed rolling statistics supplied by the caller take precedence,
/// field by field, over the derived values.
fn apply_precomputed(temporal: &mut TemporalFeatures, request: &ScoringRequest) {
    if let Some(v) = request.time_since_last_txn {
        temporal.time_since_last_txn = v;
    }
    if let Some(v) = request.user_avg_txn_amount_24h {
        temporal.avg_amount_24h = v;
    }
    if let Some(v) = request.user_txn_count_24h {
        temporal.count_24h = v;
    }
    if let Some(v) = request.user_avg_txn_amount_7d {
        temporal.avg_amount_7d = v;
    }
    if let Some(v) = request.user_txn_count_7d {
        temporal.count_7d = v;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::bundle::test_support::tiny_bundle;
    use crate::infrastructure::history::InMemoryHistoryStore;
    use chrono::{Duration, TimeZone, Utc};

    fn service() -> (ScoringService, Arc<InMemoryHistoryStore>) {
        let history = Arc::new(InMemoryHistoryStore::new());
        let service = ScoringService::new(
            tiny_bundle(),
            &ScoringConfig::default(),
            history.clone(),
        );
        (service, history)
    }

    fn request() -> ScoringRequest {
        ScoringRequest {
            user_id: "a".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 15, 14, 30, 0).unwrap(),
            amount: 42.0,
            merchant: "b".to_string(),
            transaction_type: "c".to_string(),
            location: "a".to_string(),
            time_since_last_txn: None,
            user_avg_txn_amount_24h: None,
            user_txn_count_24h: None,
            user_avg_txn_amount_7d: None,
            user_txn_count_7d: None,
        }
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let (service, _) = service();
        let req = request();

        let first = service.score(&req).unwrap();
        let second = service.score(&req).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unseen_merchant_scores_without_error() {
        let (service, _) = service();
        let mut req = request();
        req.merchant = "never_seen_before".to_string();

        let first = service.score(&req).unwrap();
        let second = service.score(&req).unwrap();
        assert_eq!(first, second, "unseen-merchant score must be deterministic");
    }

    #[test]
    fn test_invalid_request_is_rejected_before_derivation() {
        let (service, _) = service();
        let mut req = request();
        req.user_id = String::new();

        let err = service.score(&req).unwrap_err();
        assert!(matches!(err, ScoringError::InputValidation { .. }));
    }

    #[test]
    fn test_history_changes_the_rolling_features() {
        let (service, history) = service();
        let req = request();
        let without_history = service.score(&req).unwrap();

        let mut earlier = request();
        earlier.timestamp = req.timestamp - Duration::hours(2);
        earlier.amount = 999.0;
        history.append(earlier.to_transaction());
        let with_history = service.score(&req).unwrap();

        assert_ne!(
            without_history.combined_fraud_probability,
            with_history.combined_fraud_probability
        );
    }

    #[test]
    fn test_precomputed_stats_take_precedence_over_derivation() {
        let (service, history) = service();
        let mut req = request();
        let baseline = service.score(&req).unwrap();

        let mut earlier = request();
        earlier.timestamp = req.timestamp - Duration::hours(2);
        earlier.amount = 999.0;
        history.append(earlier.to_transaction());
        let derived = service.score(&req).unwrap();
        assert_ne!(baseline, derived);

        // Overriding with the values an empty history would produce must
        // reproduce the no-history score exactly, despite the stored history.
        req.time_since_last_txn = Some(0.0);
        req.user_avg_txn_amount_24h = Some(0.0);
        req.user_txn_count_24h = Some(0.0);
        req.user_avg_txn_amount_7d = Some(0.0);
        req.user_txn_count_7d = Some(0.0);
        let overridden = service.score(&req).unwrap();
        assert_eq!(overridden, baseline);
    }

    #[test]
    fn test_reload_swaps_the_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bundle.json");
        tiny_bundle().save(&path).unwrap();

        let service = ScoringService::from_path(
            &path,
            &ScoringConfig::default(),
            Arc::new(InMemoryHistoryStore::new()),
        )
        .unwrap();
        let before = service.score(&request()).unwrap();
        service.reload(&path).unwrap();
        let after = service.score(&request()).unwrap();

        // Identical serialized bundle: the swap must not change scores.
        assert_eq!(before, after);
        assert!(service.is_ready());
    }

    #[test]
    fn test_from_path_fails_fast_on_missing_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let err = ScoringService::from_path(
            &dir.path().join("absent.json"),
            &ScoringConfig::default(),
            Arc::new(InMemoryHistoryStore::new()),
        )
        .err()
        .unwrap();
        assert!(matches!(err, BundleError::NotFound { .. }));
    }
}
