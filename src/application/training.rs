//! Training pipeline: labeled transaction CSV in, artifact bundle out.
//!
//! Feature derivation runs through the exact code the inference path uses
//! (the temporal deriver, the encoder registry, the assembler, the scaler),
//! so the two sides cannot drift apart. Hyperparameter search is out of
//! scope; the fixed hyperparameters live in [`TrainingParams`].

use crate::application::assembler::FeatureVectorAssembler;
use crate::application::encoding::EncoderRegistry;
use crate::application::models::{
    ForestClassifier, ForestParams, IsolationForestModel, IsolationParams, ReconstructionModel,
    ReconstructionParams,
};
use crate::application::scaler::ScalerStats;
use crate::application::temporal::TemporalFeatureDeriver;
use crate::domain::features::{CATEGORICAL_FIELDS, FEATURE_ORDER, TemporalFeatures};
use crate::domain::transaction::Transaction;
use crate::infrastructure::bundle::{ArtifactBundle, BUNDLE_SCHEMA_VERSION};
use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

/// One labeled row of training data.
#[derive(Debug, Deserialize)]
struct LabeledTransaction {
    user_id: String,
    transaction_time: DateTime<Utc>,
    transaction_amount: f64,
    merchant: String,
    transaction_type: String,
    location: String,
    is_fraud: u8,
}

/// Fixed hyperparameters for one training run.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrainingParams {
    pub forest: ForestParams,
    pub isolation: IsolationParams,
    pub reconstruction: ReconstructionParams,
}

/// Trains encoders, scaler and all three models from a labeled CSV.
pub fn train_from_csv(path: &Path, params: TrainingParams) -> Result<ArtifactBundle> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open training data at {}", path.display()))?;
    let mut reader = csv::Reader::from_reader(BufReader::new(file));

    let mut records: Vec<LabeledTransaction> = Vec::new();
    for row in reader.deserialize() {
        let record: LabeledTransaction = row.context("Failed to parse training row")?;
        records.push(record);
    }
    if records.is_empty() {
        bail!("no training rows found in {}", path.display());
    }

    // Per-user time order, the precondition for rolling-window derivation.
    records.sort_by(|a, b| {
        a.user_id
            .cmp(&b.user_id)
            .then(a.transaction_time.cmp(&b.transaction_time))
    });

    info!(rows = records.len(), "Loaded training data");

    let encoders = fit_encoders(&records);
    let (matrix, labels) = derive_feature_matrix(&records, &encoders)?;

    let scaler = ScalerStats::fit(&matrix);
    let scaled: Vec<Vec<f64>> = matrix
        .iter()
        .map(|row| scaler.transform(row))
        .collect::<Result<_, _>>()
        .context("Failed to scale training matrix")?;

    let classifier = ForestClassifier::fit(&scaled, &labels, params.forest)
        .map_err(|e| anyhow::anyhow!("classifier training failed: {e}"))?;
    let isolation = IsolationForestModel::fit(&scaled, params.isolation)
        .map_err(|e| anyhow::anyhow!("isolation model training failed: {e}"))?;
    let reconstruction = ReconstructionModel::fit(&scaled, params.reconstruction)
        .map_err(|e| anyhow::anyhow!("reconstruction model training failed: {e}"))?;

    info!(
        rows = scaled.len(),
        features = FEATURE_ORDER.len(),
        fraud_share = labels.iter().sum::<f64>() / labels.len() as f64,
        "Training complete"
    );

    Ok(ArtifactBundle {
        schema_version: BUNDLE_SCHEMA_VERSION,
        created_at: Utc::now(),
        feature_order: FEATURE_ORDER.iter().map(|s| s.to_string()).collect(),
        encoders,
        scaler,
        classifier,
        isolation,
        reconstruction,
    })
}

fn fit_encoders(records: &[LabeledTransaction]) -> EncoderRegistry {
    let mut columns: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for field in CATEGORICAL_FIELDS {
        columns.insert(field.to_string(), Vec::with_capacity(records.len()));
    }
    for record in records {
        for (field, value) in [
            ("location", &record.location),
            ("merchant", &record.merchant),
            ("transaction_type", &record.transaction_type),
            ("user_id", &record.user_id),
        ] {
            if let Some(column) = columns.get_mut(field) {
                column.push(value.clone());
            }
        }
    }
    EncoderRegistry::fit(&columns)
}

/// Derives one feature row per record, feeding each row the user's prior
/// transactions exactly as the inference path would see them.
fn derive_feature_matrix(
    records: &[LabeledTransaction],
    encoders: &EncoderRegistry,
) -> Result<(Vec<Vec<f64>>, Vec<f64>)> {
    let deriver = TemporalFeatureDeriver::new();
    let feature_order: Vec<String> = FEATURE_ORDER.iter().map(|s| s.to_string()).collect();
    let assembler = FeatureVectorAssembler::new(&feature_order);

    let mut matrix = Vec::with_capacity(records.len());
    let mut labels = Vec::with_capacity(records.len());
    let mut histories: HashMap<String, Vec<Transaction>> = HashMap::new();

    for record in records {
        let history = histories.entry(record.user_id.clone()).or_default();
        // Keep only what `HistoryStore::recent` would hand the scorer, so a
        // gap longer than the window derives identically on both paths.
        let horizon = record.transaction_time - deriver.history_window();
        history.retain(|txn| txn.timestamp > horizon);
        let temporal = deriver.derive(record.transaction_time, history);

        let named = named_features(record, &temporal, encoders)?;
        matrix.push(assembler.assemble(&named)?);
        labels.push(record.is_fraud as f64);

        history.push(Transaction {
            user_id: record.user_id.clone(),
            timestamp: record.transaction_time,
            amount: record.transaction_amount,
            merchant: record.merchant.clone(),
            transaction_type: record.transaction_type.clone(),
            location: record.location.clone(),
        });
    }

    Ok((matrix, labels))
}

fn named_features(
    record: &LabeledTransaction,
    temporal: &TemporalFeatures,
    encoders: &EncoderRegistry,
) -> Result<HashMap<String, f64>> {
    let mut named = HashMap::with_capacity(FEATURE_ORDER.len());
    named.insert("transaction_amount".to_string(), record.transaction_amount);
    named.insert("hour".to_string(), temporal.hour);
    named.insert("day_of_week".to_string(), temporal.day_of_week);
    named.insert("month".to_string(), temporal.month);
    named.insert("day_of_month".to_string(), temporal.day_of_month);

    for (field, value) in [
        ("location", &record.location),
        ("merchant", &record.merchant),
        ("transaction_type", &record.transaction_type),
        ("user_id", &record.user_id),
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
