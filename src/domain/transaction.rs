use crate::domain::errors::ScoringError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An immutable transaction event as stored in a user's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    pub amount: f64,
    pub merchant: String,
    pub transaction_type: String,
    pub location: String,
}

/// A scoring request as handed over by the transport layer.
///
/// The five optional rolling statistics, when supplied, take precedence over
/// the values the temporal deriver would compute from stored history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringRequest {
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    pub amount: f64,
    pub merchant: String,
    pub transaction_type: String,
    pub location: String,

    #[serde(default)]
    pub time_since_last_txn: Option<f64>,
    #[serde(default)]
    pub user_avg_txn_amount_24h: Option<f64>,
    #[serde(default)]
    pub user_txn_count_24h: Option<f64>,
    #[serde(default)]
    pub user_avg_txn_amount_7d: Option<f64>,
    #[serde(default)]
    pub user_txn_count_7d: Option<f64>,
}

impl ScoringRequest {
    /// Validates the request before any feature derivation begins.
    ///
    /// A missing or blank required field is an input failure here, never an
    /// encoder concern. Unseen categorical values are NOT rejected: they are
    /// a modeled category handled downstream by the encoder registry.
    pub fn validate(&self) -> Result<(), ScoringError> {
        let required = [
            ("user_id", &self.user_id),
            ("merchant", &self.merchant),
            ("transaction_type", &self.transaction_type),
            ("location", &self.location),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ScoringError::InputValidation {
                    reason: format!("required field '{name}' is missing or blank"),
                });
            }
        }

        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(ScoringError::InputValidation {
                reason: format!("amount must be a non-negative real, got {}", self.amount),
            });
        }

        let optional = [
            ("time_since_last_txn", self.time_since_last_txn),
            ("user_avg_txn_amount_24h", self.user_avg_txn_amount_24h),
            ("user_txn_count_24h", self.user_txn_count_24h),
            ("user_avg_txn_amount_7d", self.user_avg_txn_amount_7d),
            ("user_txn_count_7d", self.user_txn_count_7d),
        ];
        for (name, value) in optional {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(ScoringError::InputValidation {
                        reason: format!("field '{name}' must be a non-negative real, got {v}"),
                    });
                }
            }
        }

        Ok(())
    }

    /// The transaction event this request describes, e.g. for appending to
    /// the history store after scoring.
    pub fn to_transaction(&self) -> Transaction {
        Transaction {
            user_id: self.user_id.clone(),
            timestamp: self.timestamp,
            amount: self.amount,
            merchant: self.merchant.clone(),
            transaction_type: self.transaction_type.clone(),
            location: self.location.clone(),
        }
    }
}
