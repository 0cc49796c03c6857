/// Ordered list of feature names.
/// This order MUST match exactly between scaler fitting, scaler application
/// and model application. It is persisted inside every artifact bundle as
/// data; any change here is a breaking change for trained bundles.
pub const FEATURE_ORDER: &[&str] = &[
    "transaction_amount",
    "hour",
    "day_of_week",
    "month",
    "day_of_month",
    "location",
    "merchant",
    "transaction_type",
    "user_id",
    "time_since_last_txn",
    "user_avg_txn_amount_24h",
    "user_txn_count_24h",
    "user_avg_txn_amount_7d",
    "user_txn_count_7d",
];

/// The closed set of categorical columns that carry a trained encoder.
pub const CATEGORICAL_FIELDS: &[&str] = &["location", "merchant", "transaction_type", "user_id"];

/// Calendar and rolling-window features derived for one transaction.
///
/// All values are reals because they feed the feature vector directly.
/// Rolling aggregates default to 0.0 for a user with no usable history.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TemporalFeatures {
    pub hour: f64,
    pub day_of_week: f64,
    pub month: f64,
    pub day_of_month: f64,
    pub time_since_last_txn: f64,
    pub avg_amount_24h: f64,
    pub count_24h: f64,
    pub avg_amount_7d: f64,
    pub count_7d: f64,
}
