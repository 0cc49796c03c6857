//! Calendar and rolling-window feature derivation.
//!
//! Rolling windows are trailing intervals `(t - w, t]`: right-inclusive so a
//! history entry sharing the current timestamp counts, left-open matching the
//! closed-right rolling semantics used when the training data was built.
//! Training and inference share this exact code path, so the two sides cannot
//! drift apart.

use crate::domain::features::TemporalFeatures;
use crate::domain::transaction::Transaction;
use chrono::{DateTime, Datelike, Duration, Timelike, Utc};
use statrs::statistics::{Data, Distribution};

/// Derives [`TemporalFeatures`] from a transaction timestamp and the user's
/// prior-transaction history (ascending by timestamp, duplicates allowed).
#[derive(Debug, Clone)]
pub struct TemporalFeatureDeriver {
    short_window: Duration,
    long_window: Duration,
}

impl Default for TemporalFeatureDeriver {
    fn default() -> Self {
        Self {
            short_window: Duration::hours(24),
            long_window: Duration::days(7),
        }
    }
}

impl TemporalFeatureDeriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// The span of history a scoring call needs: the long rolling window.
    pub fn history_window(&self) -> Duration {
        self.long_window
    }

    /// Computes all temporal features for a transaction at `at`.
    ///
    /// An empty history yields zero for every rolling feature and for
    /// `time_since_last_txn`; a brand-new user is never a failure.
    pub fn derive(&self, at: DateTime<Utc>, history: &[Transaction]) -> TemporalFeatures {
        let (avg_amount_24h, count_24h) = Self::window_stats(at, self.short_window, history);
        let (avg_amount_7d, count_7d) = Self::window_stats(at, self.long_window, history);

        TemporalFeatures {
            hour: at.hour() as f64,
            day_of_week: at.weekday().num_days_from_monday() as f64,
            month: at.month() as f64,
            day_of_month: at.day() as f64,
            time_since_last_txn: Self::seconds_since_last(at, history),
            avg_amount_24h,
            count_24h,
            avg_amount_7d,
            count_7d,
        }
    }

    /// Seconds since the latest history entry at or before `at`, 0.0 if none.
    fn seconds_since_last(at: DateTime<Utc>, history: &[Transaction]) -> f64 {
        history
            .iter()
            .rev()
            .find(|txn| txn.timestamp <= at)
            .map(|txn| (at - txn.timestamp).num_milliseconds() as f64 / 1000.0)
            .unwrap_or(0.0)
    }

    /// Mean amount and count over the trailing window `(at - window, at]`.
    fn window_stats(at: DateTime<Utc>, window: Duration, history: &[Transaction]) -> (f64, f64) {
        let start = at - window;
        let amounts: Vec<f64> = history
            .iter()
            .filter(|txn| txn.timestamp > start && txn.timestamp <= at)
            .map(|txn| txn.amount)
            .collect();

        if amounts.is_empty() {
            return (0.0, 0.0);
        }

        let count = amounts.len() as f64;
        let mean = Data::new(amounts).mean().unwrap_or(0.0);
        (mean, count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn txn(user: &str, timestamp: DateTime<Utc>, amount: f64) -> Transaction {
        Transaction {
            user_id: user.to_string(),
            timestamp,
            amount,
            merchant: "acme_store".to_string(),
            transaction_type: "purchase".to_string(),
            location: "berlin".to_string(),
        }
    }

    fn at() -> DateTime<Utc> {
        // Friday.
        Utc.with_ymd_and_hms(2024, 3, 15, 14, 30, 0).unwrap()
    }

    #[test]
    fn test_calendar_features() {
        let features = TemporalFeatureDeriver::new().derive(at(), &[]);

        assert_eq!(features.hour, 14.0);
        assert_eq!(features.day_of_week, 4.0); // Monday = 0
        assert_eq!(features.month, 3.0);
        assert_eq!(features.day_of_month, 15.0);
    }

    #[test]
    fn test_empty_history_yields_all_zero_rolling_features() {
        let features = TemporalFeatureDeriver::new().derive(at(), &[]);

        assert_eq!(features.time_since_last_txn, 0.0);
        assert_eq!(features.avg_amount_24h, 0.0);
        assert_eq!(features.count_24h, 0.0);
        assert_eq!(features.avg_amount_7d, 0.0);
        assert_eq!(features.count_7d, 0.0);
    }

    #[test]
    fn test_single_transaction_bumps_count_from_zero_to_one() {
        let history = vec![txn("u", at() - Duration::hours(2), 50.0)];
        let features = TemporalFeatureDeriver::new().derive(at(), &history);

        assert_eq!(features.count_24h, 1.0);
        assert_eq!(features.avg_amount_24h, 50.0);
        assert_eq!(features.count_7d, 1.0);
        assert_eq!(features.time_since_last_txn, 7200.0);
    }

    #[test]
    fn test_window_is_right_inclusive_left_open() {
        let deriver = TemporalFeatureDeriver::new();
        let history = vec![
            // Exactly 24h before: outside the left-open boundary.
            txn("u", at() - Duration::hours(24), 10.0),
            // One second inside.
            txn("u", at() - Duration::hours(24) + Duration::seconds(1), 20.0),
            // Exactly at the current timestamp: counts.
            txn("u", at(), 30.0),
        ];

        let features = deriver.derive(at(), &history);
        assert_eq!(features.count_24h, 2.0);
        assert_eq!(features.avg_amount_24h, 25.0);
        // All three fall inside the 7-day window.
        assert_eq!(features.count_7d, 3.0);
    }

    #[test]
    fn test_duplicate_timestamps_do_not_break_window_math() {
        let ts = at() - Duration::hours(1);
        let history = vec![txn("u", ts, 10.0), txn("u", ts, 30.0)];

        let features = TemporalFeatureDeriver::new().derive(at(), &history);
        assert_eq!(features.count_24h, 2.0);
        assert_eq!(features.avg_amount_24h, 20.0);
        assert_eq!(features.time_since_last_txn, 3600.0);
    }

    #[test]
    fn test_seven_day_window_excludes_older_entries() {
        let history = vec![
            txn("u", at() - Duration::days(8), 100.0),
            txn("u", at() - Duration::days(3), 40.0),
        ];

        let features = TemporalFeatureDeriver::new().derive(at(), &history);
        assert_eq!(features.count_7d, 1.0);
        assert_eq!(features.avg_amount_7d, 40.0);
        assert_eq!(features.count_24h, 0.0);
    }
}
