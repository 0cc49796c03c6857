//! User transaction history collaborator.
//!
//! The scorer only ever reads a bounded, time-ordered snapshot of a user's
//! recent transactions. Snapshot consistency under concurrent appends is
//! this collaborator's job: `recent` takes the lock once and hands back an
//! owned copy, so a scoring call never observes a half-applied append.

use crate::domain::transaction::Transaction;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::RwLock;

/// Read/append access to per-user transaction history.
pub trait HistoryStore: Send + Sync {
    /// The user's transactions in `(until - window, until]`, ascending by
    /// timestamp. An unknown user yields an empty snapshot.
    fn recent(&self, user_id: &str, until: DateTime<Utc>, window: Duration) -> Vec<Transaction>;

    /// Records a transaction, keeping the per-user sequence time-ordered.
    fn append(&self, transaction: Transaction);
}

/// Thread-safe in-memory history store.
#[derive(Debug, Default)]
pub struct InMemoryHistoryStore {
    inner: RwLock<HashMap<String, Vec<Transaction>>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for InMemoryHistoryStore {
    fn recent(&self, user_id: &str, until: DateTime<Utc>, window: Duration) -> Vec<Transaction> {
        let start = until - window;
        let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
        guard
            .get(user_id)
            .map(|history| {
                history
                    .iter()
                    .filter(|txn| txn.timestamp > start && txn.timestamp <= until)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn append(&self, transaction: Transaction) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let history = guard.entry(transaction.user_id.clone()).or_default();
        // Insert after any entry with the same timestamp to keep arrival order.
        let position = history.partition_point(|txn| txn.timestamp <= transaction.timestamp);
        history.insert(position, transaction);
    }
}
