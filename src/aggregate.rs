//! # Aggregator
//! Running per-key totals, folded in one bucket at a time.
//!
//! Records are grouped by bucket once up front so each tick only touches the
//! rows of its own hour. Totals only ever grow; there is no removal.

use std::collections::HashMap;

use crate::record::Record;

/// Cumulative totals for one playback session.
pub type CumulativeState = HashMap<String, u64>;

#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    by_bucket: HashMap<String, Vec<(String, u64)>>,
    totals: CumulativeState,
}

impl Aggregator {
    /// Index `records` by bucket key. Totals start empty.
    pub fn new(records: &[Record]) -> Self {
        let mut by_bucket: HashMap<String, Vec<(String, u64)>> = HashMap::new();
        for r in records {
            by_bucket
                .entry(r.bucket_key.clone())
                .or_default()
                .push((r.entity_key.clone(), r.count));
        }
        Self {
            by_bucket,
            totals: CumulativeState::new(),
        }
    }

    /// Add every record of `bucket_key` into the totals. Returns the number of
    /// records applied; a bucket without records is a no-op.
    ///
    /// Applying the same bucket twice counts it twice. The playback session
    /// applies each bucket exactly once per cursor advance.
    pub fn apply_bucket(&mut self, bucket_key: &str) -> usize {
        let Some(rows) = self.by_bucket.get(bucket_key) else {
            return 0;
        };
        for (key, count) in rows {
            let slot = self.totals.entry(key.clone()).or_insert(0);
            *slot = slot.saturating_add(*count);
        }
        rows.len()
    }

    pub fn totals(&self) -> &CumulativeState {
        &self.totals
    }

    pub fn total_for(&self, key: &str) -> Option<u64> {
        self.totals.get(key).copied()
    }

    /// Drop all totals, keeping the bucket index.
    pub fn reset(&mut self) {
        self.totals.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Record> {
        vec![
            Record::new("h0", "A", 3),
            Record::new("h0", "B", 1),
            Record::new("h1", "A", 2),
            Record::new("h2", "C", 0),
        ]
    }

    #[test]
    fn folds_bucket_by_bucket() {
        let mut agg = Aggregator::new(&sample());
        assert_eq!(agg.apply_bucket("h0"), 2);
        assert_eq!(agg.total_for("A"), Some(3));
        assert_eq!(agg.total_for("B"), Some(1));

        agg.apply_bucket("h1");
        assert_eq!(agg.total_for("A"), Some(5));
        assert_eq!(agg.total_for("B"), Some(1));
    }

    #[test]
    fn zero_count_creates_entry() {
        let mut agg = Aggregator::new(&sample());
        agg.apply_bucket("h2");
        assert_eq!(agg.total_for("C"), Some(0));
    }

    #[test]
    fn missing_bucket_is_noop() {
        let mut agg = Aggregator::new(&sample());
        assert_eq!(agg.apply_bucket("gap"), 0);
        assert!(agg.totals().is_empty());
    }

    #[test]
    fn double_apply_double_counts() {
        let mut agg = Aggregator::new(&sample());
        agg.apply_bucket("h1");
        agg.apply_bucket("h1");
        assert_eq!(agg.total_for("A"), Some(4));
    }

    #[test]
    fn reset_clears_totals_only() {
        let mut agg = Aggregator::new(&sample());
        agg.apply_bucket("h0");
        agg.reset();
        assert!(agg.totals().is_empty());
        agg.apply_bucket("h0");
        assert_eq!(agg.total_for("A"), Some(3));
    }
}
