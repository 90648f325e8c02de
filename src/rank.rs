//! Top-N ranking over cumulative totals.

use std::cmp::Ordering;

use crate::aggregate::CumulativeState;

/// Order used for ranking: larger total first, ties by ascending key.
pub fn rank_order(a: (&str, u64), b: (&str, u64)) -> Ordering {
    b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0))
}

/// The `n` entries with the largest totals, descending.
///
/// Ties are broken by ascending entity key so the result is the same on
/// every call. Zero totals are kept; fewer than `n` keys returns them all.
pub fn top_n(state: &CumulativeState, n: usize) -> Vec<(String, u64)> {
    if n == 0 {
        return Vec::new();
    }
    let mut rows: Vec<(&str, u64)> = state.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    if rows.len() > n {
        rows.select_nth_unstable_by(n - 1, |a, b| rank_order(*a, *b));
        rows.truncate(n);
    }
    rows.sort_unstable_by(|a, b| rank_order(*a, *b));
    rows.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}
