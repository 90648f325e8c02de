//! # Timeline
//! Derives the ordered sequence of hourly buckets a playback session visits.
//!
//! Two policies exist because the two dashboards differ:
//! - `Contiguous` fills every hour between the first and last bucket, so quiet
//!   hours show up as a pause in the race.
//! - `Sparse` only visits hours that carry data and jumps over gaps.
//!
//! Bucket keys are canonical `YYYY-MM-DD HH:00` strings; with fixed width and
//! zero padding their string order is their chronological order.

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::TimelineError;
use crate::record::Record;

/// `chrono` format of a bucket key.
pub const BUCKET_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Default cap on a gap-filled timeline: two (leap) years of hours.
pub const DEFAULT_MAX_SPAN_HOURS: u32 = 24 * 366 * 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BucketPolicy {
    /// Every hour from min to max inclusive.
    #[default]
    Contiguous,
    /// Only the distinct hours present in the input.
    Sparse,
}

/// Ordered, distinct, ascending bucket keys.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Timeline {
    buckets: Vec<String>,
}

impl Timeline {
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&str> {
        self.buckets.get(idx).map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.buckets
    }
}

/// Length of `YYYY-MM-DD HH:MM`.
const BUCKET_KEY_LEN: usize = 16;

/// Parse a canonical bucket key. Non-canonical spellings (missing zero
/// padding, signed or five-digit years, minutes other than `00`) are
/// rejected so string order stays valid.
pub fn parse_bucket(key: &str) -> Result<NaiveDateTime, TimelineError> {
    let malformed = || TimelineError::MalformedBucket {
        key: key.to_string(),
    };
    if key.len() != BUCKET_KEY_LEN || !key.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(malformed());
    }
    let ts = NaiveDateTime::parse_from_str(key, BUCKET_FORMAT).map_err(|_| malformed())?;
    if ts.minute() != 0 || format_bucket(ts) != key {
        return Err(malformed());
    }
    Ok(ts)
}

/// Format an hour timestamp as a bucket key.
pub fn format_bucket(ts: NaiveDateTime) -> String {
    ts.format(BUCKET_FORMAT).to_string()
}

/// Build the timeline for `records` under `policy`.
///
/// Empty input yields an empty timeline; callers render a "no data" state
/// instead of starting playback.
pub fn build_timeline(
    records: &[Record],
    policy: BucketPolicy,
    max_span_hours: u32,
) -> Result<Timeline, TimelineError> {
    match policy {
        BucketPolicy::Sparse => Ok(sparse(records)),
        BucketPolicy::Contiguous => contiguous(records, max_span_hours),
    }
}

fn sparse(records: &[Record]) -> Timeline {
    let set: BTreeSet<&str> = records.iter().map(|r| r.bucket_key.as_str()).collect();
    Timeline {
        buckets: set.into_iter().map(str::to_string).collect(),
    }
}

fn contiguous(records: &[Record], max_span_hours: u32) -> Result<Timeline, TimelineError> {
    let mut bounds: Option<(NaiveDateTime, NaiveDateTime)> = None;
    for r in records {
        let ts = parse_bucket(&r.bucket_key)?;
        bounds = Some(match bounds {
            None => (ts, ts),
            Some((lo, hi)) => (lo.min(ts), hi.max(ts)),
        });
    }
    let Some((start, end)) = bounds else {
        return Ok(Timeline::default());
    };

    let hours = (end - start).num_hours() + 1;
    if hours > i64::from(max_span_hours) {
        return Err(TimelineError::SpanTooLong {
            from: format_bucket(start),
            to: format_bucket(end),
            hours,
            limit: max_span_hours,
        });
    }

    // Counted so the step never goes past `end`.
    let buckets: Vec<String> = (0..hours)
        .map(|h| format_bucket(start + Duration::hours(h)))
        .collect();
    tracing::debug!(target: "timeline", hours = buckets.len(), "generated contiguous timeline");
    Ok(Timeline { buckets })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recs(keys: &[&str]) -> Vec<Record> {
        keys.iter().map(|k| Record::new(*k, "x", 1)).collect()
    }

    #[test]
    fn contiguous_fills_gaps() {
        let tl = build_timeline(
            &recs(&["2024-01-01 02:00", "2024-01-01 00:00"]),
            BucketPolicy::Contiguous,
            DEFAULT_MAX_SPAN_HOURS,
        )
        .unwrap();
        assert_eq!(
            tl.as_slice(),
            ["2024-01-01 00:00", "2024-01-01 01:00", "2024-01-01 02:00"]
        );
    }

    #[test]
    fn contiguous_crosses_day_and_year_boundaries() {
        let tl = build_timeline(
            &recs(&["2023-12-31 22:00", "2024-01-01 01:00"]),
            BucketPolicy::Contiguous,
            DEFAULT_MAX_SPAN_HOURS,
        )
        .unwrap();
        assert_eq!(
            tl.as_slice(),
            [
                "2023-12-31 22:00",
                "2023-12-31 23:00",
                "2024-01-01 00:00",
                "2024-01-01 01:00"
            ]
        );
    }

    #[test]
    fn sparse_skips_gaps_and_dedups() {
        let tl = build_timeline(
            &recs(&["2024-01-01 05:00", "2024-01-01 00:00", "2024-01-01 05:00"]),
            BucketPolicy::Sparse,
            DEFAULT_MAX_SPAN_HOURS,
        )
        .unwrap();
        assert_eq!(tl.as_slice(), ["2024-01-01 00:00", "2024-01-01 05:00"]);
    }

    #[test]
    fn empty_input_gives_empty_timeline() {
        for p in [BucketPolicy::Contiguous, BucketPolicy::Sparse] {
            assert!(build_timeline(&[], p, 10).unwrap().is_empty());
        }
    }

    #[test]
    fn malformed_keys_are_fatal_under_contiguous() {
        for bad in [
            "yesterday",
            "2024-01-01 00:30",
            "2024-1-1 0:00",
            "2024-01-01T00:00",
            "+10000-01-01 00:00",
            "+2024-01-01 00:00",
            " 2024-01-01 00:00",
        ] {
            let err = build_timeline(&recs(&[bad]), BucketPolicy::Contiguous, 10).unwrap_err();
            assert_eq!(
                err,
                TimelineError::MalformedBucket {
                    key: bad.to_string()
                }
            );
        }
    }

    #[test]
    fn sparse_does_not_parse_keys() {
        let tl = build_timeline(&recs(&["b", "a"]), BucketPolicy::Sparse, 10).unwrap();
        assert_eq!(tl.as_slice(), ["a", "b"]);
    }

    #[test]
    fn span_limit_guards_garbage_years() {
        let err = build_timeline(
            &recs(&["2024-01-01 00:00", "9999-01-01 00:00"]),
            BucketPolicy::Contiguous,
            DEFAULT_MAX_SPAN_HOURS,
        )
        .unwrap_err();
        assert!(matches!(err, TimelineError::SpanTooLong { .. }));

        // Exactly at the limit is fine.
        let ok = build_timeline(
            &recs(&["2024-01-01 00:00", "2024-01-01 02:00"]),
            BucketPolicy::Contiguous,
            3,
        );
        assert_eq!(ok.unwrap().len(), 3);
    }

    #[test]
    fn chrono_extreme_years_are_rejected_not_stepped() {
        for key in ["+262142-12-31 23:00", "-0001-01-01 00:00"] {
            let err = build_timeline(
                &recs(&[key]),
                BucketPolicy::Contiguous,
                DEFAULT_MAX_SPAN_HOURS,
            )
            .unwrap_err();
            assert!(matches!(err, TimelineError::MalformedBucket { .. }), "{key}");
        }

        // Last representable four-digit hour still yields a single bucket.
        let tl = build_timeline(
            &recs(&["9999-12-31 23:00"]),
            BucketPolicy::Contiguous,
            DEFAULT_MAX_SPAN_HOURS,
        )
        .unwrap();
        assert_eq!(tl.as_slice(), ["9999-12-31 23:00"]);
    }

    #[test]
    fn four_digit_years_keep_string_and_time_order_aligned() {
        let a = parse_bucket("0999-12-31 23:00").unwrap();
        let b = parse_bucket("1000-01-01 00:00").unwrap();
        assert!(a < b);
        assert!("0999-12-31 23:00" < "1000-01-01 00:00");
        assert!(parse_bucket("+10000-01-01 00:00").is_err());
    }

    #[test]
    fn policy_parses_lowercase() {
        let p: BucketPolicy = serde_json::from_str("\"sparse\"").unwrap();
        assert_eq!(p, BucketPolicy::Sparse);
    }
}
