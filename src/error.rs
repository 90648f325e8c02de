//! Error types for the playback core.
//!
//! Library code returns these typed errors; binaries and config loading wrap
//! them in `anyhow` with context.

use thiserror::Error;

/// Failure while building a timeline from records.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimelineError {
    /// A bucket key is not a canonical hour timestamp (`YYYY-MM-DD HH:00`).
    #[error("malformed bucket key '{key}': expected YYYY-MM-DD HH:00")]
    MalformedBucket { key: String },

    /// The gap-filled span would exceed the configured limit.
    #[error("timeline span {from} .. {to} covers {hours} hours (limit {limit})")]
    SpanTooLong {
        from: String,
        to: String,
        hours: i64,
        limit: u32,
    },
}

/// Failure while decoding an upstream JSON payload into records.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("payload is not a JSON array")]
    NotAnArray,

    #[error("row {row}: not a JSON object")]
    NotAnObject { row: usize },

    #[error("row {row}: missing field '{field}'")]
    MissingField { row: usize, field: String },

    #[error("row {row}: field '{field}' must be a string")]
    NotAString { row: usize, field: String },

    #[error("row {row}: field '{field}' must be a non-negative integer")]
    BadCount { row: usize, field: String },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure while loading a payload into a dashboard.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Records(#[from] RecordError),

    #[error(transparent)]
    Timeline(#[from] TimelineError),
}
