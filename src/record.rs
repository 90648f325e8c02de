// src/record.rs
//! Input records and decoding of the upstream JSON payload.
//!
//! Upstream rows are flat objects such as
//! `{"hour":"2024-01-01 00:00","ip":"10.0.0.1","count":3}`; the field names
//! differ per dashboard, so decoding goes through [`FieldMap`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RecordError;

/// One pre-aggregated count: `count` events for `entity_key` in hour `bucket_key`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Record {
    pub bucket_key: String,
    pub entity_key: String,
    pub count: u64,
}

impl Record {
    pub fn new(bucket_key: impl Into<String>, entity_key: impl Into<String>, count: u64) -> Self {
        Self {
            bucket_key: bucket_key.into(),
            entity_key: entity_key.into(),
            count,
        }
    }
}

/// Names of the JSON fields carrying bucket, key and count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMap {
    pub bucket_field: String,
    pub key_field: String,
    pub count_field: String,
}

impl FieldMap {
    pub fn new(
        bucket_field: impl Into<String>,
        key_field: impl Into<String>,
        count_field: impl Into<String>,
    ) -> Self {
        Self {
            bucket_field: bucket_field.into(),
            key_field: key_field.into(),
            count_field: count_field.into(),
        }
    }

    /// Decode a parsed JSON array into records. `null` counts as an empty payload.
    pub fn decode_value(&self, v: &Value) -> Result<Vec<Record>, RecordError> {
        let rows = match v {
            Value::Null => return Ok(Vec::new()),
            Value::Array(rows) => rows,
            _ => return Err(RecordError::NotAnArray),
        };

        let mut out = Vec::with_capacity(rows.len());
        for (row, item) in rows.iter().enumerate() {
            let obj = item.as_object().ok_or(RecordError::NotAnObject { row })?;
            let bucket = str_field(obj, row, &self.bucket_field)?;
            let key = str_field(obj, row, &self.key_field)?;
            let count = obj
                .get(&self.count_field)
                .ok_or_else(|| RecordError::MissingField {
                    row,
                    field: self.count_field.clone(),
                })?
                .as_u64()
                .ok_or_else(|| RecordError::BadCount {
                    row,
                    field: self.count_field.clone(),
                })?;
            out.push(Record::new(bucket, key, count));
        }
        Ok(out)
    }

    /// Decode raw JSON text.
    pub fn decode_str(&self, s: &str) -> Result<Vec<Record>, RecordError> {
        let v: Value = serde_json::from_str(s)?;
        self.decode_value(&v)
    }
}

fn str_field(
    obj: &serde_json::Map<String, Value>,
    row: usize,
    field: &str,
) -> Result<String, RecordError> {
    match obj.get(field) {
        None => Err(RecordError::MissingField {
            row,
            field: field.to_string(),
        }),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(RecordError::NotAString {
            row,
            field: field.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip_fields() -> FieldMap {
        FieldMap::new("hour", "ip", "count")
    }

    #[test]
    fn decodes_flat_rows_with_custom_fields() {
        let json = r#"[
            {"hour":"2024-01-01 00:00","ip":"10.0.0.1","count":3},
            {"hour":"2024-01-01 01:00","ip":"10.0.0.2","count":0,"extra":true}
        ]"#;
        let recs = ip_fields().decode_str(json).unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0], Record::new("2024-01-01 00:00", "10.0.0.1", 3));
        assert_eq!(recs[1].count, 0);
    }

    #[test]
    fn null_payload_is_empty() {
        assert!(ip_fields().decode_str("null").unwrap().is_empty());
        assert!(ip_fields().decode_str("[]").unwrap().is_empty());
    }

    #[test]
    fn negative_count_is_rejected() {
        let json = r#"[{"hour":"2024-01-01 00:00","ip":"a","count":-1}]"#;
        let err = ip_fields().decode_str(json).unwrap_err();
        assert!(matches!(err, RecordError::BadCount { row: 0, .. }), "{err}");
    }

    #[test]
    fn missing_key_field_names_the_row() {
        let json = r#"[
            {"hour":"2024-01-01 00:00","ip":"a","count":1},
            {"hour":"2024-01-01 00:00","country_code":"US","count":1}
        ]"#;
        let err = ip_fields().decode_str(json).unwrap_err();
        assert_eq!(err.to_string(), "row 1: missing field 'ip'");
    }

    #[test]
    fn object_payload_is_not_an_array() {
        let err = ip_fields().decode_str(r#"{"error":"boom"}"#).unwrap_err();
        assert!(matches!(err, RecordError::NotAnArray));
    }
}
