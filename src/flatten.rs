//! Record flattening
//!
//! Converts one arbitrarily-nested JSON object into one flat row whose
//! values are all scalars. Object-valued fields are expanded into prefixed
//! columns up to a configurable depth; arrays, and objects beyond the
//! depth limit, are serialized whole into a single text column. Keys are
//! normalized to snake_case at every level.

use crate::errors::{Result, WorkbenchError};
use crate::naming::to_snake_case;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// One flattened record: canonical column name -> scalar JSON value.
///
/// A FlatRow never holds a raw object or array; composites are serialized
/// to JSON text at the point they stop being expanded.
pub type FlatRow = BTreeMap<String, Value>;

/// Flattening options.
#[derive(Debug, Clone, Copy)]
pub struct FlattenOptions {
    /// How many levels of object nesting to expand into prefixed columns.
    /// Objects nested deeper than this, and arrays at any level, are
    /// serialized to JSON text. The default of 1 expands one level, which
    /// matches the upstream API shapes (e.g. `address.city` -> `address_city`).
    pub max_expand_depth: usize,
}

impl Default for FlattenOptions {
    fn default() -> Self {
        Self { max_expand_depth: 1 }
    }
}

/// Flatten a single JSON object into a FlatRow.
///
/// An empty object yields an empty row; there are no failure modes.
pub fn flatten_record(record: &Map<String, Value>, opts: FlattenOptions) -> FlatRow {
    let mut row = FlatRow::new();
    flatten_into(&mut row, None, record, opts.max_expand_depth);
    row
}

fn flatten_into(
    row: &mut FlatRow,
    prefix: Option<&str>,
    object: &Map<String, Value>,
    depth: usize,
) {
    for (key, value) in object {
        let normalized = to_snake_case(key);
        let column = match prefix {
            Some(prefix) => format!("{}_{}", prefix, normalized),
            None => normalized,
        };
        match value {
            Value::Object(sub) if depth > 0 => {
                flatten_into(row, Some(&column), sub, depth - 1);
            }
            // Arrays at any level, and objects past the expansion depth,
            // become serialized JSON text.
            Value::Object(_) | Value::Array(_) => {
                row.insert(column, Value::String(value.to_string()));
            }
            scalar => {
                row.insert(column, scalar.clone());
            }
        }
    }
}

/// Flatten an ordered sequence of JSON objects, preserving input order.
///
/// Records are not required to share the same key set; each row simply
/// carries the columns its record produced. A non-object element is a
/// data-format error and nothing is returned for the whole sequence.
pub fn flatten_records(records: &[Value], opts: FlattenOptions) -> Result<Vec<FlatRow>> {
    records
        .iter()
        .map(|record| match record {
            Value::Object(map) => Ok(flatten_record(map, opts)),
            other => Err(WorkbenchError::data_format(format!(
                "expected a JSON object in record sequence, got {}",
                json_kind(other)
            ))),
        })
        .collect()
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn as_map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn test_flatten_mixed_record() {
        let record = as_map(json!({
            "userId": 1,
            "address": {"city": "X", "zip": "1"},
            "tags": ["a", "b"]
        }));

        let row = flatten_record(&record, FlattenOptions::default());

        let columns: Vec<&str> = row.keys().map(String::as_str).collect();
        assert_eq!(columns, vec!["address_city", "address_zip", "tags", "user_id"]);
        assert_eq!(row["user_id"], json!(1));
        assert_eq!(row["address_city"], json!("X"));
        assert_eq!(row["address_zip"], json!("1"));
        // The array is serialized, not expanded.
        assert_eq!(row["tags"], json!("[\"a\",\"b\"]"));
        assert!(row.values().all(|v| !v.is_object() && !v.is_array()));
    }

    #[test]
    fn test_nested_keys_are_normalized() {
        let record = as_map(json!({
            "homeAddress": {"zipCode": "02110", "streetName": "Main"}
        }));
        let row = flatten_record(&record, FlattenOptions::default());
        assert!(row.contains_key("home_address_zip_code"));
        assert!(row.contains_key("home_address_street_name"));
    }

    #[test]
    fn test_deep_object_is_serialized_at_depth_limit() {
        let record = as_map(json!({
            "owner": {"contact": {"email": "a@b.c"}}
        }));

        let row = flatten_record(&record, FlattenOptions::default());
        assert_eq!(row["owner_contact"], json!("{\"email\":\"a@b.c\"}"));

        // With a deeper limit the same field expands instead.
        let row = flatten_record(&record, FlattenOptions { max_expand_depth: 2 });
        assert_eq!(row["owner_contact_email"], json!("a@b.c"));
    }

    #[test]
    fn test_empty_record_yields_empty_row() {
        let record = as_map(json!({}));
        assert!(flatten_record(&record, FlattenOptions::default()).is_empty());
    }

    #[test]
    fn test_flatten_records_preserves_order_and_divergent_keys() {
        let records = vec![
            json!({"id": 1, "name": "A"}),
            json!({"id": 2, "extra": true}),
        ];
        let rows = flatten_records(&records, FlattenOptions::default()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["id"], json!(1));
        assert!(!rows[0].contains_key("extra"));
        assert_eq!(rows[1]["extra"], json!(true));
    }

    #[test]
    fn test_flatten_records_empty_sequence() {
        let rows = flatten_records(&[], FlattenOptions::default()).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_non_object_element_is_data_format_error() {
        let records = vec![json!({"id": 1}), json!(42)];
        let err = flatten_records(&records, FlattenOptions::default()).unwrap_err();
        assert!(matches!(err, WorkbenchError::DataFormat(_)));
    }
}
