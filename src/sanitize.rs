//! Query-safety preprocessing
//!
//! The query engine only accepts scalar column values. Flattening already
//! serializes composites it encounters, but the registry accepts rows from
//! any caller, so before a table is registered for querying every column
//! that holds an object or array anywhere is passed through JSON text
//! serialization. Scalar values pass through untouched.

use crate::flatten::FlatRow;
use crate::registry::{columns_of, Table};
use serde_json::Value;
use std::collections::HashSet;

/// A table in which every column value is a plain scalar
/// (string, number, boolean, null) and therefore engine-safe.
#[derive(Debug, Clone)]
pub struct SanitizedTable {
    name: String,
    rows: Vec<FlatRow>,
}

impl SanitizedTable {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rows(&self) -> &[FlatRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Union of column names across all rows, in first-seen order.
    pub fn columns(&self) -> Vec<String> {
        columns_of(&self.rows)
    }
}

/// Derive a SanitizedTable from a Table.
///
/// Operates on a copy and never mutates the input. Deterministic: the same
/// input always produces identical output, so applying it twice is the
/// same as applying it once.
pub fn sanitize_table(table: &Table) -> SanitizedTable {
    let composite_columns: HashSet<&str> = table
        .rows()
        .iter()
        .flat_map(|row| row.iter())
        .filter(|(_, value)| value.is_object() || value.is_array())
        .map(|(column, _)| column.as_str())
        .collect();

    let rows = table
        .rows()
        .iter()
        .map(|row| {
            row.iter()
                .map(|(column, value)| {
                    let value = if composite_columns.contains(column.as_str()) {
                        serialize_composite(value)
                    } else {
                        value.clone()
                    };
                    (column.clone(), value)
                })
                .collect()
        })
        .collect();

    SanitizedTable {
        name: table.name().to_string(),
        rows,
    }
}

fn serialize_composite(value: &Value) -> Value {
    match value {
        Value::Object(_) | Value::Array(_) => Value::String(value.to_string()),
        scalar => scalar.clone(),
    }
}
