//! Schema inference and Arrow materialization
//!
//! The query engine wants typed columnar relations; the tables here are
//! row-oriented JSON with per-row column divergence. This module infers an
//! Arrow schema for a sanitized table (column union in first-seen order,
//! types unified across rows) and transposes the rows into a RecordBatch.
//!
//! Type unification: a column whose non-null values are all booleans maps
//! to Boolean, all i64-representable numbers to Int64, numbers with any
//! fractional value to Float64, all strings to Utf8. Anything mixed widens
//! to Utf8 with scalars rendered as text. Every column is nullable, since
//! a row may simply lack it.

use crate::errors::{Result, WorkbenchError};
use crate::sanitize::SanitizedTable;
use datafusion::arrow::array::{new_empty_array, ArrayRef};
use datafusion::arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use datafusion::arrow::record_batch::RecordBatch;
use datafusion::scalar::ScalarValue;
use serde_json::Value;
use std::sync::Arc;

/// Infer the Arrow schema for a sanitized table.
pub fn infer_schema(table: &SanitizedTable) -> SchemaRef {
    let fields: Vec<Field> = table
        .columns()
        .into_iter()
        .map(|column| {
            let data_type = infer_column_type(table, &column);
            Field::new(column, data_type, true)
        })
        .collect();
    Arc::new(Schema::new(fields))
}

fn infer_column_type(table: &SanitizedTable, column: &str) -> DataType {
    #[derive(PartialEq, Clone, Copy)]
    enum Unified {
        Unknown,
        Bool,
        Int,
        Float,
        Text,
        Mixed,
    }

    let mut unified = Unified::Unknown;
    for row in table.rows() {
        let observed = match row.get(column) {
            None | Some(Value::Null) => continue,
            Some(Value::Bool(_)) => Unified::Bool,
            Some(Value::Number(n)) => {
                if n.as_i64().is_some() {
                    Unified::Int
                } else {
                    Unified::Float
                }
            }
            Some(Value::String(_)) => Unified::Text,
            // Composites cannot appear in a SanitizedTable; widen defensively.
            Some(_) => Unified::Mixed,
        };
        unified = match (unified, observed) {
            (Unified::Unknown, seen) => seen,
            (current, seen) if current == seen => current,
            (Unified::Int, Unified::Float) | (Unified::Float, Unified::Int) => Unified::Float,
            _ => Unified::Mixed,
        };
        if unified == Unified::Mixed {
            break;
        }
    }

    match unified {
        Unified::Bool => DataType::Boolean,
        Unified::Int => DataType::Int64,
        Unified::Float => DataType::Float64,
        // All-null columns and mixed columns both land on Utf8.
        Unified::Unknown | Unified::Text | Unified::Mixed => DataType::Utf8,
    }
}

/// Materialize a sanitized table as an Arrow RecordBatch.
///
/// Missing values become typed NULLs. Rows are transposed into columns and
/// each column is built with `ScalarValue::iter_to_array`.
pub fn to_record_batch(table: &SanitizedTable) -> Result<RecordBatch> {
    let schema = infer_schema(table);

    if table.is_empty() {
        let empty: Vec<ArrayRef> = schema
            .fields()
            .iter()
            .map(|field| new_empty_array(field.data_type()))
            .collect();
        return RecordBatch::try_new(schema, empty)
            .map_err(|e| WorkbenchError::schema(format!("failed to build empty batch: {e}")));
    }

    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(schema.fields().len());
    for field in schema.fields() {
        let scalars: Vec<ScalarValue> = table
            .rows()
            .iter()
            .map(|row| json_to_scalar(row.get(field.name()), field.data_type(), field.name()))
            .collect::<Result<_>>()?;
        let array = ScalarValue::iter_to_array(scalars).map_err(|e| {
            WorkbenchError::schema(format!("failed to build column '{}': {e}", field.name()))
        })?;
        arrays.push(array);
    }

    RecordBatch::try_new(schema, arrays)
        .map_err(|e| WorkbenchError::schema(format!("failed to build record batch: {e}")))
}

fn json_to_scalar(
    value: Option<&Value>,
    data_type: &DataType,
    column: &str,
) -> Result<ScalarValue> {
    let value = match value {
        None | Some(Value::Null) => return typed_null(data_type, column),
        Some(v) => v,
    };

    match data_type {
        DataType::Boolean => match value {
            Value::Bool(b) => Ok(ScalarValue::Boolean(Some(*b))),
            other => mismatch(column, data_type, other),
        },
        DataType::Int64 => match value.as_i64() {
            Some(i) => Ok(ScalarValue::Int64(Some(i))),
            None => mismatch(column, data_type, value),
        },
        DataType::Float64 => match value.as_f64() {
            Some(f) => Ok(ScalarValue::Float64(Some(f))),
            None => mismatch(column, data_type, value),
        },
        DataType::Utf8 => Ok(ScalarValue::Utf8(Some(match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }))),
        other => Err(WorkbenchError::schema(format!(
            "unsupported inferred type {other:?} for column '{column}'"
        ))),
    }
}

fn typed_null(data_type: &DataType, column: &str) -> Result<ScalarValue> {
    ScalarValue::try_from(data_type)
        .map_err(|e| WorkbenchError::schema(format!("failed to build NULL for '{column}': {e}")))
}

fn mismatch(column: &str, data_type: &DataType, value: &Value) -> Result<ScalarValue> {
    Err(WorkbenchError::schema(format!(
        "value {value} does not fit inferred type {data_type:?} for column '{column}'"
    )))
}
