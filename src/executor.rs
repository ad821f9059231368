//! Query execution against the embedded engine
//!
//! A fresh DataFusion session is created per query; every non-empty table
//! is sanitized and registered under its lowercased alias, the SQL text is
//! executed, and the resulting batches are converted back to JSON rows.
//! SQL semantics (joins, grouping, HAVING, subqueries, window functions)
//! belong entirely to the engine; this module only supplies well-formed
//! relations and classifies the engine's failures.

use crate::config::QuerySettings;
use crate::errors::{Result, WorkbenchError};
use crate::registry::TableRegistry;
use crate::sanitize::{sanitize_table, SanitizedTable};
use crate::schema::to_record_batch;
use datafusion::arrow::record_batch::RecordBatch;
use datafusion::common::SchemaError;
use datafusion::error::DataFusionError;
use datafusion::prelude::{SessionConfig, SessionContext};
use datafusion::scalar::ScalarValue;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// The set of sanitized tables visible to one query execution.
///
/// Built fresh per query from whichever tables are currently non-empty;
/// aliases are the lowercased table names.
#[derive(Debug, Default)]
pub struct QueryNamespace {
    entries: Vec<(String, SanitizedTable)>,
}

impl QueryNamespace {
    /// Sanitize every non-empty table in the registry into a namespace.
    pub fn from_registry(registry: &TableRegistry) -> Self {
        let entries = registry
            .non_empty()
            .into_iter()
            .map(|table| (table.name().to_lowercase(), sanitize_table(table)))
            .collect();
        Self { entries }
    }

    pub fn aliases(&self) -> Vec<&str> {
        self.entries.iter().map(|(alias, _)| alias.as_str()).collect()
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.entries.iter().any(|(a, _)| a == alias)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Alias -> column names, for every table in the namespace. Attached to
    /// unknown-column failures so the caller can correct the query.
    pub fn column_report(&self) -> BTreeMap<String, Vec<String>> {
        self.entries
            .iter()
            .map(|(alias, table)| (alias.clone(), table.columns()))
            .collect()
    }

    fn entries(&self) -> &[(String, SanitizedTable)] {
        &self.entries
    }
}

/// A query result: ordered rows with engine-determined columns.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutput {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl QueryOutput {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Executes declarative queries over a QueryNamespace.
#[derive(Debug, Clone)]
pub struct QueryExecutor {
    batch_size: usize,
    target_partitions: usize,
}

impl QueryExecutor {
    pub fn new(settings: &QuerySettings) -> Self {
        Self {
            batch_size: settings.batch_size,
            target_partitions: settings.target_partitions.max(1),
        }
    }

    fn session(&self) -> SessionContext {
        let config = SessionConfig::new()
            .with_information_schema(true)
            .with_batch_size(self.batch_size)
            .with_target_partitions(self.target_partitions);
        SessionContext::new_with_config(config)
    }

    /// Execute a SQL query against the namespace.
    ///
    /// Returns the result rows, or a classified failure: unknown columns
    /// and unknown tables carry the column report of every visible table;
    /// everything else surfaces the engine message verbatim.
    pub async fn execute(&self, sql: &str, namespace: &QueryNamespace) -> Result<QueryOutput> {
        let ctx = self.session();
        for (alias, table) in namespace.entries() {
            let batch = to_record_batch(table)?;
            debug!(table = %alias, rows = batch.num_rows(), "registering table");
            ctx.register_batch(alias, batch)
                .map_err(|e| classify_engine_error(e, namespace))?;
        }

        let frame = ctx
            .sql(sql)
            .await
            .map_err(|e| classify_engine_error(e, namespace))?;
        let columns: Vec<String> = frame
            .schema()
            .fields()
            .iter()
            .map(|field| field.name().clone())
            .collect();
        let batches = frame
            .collect()
            .await
            .map_err(|e| classify_engine_error(e, namespace))?;

        batches_to_output(columns, &batches)
    }
}

impl Default for QueryExecutor {
    fn default() -> Self {
        Self::new(&QuerySettings::default())
    }
}

/// Map an engine error onto the workbench taxonomy.
///
/// Column resolution failures arrive as structured `SchemaError`s, so no
/// message sniffing is needed for them. Missing relations only surface as
/// planning errors with no dedicated variant; that single case inspects
/// the plan message.
fn classify_engine_error(err: DataFusionError, namespace: &QueryNamespace) -> WorkbenchError {
    match err.find_root() {
        DataFusionError::SchemaError(SchemaError::FieldNotFound { .. }, _) => {
            WorkbenchError::unknown_column(err.to_string(), namespace.column_report())
        }
        DataFusionError::Plan(message) if message.contains("not found") => {
            WorkbenchError::unknown_column(err.to_string(), namespace.column_report())
        }
        _ => WorkbenchError::query(err.to_string()),
    }
}

fn batches_to_output(columns: Vec<String>, batches: &[RecordBatch]) -> Result<QueryOutput> {
    let mut rows = Vec::new();
    for batch in batches {
        for row_idx in 0..batch.num_rows() {
            let mut row = Vec::with_capacity(batch.num_columns());
            for col_idx in 0..batch.num_columns() {
                let scalar = ScalarValue::try_from_array(batch.column(col_idx), row_idx)
                    .map_err(|e| {
                        WorkbenchError::query(format!("failed to extract result value: {e}"))
                    })?;
                row.push(scalar_to_json(&scalar));
            }
            rows.push(row);
        }
    }
    Ok(QueryOutput { columns, rows })
}

/// Convert an engine scalar into a JSON value for display.
fn scalar_to_json(value: &ScalarValue) -> Value {
    match value {
        ScalarValue::Null => Value::Null,
        ScalarValue::Boolean(v) => v.map(Value::Bool).unwrap_or(Value::Null),
        ScalarValue::Int8(v) => v.map(|i| Value::Number(i.into())).unwrap_or(Value::Null),
        ScalarValue::Int16(v) => v.map(|i| Value::Number(i.into())).unwrap_or(Value::Null),
        ScalarValue::Int32(v) => v.map(|i| Value::Number(i.into())).unwrap_or(Value::Null),
        ScalarValue::Int64(v) => v.map(|i| Value::Number(i.into())).unwrap_or(Value::Null),
        ScalarValue::UInt8(v) => v.map(|i| Value::Number(i.into())).unwrap_or(Value::Null),
        ScalarValue::UInt16(v) => v.map(|i| Value::Number(i.into())).unwrap_or(Value::Null),
        ScalarValue::UInt32(v) => v.map(|i| Value::Number(i.into())).unwrap_or(Value::Null),
        ScalarValue::UInt64(v) => v.map(|i| Value::Number(i.into())).unwrap_or(Value::Null),
        ScalarValue::Float32(v) => v
            .and_then(|f| serde_json::Number::from_f64(f as f64))
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ScalarValue::Float64(v) => v
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ScalarValue::Utf8(v) | ScalarValue::LargeUtf8(v) | ScalarValue::Utf8View(v) => {
            v.clone().map(Value::String).unwrap_or(Value::Null)
        }
        // Dates, timestamps, intervals: render through the engine's display.
        other => {
            if other.is_null() {
                Value::Null
            } else {
                Value::String(other.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::FlatRow;
    use crate::registry::Table;
    use serde_json::json;

    fn row(pairs: &[(&str, serde_json::Value)]) -> FlatRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn demo_registry() -> TableRegistry {
        let mut registry = TableRegistry::new();
        registry.replace(Table::new(
            "users",
            vec![row(&[("id", json!(1)), ("name", json!("A"))])],
        ));
        registry.replace(Table::new(
            "portfolios",
            vec![row(&[("id", json!(10)), ("user_id", json!(1))])],
        ));
        registry
    }

    #[test]
    fn test_namespace_excludes_empty_tables() {
        let mut registry = demo_registry();
        registry.replace(Table::new("assets", vec![]));
        let namespace = QueryNamespace::from_registry(&registry);
        assert!(namespace.contains("users"));
        assert!(namespace.contains("portfolios"));
        assert!(!namespace.contains("assets"));
    }

    #[test]
    fn test_namespace_lowercases_aliases() {
        let mut registry = TableRegistry::new();
        registry.replace(Table::new("Users", vec![row(&[("id", json!(1))])]));
        let namespace = QueryNamespace::from_registry(&registry);
        assert_eq!(namespace.aliases(), vec!["users"]);
    }

    #[tokio::test]
    async fn test_join_with_aggregation() {
        let namespace = QueryNamespace::from_registry(&demo_registry());
        let executor = QueryExecutor::default();

        let output = executor
            .execute(
                "SELECT u.id, COUNT(p.id) AS n FROM users u \
                 JOIN portfolios p ON u.id = p.user_id GROUP BY u.id",
                &namespace,
            )
            .await
            .unwrap();

        assert_eq!(output.columns, vec!["id", "n"]);
        assert_eq!(output.rows, vec![vec![json!(1), json!(1)]]);
    }

    #[tokio::test]
    async fn test_unknown_column_is_classified_with_report() {
        let namespace = QueryNamespace::from_registry(&demo_registry());
        let executor = QueryExecutor::default();

        let err = executor
            .execute("SELECT nonexistent_col FROM users", &namespace)
            .await
            .unwrap_err();

        match err {
            WorkbenchError::UnknownColumn { available, .. } => {
                let users = &available["users"];
                assert!(users.contains(&"id".to_string()));
                assert!(users.contains(&"name".to_string()));
            }
            other => panic!("expected UnknownColumn, got: {other}"),
        }
    }

    #[tokio::test]
    async fn test_unloaded_table_is_classified_not_a_crash() {
        let namespace = QueryNamespace::from_registry(&demo_registry());
        let executor = QueryExecutor::default();

        let err = executor
            .execute("SELECT * FROM transactions", &namespace)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkbenchError::UnknownColumn { .. }));
    }

    #[tokio::test]
    async fn test_syntax_error_is_generic_query_failure() {
        let namespace = QueryNamespace::from_registry(&demo_registry());
        let executor = QueryExecutor::default();

        let err = executor
            .execute("SELEC wrong FROM users", &namespace)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkbenchError::Query(_)));
    }

    #[tokio::test]
    async fn test_window_function_over_partition() {
        let mut registry = TableRegistry::new();
        registry.replace(Table::new(
            "transactions",
            vec![
                row(&[("id", json!(1)), ("transaction_type", json!("BUY")), ("quantity", json!(10))]),
                row(&[("id", json!(2)), ("transaction_type", json!("BUY")), ("quantity", json!(20))]),
                row(&[("id", json!(3)), ("transaction_type", json!("SELL")), ("quantity", json!(6))]),
            ],
        ));
        let namespace = QueryNamespace::from_registry(&registry);
        let executor = QueryExecutor::default();

        let output = executor
            .execute(
                "SELECT id, AVG(quantity) OVER (PARTITION BY transaction_type) AS avg_quantity \
                 FROM transactions ORDER BY id",
                &namespace,
            )
            .await
            .unwrap();

        assert_eq!(output.rows.len(), 3);
        assert_eq!(output.rows[0][1], json!(15.0));
        assert_eq!(output.rows[2][1], json!(6.0));
    }

    #[tokio::test]
    async fn test_scalar_subquery() {
        let mut registry = TableRegistry::new();
        registry.replace(Table::new(
            "transactions",
            vec![
                row(&[("id", json!(1)), ("quantity", json!(1))]),
                row(&[("id", json!(2)), ("quantity", json!(100))]),
            ],
        ));
        let namespace = QueryNamespace::from_registry(&registry);
        let executor = QueryExecutor::default();

        let output = executor
            .execute(
                "SELECT id FROM transactions \
                 WHERE quantity > (SELECT AVG(quantity) FROM transactions)",
                &namespace,
            )
            .await
            .unwrap();
        assert_eq!(output.rows, vec![vec![json!(2)]]);
    }
}
