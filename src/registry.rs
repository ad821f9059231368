//! Named in-memory tables with replace-on-fetch semantics.
//!
//! The registry is session-scoped state owned by the `Workbench`: every
//! fetch fully replaces the table of the same name, and the query layer
//! reads whichever tables are currently non-empty. Nothing here persists
//! beyond the session.

use crate::flatten::FlatRow;
use std::collections::{HashMap, HashSet};

/// An ordered collection of flat rows sharing a logical name.
///
/// Rows are not required to share identical column sets; missing columns
/// materialize as NULLs when the table is handed to the query engine.
#[derive(Debug, Clone, Default)]
pub struct Table {
    name: String,
    rows: Vec<FlatRow>,
}

impl Table {
    pub fn new(name: impl Into<String>, rows: Vec<FlatRow>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rows(&self) -> &[FlatRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Union of column names across all rows, in first-seen order.
    pub fn columns(&self) -> Vec<String> {
        columns_of(&self.rows)
    }
}

pub(crate) fn columns_of(rows: &[FlatRow]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut columns = Vec::new();
    for row in rows {
        for column in row.keys() {
            if seen.insert(column.clone()) {
                columns.push(column.clone());
            }
        }
    }
    columns
}

/// Holds zero or more named tables, each independently loaded and
/// independently possibly-empty.
#[derive(Debug, Default)]
pub struct TableRegistry {
    tables: HashMap<String, Table>,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a table under its name, fully replacing any previous table of
    /// the same name. Returns the displaced table, if any.
    pub fn replace(&mut self, table: Table) -> Option<Table> {
        self.tables.insert(table.name().to_string(), table)
    }

    pub fn get(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    /// Names of all registered tables, sorted for stable display.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// All currently non-empty tables, sorted by name. Only these are
    /// visible to query execution.
    pub fn non_empty(&self) -> Vec<&Table> {
        let mut tables: Vec<&Table> =
            self.tables.values().filter(|t| !t.is_empty()).collect();
        tables.sort_unstable_by(|a, b| a.name().cmp(b.name()));
        tables
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(pairs: &[(&str, serde_json::Value)]) -> FlatRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_replace_on_fetch() {
        let mut registry = TableRegistry::new();
        registry.replace(Table::new("users", vec![row(&[("id", json!(1))])]));
        registry.replace(Table::new(
            "users",
            vec![row(&[("id", json!(2))]), row(&[("id", json!(3))])],
        ));

        let users = registry.get("users").unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users.rows()[0]["id"], json!(2));
    }

    #[test]
    fn test_empty_table_excluded_from_non_empty() {
        let mut registry = TableRegistry::new();
        registry.replace(Table::new("users", vec![row(&[("id", json!(1))])]));
        registry.replace(Table::new("assets", vec![]));

        let visible: Vec<&str> = registry.non_empty().iter().map(|t| t.name()).collect();
        assert_eq!(visible, vec!["users"]);
        assert_eq!(registry.names(), vec!["assets", "users"]);
    }

    #[test]
    fn test_columns_first_seen_order() {
        let table = Table::new(
            "t",
            vec![
                row(&[("b", json!(1)), ("a", json!(2))]),
                row(&[("c", json!(3)), ("a", json!(4))]),
            ],
        );
        // BTreeMap rows iterate sorted, so "a" precedes "b" in the first row.
        assert_eq!(table.columns(), vec!["a", "b", "c"]);
    }
}
