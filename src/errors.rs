//! Error types for the workbench.
//!
//! Every failure is recoverable at the boundary of the operation that
//! produced it: nothing here terminates the session or leaves the table
//! registry in a partial state.

use std::collections::BTreeMap;
use thiserror::Error;

/// Main error type for folioquery operations.
#[derive(Error, Debug)]
pub enum WorkbenchError {
    /// Upstream response did not match the expected record/record-sequence
    /// shape. No partial table is stored when this is raised.
    #[error("Data format error: {0}")]
    DataFormat(String),

    /// A query referenced a column or table the engine could not resolve.
    /// Carries the column names of every table currently visible to the
    /// query, so the caller can correct the query.
    #[error("Unknown column or table: {message}")]
    UnknownColumn {
        message: String,
        /// Table alias -> column names, for every table in the namespace.
        available: BTreeMap<String, Vec<String>>,
    },

    /// Any other engine-reported failure (syntax error, type mismatch),
    /// surfaced verbatim.
    #[error("Query failed: {0}")]
    Query(String),

    /// A canned query was selected before its required tables were loaded.
    /// This is a pre-execution guard; the engine is never invoked.
    #[error("canned query '{query}' requires tables that are not loaded: {missing:?}")]
    MissingPrerequisite {
        query: String,
        missing: Vec<String>,
    },

    #[error("No canned query named '{0}'")]
    UnknownCannedQuery(String),

    #[error("API error [{status}]: {message}")]
    Api { status: u16, message: String },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkbenchError {
    /// Create a DataFormat error with a message.
    pub fn data_format(msg: impl Into<String>) -> Self {
        Self::DataFormat(msg.into())
    }

    /// Create a generic query error with a message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Create a schema error with a message.
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    /// Create a configuration error with a message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an authentication error with a message.
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    /// Create an unknown-column error carrying the per-table column report.
    pub fn unknown_column(
        msg: impl Into<String>,
        available: BTreeMap<String, Vec<String>>,
    ) -> Self {
        Self::UnknownColumn {
            message: msg.into(),
            available,
        }
    }

    /// Create a missing-prerequisite guard failure.
    pub fn missing_prerequisite(
        query: impl Into<String>,
        missing: Vec<String>,
    ) -> Self {
        Self::MissingPrerequisite {
            query: query.into(),
            missing,
        }
    }
}

/// Result type alias using WorkbenchError.
pub type Result<T> = std::result::Result<T, WorkbenchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = WorkbenchError::data_format("expected a JSON array");
        assert_eq!(err.to_string(), "Data format error: expected a JSON array");

        let err = WorkbenchError::missing_prerequisite(
            "Users with Most Portfolios",
            vec!["portfolios".to_string()],
        );
        assert!(err.to_string().contains("portfolios"));
        assert!(err.to_string().contains("Users with Most Portfolios"));
    }

    #[test]
    fn test_unknown_column_carries_report() {
        let mut available = BTreeMap::new();
        available.insert("users".to_string(), vec!["id".to_string(), "name".to_string()]);
        let err = WorkbenchError::unknown_column("no field named nonexistent_col", available);
        match err {
            WorkbenchError::UnknownColumn { available, .. } => {
                assert_eq!(available["users"], vec!["id", "name"]);
            }
            other => panic!("unexpected variant: {other}"),
        }
    }
}
