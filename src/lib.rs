//! folioquery: SQL analytics workbench over a portfolio REST API
//!
//! Fetches nested JSON collections (users, portfolios, assets,
//! transactions), flattens them into schema-on-read in-memory tables, and
//! runs ad-hoc or canned SQL over them through DataFusion.
//!
//! Raw JSON from the API boundary goes through [`flatten`] to produce
//! flat rows, which live in a [`registry::TableRegistry`] keyed by table
//! name with replace-on-fetch semantics. Per query, [`sanitize`] makes
//! every column engine-safe, [`schema`] materializes Arrow batches, and
//! [`executor`] binds them into a fresh engine session and executes the
//! SQL text. Tables exist only for the session; there is no persistence
//! and no fixed schema across fetches.

pub mod catalog;
pub mod client;
pub mod config;
pub mod errors;
pub mod executor;
pub mod flatten;
pub mod logging;
pub mod naming;
pub mod registry;
pub mod sanitize;
pub mod schema;
pub mod workbench;

pub use catalog::CannedQuery;
pub use client::ApiClient;
pub use config::WorkbenchConfig;
pub use errors::{Result, WorkbenchError};
pub use executor::{QueryExecutor, QueryNamespace, QueryOutput};
pub use flatten::{flatten_record, flatten_records, FlatRow, FlattenOptions};
pub use naming::to_snake_case;
pub use registry::{Table, TableRegistry};
pub use sanitize::{sanitize_table, SanitizedTable};
pub use workbench::Workbench;
