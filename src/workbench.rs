//! Session-scoped workbench context
//!
//! Owns the table registry, the API client, and the query executor for one
//! interactive session. Loading a collection fetches it, flattens it, and
//! atomically replaces the table of the same name; queries see whatever
//! tables are non-empty at the moment they run. Single-threaded and
//! request-driven: each operation runs to completion before the next.

use crate::catalog;
use crate::client::ApiClient;
use crate::config::WorkbenchConfig;
use crate::errors::{Result, WorkbenchError};
use crate::executor::{QueryExecutor, QueryNamespace, QueryOutput};
use crate::flatten::{flatten_records, FlattenOptions};
use crate::registry::{Table, TableRegistry};
use serde_json::Value;
use tracing::info;

pub struct Workbench {
    client: ApiClient,
    registry: TableRegistry,
    executor: QueryExecutor,
    flatten: FlattenOptions,
}

impl Workbench {
    pub fn new(config: &WorkbenchConfig) -> Result<Self> {
        Ok(Self {
            client: ApiClient::new(&config.api)?,
            registry: TableRegistry::new(),
            executor: QueryExecutor::new(&config.query),
            flatten: FlattenOptions {
                max_expand_depth: config.flatten.max_expand_depth,
            },
        })
    }

    pub fn registry(&self) -> &TableRegistry {
        &self.registry
    }

    pub fn is_authenticated(&self) -> bool {
        self.client.is_authenticated()
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<()> {
        self.client.login(email, password).await
    }

    pub fn logout(&mut self) {
        self.client.logout();
    }

    pub async fn user_count(&self) -> Result<u64> {
        self.client.user_count().await
    }

    pub async fn health(&self) -> Result<Value> {
        self.client.health().await
    }

    /// Fetch a page of users and replace the `users` table.
    pub async fn load_users(&mut self, page: u32, size: u32, sort_by: &str) -> Result<usize> {
        let records = self.client.fetch_users(page, size, sort_by).await?;
        self.load_table("users", &records)
    }

    /// Fetch one user's portfolios and replace the `portfolios` table.
    pub async fn load_portfolios(&mut self, user_id: u64) -> Result<usize> {
        let records = self.client.fetch_portfolios(user_id).await?;
        self.load_table("portfolios", &records)
    }

    /// Fetch one portfolio's assets and replace the `assets` table.
    pub async fn load_assets(&mut self, portfolio_id: u64) -> Result<usize> {
        let records = self.client.fetch_assets(portfolio_id).await?;
        self.load_table("assets", &records)
    }

    /// Fetch one asset's transactions and replace the `transactions` table.
    pub async fn load_transactions(&mut self, asset_id: u64) -> Result<usize> {
        let records = self.client.fetch_transactions(asset_id).await?;
        self.load_table("transactions", &records)
    }

    /// Flatten a record sequence and store it under `name`, replacing any
    /// previous table of that name. Nothing is stored when flattening
    /// fails, so a bad fetch never leaves a partial table behind.
    pub fn load_table(&mut self, name: &str, records: &[Value]) -> Result<usize> {
        let rows = flatten_records(records, self.flatten)?;
        let count = rows.len();
        self.registry.replace(Table::new(name, rows));
        info!(table = name, rows = count, "table loaded");
        Ok(count)
    }

    /// Run a free-form SQL query over the currently non-empty tables.
    pub async fn query(&self, sql: &str) -> Result<QueryOutput> {
        let namespace = QueryNamespace::from_registry(&self.registry);
        self.executor.execute(sql, &namespace).await
    }

    /// Run a canned query by name. Prerequisites are checked before the
    /// engine is invoked; missing tables block the attempt.
    pub async fn run_canned(&self, name: &str) -> Result<QueryOutput> {
        let entry = catalog::find(name)
            .ok_or_else(|| WorkbenchError::UnknownCannedQuery(name.to_string()))?;

        let namespace = QueryNamespace::from_registry(&self.registry);
        let missing = entry.missing_tables(&namespace);
        if !missing.is_empty() {
            return Err(WorkbenchError::missing_prerequisite(entry.name, missing));
        }

        self.executor.execute(entry.sql, &namespace).await
    }
}
