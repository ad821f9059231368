//! Canned query catalog
//!
//! A fixed library of parameterless analytics queries over the known table
//! aliases (users, portfolios, assets, transactions). Each entry declares
//! which tables it needs; entries whose prerequisites are not loaded are
//! blocked before the engine is ever invoked.

use crate::executor::QueryNamespace;

/// A predefined query template, gated on table availability.
#[derive(Debug, Clone, Copy)]
pub struct CannedQuery {
    pub name: &'static str,
    pub description: &'static str,
    /// Table aliases that must be present in the namespace.
    pub required_tables: &'static [&'static str],
    pub sql: &'static str,
}

impl CannedQuery {
    /// Required tables missing from the namespace, in declaration order.
    pub fn missing_tables(&self, namespace: &QueryNamespace) -> Vec<String> {
        self.required_tables
            .iter()
            .filter(|alias| !namespace.contains(alias))
            .map(|alias| alias.to_string())
            .collect()
    }
}

/// Look up a catalog entry by name, case-insensitively.
pub fn find(name: &str) -> Option<&'static CannedQuery> {
    entries()
        .iter()
        .find(|entry| entry.name.eq_ignore_ascii_case(name))
}

/// The full catalog, in display order.
pub fn entries() -> &'static [CannedQuery] {
    CATALOG
}

static CATALOG: &[CannedQuery] = &[
    CannedQuery {
        name: "Users with Most Portfolios",
        description: "Portfolio count per user, most first",
        required_tables: &["users", "portfolios"],
        sql: "SELECT u.id, u.name, COUNT(p.id) AS portfolio_count \
              FROM users u \
              JOIN portfolios p ON u.id = p.user_id \
              GROUP BY u.id, u.name \
              ORDER BY portfolio_count DESC",
    },
    CannedQuery {
        name: "Assets with Highest Total Value",
        description: "Top ten symbol/type pairs by summed value",
        required_tables: &["assets"],
        sql: "SELECT symbol, asset_type, SUM(total_value) AS total_value_sum \
              FROM assets \
              GROUP BY symbol, asset_type \
              ORDER BY total_value_sum DESC \
              LIMIT 10",
    },
    CannedQuery {
        name: "Transactions Summary per Asset",
        description: "Trade count and total quantity per symbol",
        required_tables: &["transactions", "assets"],
        sql: "SELECT a.symbol, COUNT(t.id) AS transaction_count, SUM(t.quantity) AS total_quantity \
              FROM transactions t \
              JOIN assets a ON t.asset_id = a.id \
              GROUP BY a.symbol \
              ORDER BY transaction_count DESC",
    },
    CannedQuery {
        name: "Users with No Portfolios",
        description: "Users without a single portfolio",
        required_tables: &["users", "portfolios"],
        sql: "SELECT u.id, u.name \
              FROM users u \
              LEFT JOIN portfolios p ON u.id = p.user_id \
              WHERE p.id IS NULL",
    },
    CannedQuery {
        name: "Portfolios with No Assets",
        description: "Portfolios without a single asset",
        required_tables: &["portfolios", "assets"],
        sql: "SELECT p.id, p.portfolio_name \
              FROM portfolios p \
              LEFT JOIN assets a ON p.id = a.portfolio_id \
              WHERE a.id IS NULL",
    },
    CannedQuery {
        name: "Top 5 Most Traded Assets",
        description: "Symbols by number of trades",
        required_tables: &["transactions", "assets"],
        sql: "SELECT a.symbol, COUNT(t.id) AS trade_count \
              FROM transactions t \
              JOIN assets a ON t.asset_id = a.id \
              GROUP BY a.symbol \
              ORDER BY trade_count DESC \
              LIMIT 5",
    },
    CannedQuery {
        name: "Average Asset Value per Portfolio",
        description: "Mean asset value per portfolio name",
        required_tables: &["assets", "portfolios"],
        sql: "SELECT p.portfolio_name, AVG(a.total_value) AS average_value \
              FROM assets a \
              JOIN portfolios p ON a.portfolio_id = p.id \
              GROUP BY p.portfolio_name \
              ORDER BY average_value DESC",
    },
    CannedQuery {
        name: "Users with Portfolios Exceeding a Total Value",
        description: "Users whose combined holdings exceed 100,000",
        required_tables: &["users", "portfolios", "assets"],
        sql: "SELECT u.id, u.name, SUM(a.total_value) AS total_portfolio_value \
              FROM users u \
              JOIN portfolios p ON u.id = p.user_id \
              JOIN assets a ON p.id = a.portfolio_id \
              GROUP BY u.id, u.name \
              HAVING SUM(a.total_value) > 100000 \
              ORDER BY total_portfolio_value DESC",
    },
    CannedQuery {
        name: "Assets Purchased in Last 30 Days",
        description: "Recently purchased assets",
        required_tables: &["assets"],
        sql: "SELECT * FROM assets \
              WHERE CAST(purchase_date AS TIMESTAMP) >= now() - INTERVAL '30 days'",
    },
    CannedQuery {
        name: "Users by Age Group",
        description: "User counts bucketed by decade of age",
        required_tables: &["users"],
        sql: "SELECT CASE \
                  WHEN CAST(date_of_birth AS DATE) <= current_date() - INTERVAL '60 years' THEN '60+' \
                  WHEN CAST(date_of_birth AS DATE) <= current_date() - INTERVAL '50 years' THEN '50-59' \
                  WHEN CAST(date_of_birth AS DATE) <= current_date() - INTERVAL '40 years' THEN '40-49' \
                  WHEN CAST(date_of_birth AS DATE) <= current_date() - INTERVAL '30 years' THEN '30-39' \
                  ELSE 'Under 30' \
              END AS age_group, \
              COUNT(*) AS user_count \
              FROM users \
              GROUP BY age_group \
              ORDER BY CASE age_group \
                  WHEN 'Under 30' THEN 1 \
                  WHEN '30-39' THEN 2 \
                  WHEN '40-49' THEN 3 \
                  WHEN '50-59' THEN 4 \
                  WHEN '60+' THEN 5 \
              END",
    },
    CannedQuery {
        name: "Assets Distribution by Type",
        description: "Asset counts per asset type",
        required_tables: &["assets"],
        sql: "SELECT asset_type, COUNT(*) AS asset_count \
              FROM assets \
              GROUP BY asset_type \
              ORDER BY asset_count DESC",
    },
    CannedQuery {
        name: "Transactions Above Average Quantity",
        description: "Trades larger than the mean trade",
        required_tables: &["transactions"],
        sql: "SELECT * FROM transactions \
              WHERE quantity > (SELECT AVG(quantity) FROM transactions) \
              ORDER BY quantity DESC",
    },
    CannedQuery {
        name: "Portfolios with Diversified Assets",
        description: "Portfolios holding three or more asset types",
        required_tables: &["portfolios", "assets"],
        sql: "SELECT p.portfolio_name, COUNT(DISTINCT a.asset_type) AS asset_type_count \
              FROM portfolios p \
              JOIN assets a ON p.id = a.portfolio_id \
              GROUP BY p.portfolio_name \
              HAVING COUNT(DISTINCT a.asset_type) >= 3 \
              ORDER BY asset_type_count DESC",
    },
    CannedQuery {
        name: "Inactive Users (No Transactions)",
        description: "Users whose holdings have never traded",
        required_tables: &["users", "portfolios", "assets", "transactions"],
        sql: "SELECT u.id, u.name \
              FROM users u \
              LEFT JOIN portfolios p ON u.id = p.user_id \
              LEFT JOIN assets a ON p.id = a.portfolio_id \
              LEFT JOIN transactions t ON a.id = t.asset_id \
              WHERE t.id IS NULL \
              GROUP BY u.id, u.name",
    },
    CannedQuery {
        name: "Top Performing Assets by Return Rate",
        description: "Best ten assets by percent gain since purchase",
        required_tables: &["assets"],
        sql: "SELECT symbol, ((current_price - purchase_price) / purchase_price) * 100 AS return_rate \
              FROM assets \
              ORDER BY return_rate DESC \
              LIMIT 10",
    },
    CannedQuery {
        name: "Custom Subquery",
        description: "Users owning portfolios that hold stock assets",
        required_tables: &["users", "portfolios", "assets"],
        sql: "SELECT u.name, p.portfolio_name \
              FROM users u \
              JOIN portfolios p ON u.id = p.user_id \
              WHERE p.id IN (SELECT portfolio_id FROM assets WHERE asset_type = 'Stock')",
    },
    CannedQuery {
        name: "Window Functions Example",
        description: "Per-type average quantity alongside each trade",
        required_tables: &["transactions"],
        sql: "SELECT t.id, t.transaction_type, t.quantity, t.price_per_unit, \
              AVG(t.quantity) OVER (PARTITION BY t.transaction_type) AS avg_quantity \
              FROM transactions t \
              ORDER BY t.transaction_type",
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::FlatRow;
    use crate::registry::{Table, TableRegistry};
    use serde_json::json;

    fn namespace_with(names: &[&str]) -> QueryNamespace {
        let mut registry = TableRegistry::new();
        for name in names {
            let mut row = FlatRow::new();
            row.insert("id".to_string(), json!(1));
            registry.replace(Table::new(*name, vec![row]));
        }
        QueryNamespace::from_registry(&registry)
    }

    #[test]
    fn test_catalog_is_complete() {
        assert_eq!(entries().len(), 17);
        for entry in entries() {
            assert!(!entry.required_tables.is_empty(), "{}", entry.name);
            assert!(!entry.sql.is_empty(), "{}", entry.name);
        }
    }

    #[test]
    fn test_find_is_case_insensitive() {
        assert!(find("users with most portfolios").is_some());
        assert!(find("Users with Most Portfolios").is_some());
        assert!(find("no such query").is_none());
    }

    #[test]
    fn test_missing_tables_reported() {
        let namespace = namespace_with(&["users"]);
        let entry = find("Transactions Summary per Asset").unwrap();
        assert_eq!(entry.missing_tables(&namespace), vec!["transactions", "assets"]);
    }

    #[test]
    fn test_prerequisites_met() {
        let namespace = namespace_with(&["users", "portfolios"]);
        let entry = find("Users with Most Portfolios").unwrap();
        assert!(entry.missing_tables(&namespace).is_empty());
    }
}
