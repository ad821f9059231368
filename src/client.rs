//! Portfolio API client
//!
//! Thin HTTP boundary around the upstream REST API: JWT bearer
//! authentication plus the collection fetches the workbench loads tables
//! from. Responses are shape-validated here: a paged envelope
//! (`{"content": [...]}`), a bare array of objects, or a single object are
//! accepted where expected, and anything else is a data-format error, so
//! the flattening layer only ever sees record sequences.

use crate::config::ApiSettings;
use crate::errors::{Result, WorkbenchError};
use crate::flatten::json_kind;
use reqwest::header::CONTENT_TYPE;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// HTTP client for the portfolio API, holding the session's bearer token.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(settings: &ApiSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_seconds))
            .build()?;
        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Authenticate against `auth/login` and store the returned JWT.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<()> {
        let url = format!("{}/auth/login", self.base_url);
        let body = serde_json::json!({ "email": email, "password": password });

        let response = self.http.post(&url).json(&body).send().await?;
        let status = response.status();
        let payload: Value = response.json().await.unwrap_or(Value::Null);

        if !status.is_success() {
            let message = payload
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("Unknown error")
                .to_string();
            warn!(status = status.as_u16(), "login rejected");
            return Err(WorkbenchError::auth(message));
        }

        match payload.get("token").and_then(Value::as_str) {
            Some(token) => {
                self.token = Some(token.to_string());
                debug!("login succeeded");
                Ok(())
            }
            None => Err(WorkbenchError::auth(
                "login response did not contain a token",
            )),
        }
    }

    pub fn logout(&mut self) {
        self.token = None;
    }

    /// Paged user listing: `users?page=..&size=..&sortBy=..`.
    pub async fn fetch_users(&self, page: u32, size: u32, sort_by: &str) -> Result<Vec<Value>> {
        let value = self
            .get_json(&format!("users?page={page}&size={size}&sortBy={sort_by}"))
            .await?;
        expect_paged_records(value)
    }

    pub async fn fetch_portfolios(&self, user_id: u64) -> Result<Vec<Value>> {
        let value = self.get_json(&format!("portfolios/user/{user_id}")).await?;
        expect_records(value)
    }

    pub async fn fetch_assets(&self, portfolio_id: u64) -> Result<Vec<Value>> {
        let value = self.get_json(&format!("assets/portfolio/{portfolio_id}")).await?;
        expect_records(value)
    }

    pub async fn fetch_transactions(&self, asset_id: u64) -> Result<Vec<Value>> {
        let value = self.get_json(&format!("transactions/asset/{asset_id}")).await?;
        expect_records(value)
    }

    /// Total user count: `users/count` returns `{"count": N}`.
    pub async fn user_count(&self) -> Result<u64> {
        let value = self.get_json("users/count").await?;
        value
            .get("count")
            .and_then(Value::as_u64)
            .ok_or_else(|| WorkbenchError::data_format("users/count response missing 'count'"))
    }

    /// Health endpoint, served at the server root rather than the API prefix.
    pub async fn health(&self) -> Result<Value> {
        let root = self.base_url.trim_end_matches("/api");
        self.get_absolute(&format!("{root}/health")).await
    }

    async fn get_json(&self, path: &str) -> Result<Value> {
        self.get_absolute(&format!("{}/{}", self.base_url, path)).await
    }

    async fn get_absolute(&self, url: &str) -> Result<Value> {
        debug!(%url, "GET");
        let mut request = self.http.get(url).header(CONTENT_TYPE, "application/json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(WorkbenchError::Api {
                status: status.as_u16(),
                message: text,
            });
        }

        if text.is_empty() {
            return Ok(Value::Object(Map::new()));
        }
        serde_json::from_str(&text)
            .map_err(|e| WorkbenchError::data_format(format!("response is not valid JSON: {e}")))
    }
}

/// Accept an array of objects, or a single object (wrapped as one record).
pub(crate) fn expect_records(value: Value) -> Result<Vec<Value>> {
    match value {
        Value::Array(items) => {
            if let Some(bad) = items.iter().find(|item| !item.is_object()) {
                return Err(WorkbenchError::data_format(format!(
                    "record sequence contains a {} element",
                    json_kind(bad)
                )));
            }
            Ok(items)
        }
        Value::Object(_) => Ok(vec![value]),
        other => Err(WorkbenchError::data_format(format!(
            "expected a record or record sequence, got {}",
            json_kind(&other)
        ))),
    }
}

/// Accept a paged envelope `{"content": [...]}` and unwrap its records.
pub(crate) fn expect_paged_records(value: Value) -> Result<Vec<Value>> {
    match value {
        Value::Object(mut map) => match map.remove("content") {
            Some(content @ Value::Array(_)) => expect_records(content),
            Some(other) => Err(WorkbenchError::data_format(format!(
                "paged 'content' is a {}, expected an array",
                json_kind(&other)
            ))),
            None => Err(WorkbenchError::data_format(
                "paged response has no 'content' field",
            )),
        },
        other => Err(WorkbenchError::data_format(format!(
            "expected a paged envelope object, got {}",
            json_kind(&other)
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_expect_records_accepts_array_of_objects() {
        let records = expect_records(json!([{"id": 1}, {"id": 2}])).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_expect_records_wraps_single_object() {
        let records = expect_records(json!({"id": 1})).unwrap();
        assert_eq!(records, vec![json!({"id": 1})]);
    }

    #[test]
    fn test_expect_records_rejects_scalars_and_mixed_arrays() {
        assert!(matches!(
            expect_records(json!("nope")),
            Err(WorkbenchError::DataFormat(_))
        ));
        assert!(matches!(
            expect_records(json!([{"id": 1}, 42])),
            Err(WorkbenchError::DataFormat(_))
        ));
    }

    #[test]
    fn test_expect_paged_records() {
        let records = expect_paged_records(json!({"content": [{"id": 1}], "totalPages": 3})).unwrap();
        assert_eq!(records, vec![json!({"id": 1})]);

        assert!(matches!(
            expect_paged_records(json!({"items": []})),
            Err(WorkbenchError::DataFormat(_))
        ));
        assert!(matches!(
            expect_paged_records(json!([1, 2])),
            Err(WorkbenchError::DataFormat(_))
        ));
        assert!(matches!(
            expect_paged_records(json!({"content": "x"})),
            Err(WorkbenchError::DataFormat(_))
        ));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ApiClient::new(&ApiSettings {
            base_url: "http://localhost:8080/api/".to_string(),
            request_timeout_seconds: 5,
        })
        .unwrap();
        assert_eq!(client.base_url, "http://localhost:8080/api");
        assert!(!client.is_authenticated());
    }
}
