// Configuration module
use crate::errors::{Result, WorkbenchError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main workbench configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkbenchConfig {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub flatten: FlattenSettings,
    #[serde(default)]
    pub query: QuerySettings,
}

/// Portfolio API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Timeout applied to every upstream request, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log file path; no file layer when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default = "default_true")]
    pub log_to_console: bool,
    /// "compact" or "json" (file layer only).
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Flattening settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlattenSettings {
    /// Levels of object nesting expanded into prefixed columns.
    #[serde(default = "default_max_expand_depth")]
    pub max_expand_depth: usize,
}

/// Query engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuerySettings {
    /// Batch size for record processing.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Parallelism of query execution. The tables here are small, so the
    /// default avoids spreading them over many partitions.
    #[serde(default = "default_target_partitions")]
    pub target_partitions: usize,
}

fn default_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_format() -> String {
    "compact".to_string()
}

fn default_max_expand_depth() -> usize {
    1
}

fn default_batch_size() -> usize {
    8192
}

fn default_target_partitions() -> usize {
    1
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_path: None,
            log_to_console: default_true(),
            format: default_log_format(),
        }
    }
}

impl Default for FlattenSettings {
    fn default() -> Self {
        Self {
            max_expand_depth: default_max_expand_depth(),
        }
    }
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            target_partitions: default_target_partitions(),
        }
    }
}

impl WorkbenchConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| {
            WorkbenchError::config(format!("failed to read {}: {e}", path.display()))
        })?;
        toml::from_str(&raw).map_err(|e| {
            WorkbenchError::config(format!("failed to parse {}: {e}", path.display()))
        })
    }

    /// Load from a file when it exists, defaults otherwise.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}
