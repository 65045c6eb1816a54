//! Configuration management for thuchi
//!
//! This module handles loading, validation, and management of
//! thuchi configuration from YAML files.

pub mod error;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use error::ConfigError;

/// Environment variable that overrides `remote.access_key`
pub const ACCESS_KEY_ENV: &str = "THUCHI_ACCESS_KEY";

// ==================== Configuration Types ====================

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8081
}

/// Remote AppSheet table settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// API base, without the `/apps/...` suffix
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// AppSheet application id
    #[serde(default)]
    pub app_id: String,
    /// Table holding the transaction rows
    #[serde(default = "default_table")]
    pub table: String,
    /// Application access key, sent as `applicationAccessKey`
    #[serde(default)]
    pub access_key: String,
    /// Locale sent with Find/Delete requests
    #[serde(default = "default_locale")]
    pub locale: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            app_id: String::new(),
            table: default_table(),
            access_key: String::new(),
            locale: default_locale(),
        }
    }
}

fn default_base_url() -> String {
    "https://www.appsheet.com/api/v2".to_string()
}

fn default_table() -> String {
    "data_thu_chi".to_string()
}

fn default_locale() -> String {
    "en-US".to_string()
}

impl RemoteConfig {
    /// Full action endpoint for the configured table
    pub fn endpoint(&self) -> String {
        format!(
            "{}/apps/{}/tables/{}/Action",
            self.base_url.trim_end_matches('/'),
            self.app_id,
            self.table
        )
    }
}

/// Passcode gate
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    /// Shared passcode
    #[serde(default)]
    pub passcode: String,
    /// Where the login flag is persisted between restarts (optional)
    #[serde(default)]
    pub flag_file: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Pagination settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Records per page for the transaction list
    #[serde(default = "default_records_per_page")]
    pub records_per_page: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            records_per_page: default_records_per_page(),
        }
    }
}

fn default_records_per_page() -> usize {
    10
}

/// Dashboard chart settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Slices in the expense-by-counterparty chart
    #[serde(default = "default_top_counterparties")]
    pub top_counterparties: usize,
    /// Bars in the totals-by-description chart
    #[serde(default = "default_top_descriptions")]
    pub top_descriptions: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            top_counterparties: default_top_counterparties(),
            top_descriptions: default_top_descriptions(),
        }
    }
}

fn default_top_counterparties() -> usize {
    6
}

fn default_top_descriptions() -> usize {
    5
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Remote store settings
    #[serde(default)]
    pub remote: RemoteConfig,
    /// Passcode gate
    #[serde(default)]
    pub auth: AuthConfig,
    /// Pagination settings
    #[serde(default)]
    pub pagination: PaginationConfig,
    /// Dashboard settings
    #[serde(default)]
    pub dashboard: DashboardConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: PathBuf) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_string_lossy().to_string(),
            });
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::IoError { message: e.to_string() })?;

        let mut config = Self::from_yaml(&content)?;
        config.apply_env();
        config.validate()?;

        Ok(config)
    }

    /// Parse configuration from YAML text without validating it
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(|e| ConfigError::InvalidYaml { message: e.to_string() })
    }

    /// Pick up overrides from the environment
    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var(ACCESS_KEY_ENV) {
            if !key.is_empty() {
                self.remote.access_key = key;
            }
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                reason: "Port must be greater than 0".to_string(),
            });
        }

        if self.remote.app_id.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "remote.app_id".to_string(),
            });
        }

        if self.remote.access_key.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "remote.access_key".to_string(),
            });
        }

        if !self.remote.base_url.starts_with("http://") && !self.remote.base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                field: "remote.base_url".to_string(),
                reason: "Base URL must start with http:// or https://".to_string(),
            });
        }

        if self.auth.passcode.is_empty() {
            return Err(ConfigError::MissingField {
                field: "auth.passcode".to_string(),
            });
        }

        if self.pagination.records_per_page == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pagination.records_per_page".to_string(),
                reason: "Records per page must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    /// Generate a default configuration file
    pub fn generate_default() -> &'static str {
        include_str!("../templates/default_config.yaml")
    }
}
