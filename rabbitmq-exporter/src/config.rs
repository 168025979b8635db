//! Configuration for the RabbitMQ exporter.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::metric::is_valid_metric_name;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] json5::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Complete exporter configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExporterConfig {
    /// Management API connection settings.
    #[serde(default)]
    pub rabbit: RabbitConfig,

    /// Prometheus endpoint settings.
    #[serde(default)]
    pub prometheus: PrometheusConfig,

    /// Exporter selection.
    #[serde(default)]
    pub exporters: ExportersConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// RabbitMQ management API connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RabbitConfig {
    /// Base URL of the management plugin (default: "http://127.0.0.1:15672").
    #[serde(default = "default_url")]
    pub url: String,

    /// Management user (default: "guest").
    #[serde(default = "default_credential")]
    pub user: String,

    /// Management password (default: "guest").
    #[serde(default = "default_credential")]
    pub password: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Accept invalid TLS certificates.
    #[serde(default)]
    pub insecure_skip_verify: bool,
}

fn default_url() -> String {
    "http://127.0.0.1:15672".to_string()
}

fn default_credential() -> String {
    "guest".to_string()
}

fn default_timeout() -> u64 {
    10
}

impl Default for RabbitConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            user: default_credential(),
            password: default_credential(),
            timeout_secs: default_timeout(),
            insecure_skip_verify: false,
        }
    }
}

/// Prometheus HTTP endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrometheusConfig {
    /// Address to listen on (default: "0.0.0.0:9419").
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Path for metrics endpoint (default: "/metrics").
    #[serde(default = "default_path")]
    pub path: String,

    /// Metric name prefix (default: "rabbitmq").
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

fn default_listen() -> String {
    "0.0.0.0:9419".to_string()
}

fn default_path() -> String {
    "/metrics".to_string()
}

fn default_prefix() -> String {
    "rabbitmq".to_string()
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            path: default_path(),
            prefix: default_prefix(),
        }
    }
}

/// Which registered exporters to run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportersConfig {
    /// Exporter names to enable (empty = all).
    #[serde(default)]
    pub enabled: Vec<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format: "text" or "json".
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl ExporterConfig {
    /// Load configuration from a JSON5 file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a JSON5 string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: ExporterConfig = json5::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.rabbit.url.starts_with("http://") || self.rabbit.url.starts_with("https://")) {
            return Err(ConfigError::Validation(format!(
                "RabbitMQ URL must start with http:// or https://: {}",
                self.rabbit.url
            )));
        }

        if self.rabbit.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "timeout_secs must be > 0".to_string(),
            ));
        }

        // Validate listen address format
        if self
            .prometheus
            .listen
            .parse::<std::net::SocketAddr>()
            .is_err()
        {
            return Err(ConfigError::Validation(format!(
                "Invalid listen address: {}",
                self.prometheus.listen
            )));
        }

        // Validate path starts with /
        if !self.prometheus.path.starts_with('/') {
            return Err(ConfigError::Validation(
                "Metrics path must start with /".to_string(),
            ));
        }

        if !is_valid_metric_name(&self.prometheus.prefix) {
            return Err(ConfigError::Validation(format!(
                "Invalid metric prefix: {:?}",
                self.prometheus.prefix
            )));
        }

        Ok(())
    }
}
