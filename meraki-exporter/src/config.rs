//! Configuration for the Meraki exporter.

use meraki_dashboard::{DashboardConfig, ProductType, QueryWindow};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

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
    /// Dashboard API connection settings.
    #[serde(default)]
    pub meraki: DashboardConfig,

    /// Prometheus exporter settings.
    #[serde(default)]
    pub prometheus: PrometheusConfig,

    /// Per-scrape query settings.
    #[serde(default)]
    pub scrape: ScrapeConfig,

    /// Metric family filtering.
    #[serde(default)]
    pub filters: FilterConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Prometheus HTTP endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrometheusConfig {
    /// Address to listen on (default: "0.0.0.0:9101").
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Path for metrics endpoint (default: "/metrics").
    #[serde(default = "default_path")]
    pub path: String,
}

fn default_listen() -> String {
    "0.0.0.0:9101".to_string()
}

fn default_path() -> String {
    "/metrics".to_string()
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            path: default_path(),
        }
    }
}

/// Query window, pacing and scrape coordination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    /// Look-back window for windowed queries (seconds).
    #[serde(default = "default_window_secs")]
    pub timespan_secs: u64,

    /// Bucket size for history queries (seconds).
    #[serde(default = "default_window_secs")]
    pub resolution_secs: u64,

    /// Delay between successive devices of one organization (milliseconds).
    #[serde(default = "default_device_pacing")]
    pub device_pacing_ms: u64,

    /// Run at most one scrape at a time.
    #[serde(default = "default_serialize")]
    pub serialize: bool,

    /// Device product types walked for device-scoped families.
    #[serde(default = "default_product_types")]
    pub product_types: Vec<ProductType>,
}

fn default_window_secs() -> u64 {
    300 // 5 minutes
}

fn default_device_pacing() -> u64 {
    100
}

fn default_serialize() -> bool {
    true
}

fn default_product_types() -> Vec<ProductType> {
    vec![ProductType::Wireless]
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            timespan_secs: default_window_secs(),
            resolution_secs: default_window_secs(),
            device_pacing_ms: default_device_pacing(),
            serialize: default_serialize(),
            product_types: default_product_types(),
        }
    }
}

impl ScrapeConfig {
    pub fn window(&self) -> QueryWindow {
        QueryWindow::new(
            Duration::from_secs(self.timespan_secs),
            Duration::from_secs(self.resolution_secs),
        )
    }

    pub fn device_pacing(&self) -> Duration {
        Duration::from_millis(self.device_pacing_ms)
    }
}

/// Metric family filtering configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Glob patterns for families to include (empty = all).
    #[serde(default)]
    pub include_families: Vec<String>,

    /// Glob patterns for families to exclude.
    #[serde(default)]
    pub exclude_families: Vec<String>,
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
    ///
    /// The API key is not checked here; it may still arrive from the
    /// command line or environment.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.meraki
            .validate()
            .map_err(|e| ConfigError::Validation(e.to_string()))?;

        if self.scrape.timespan_secs == 0 {
            return Err(ConfigError::Validation(
                "timespan_secs must be > 0".to_string(),
            ));
        }

        if self.scrape.resolution_secs == 0 {
            return Err(ConfigError::Validation(
                "resolution_secs must be > 0".to_string(),
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

        for pattern in self
            .filters
            .include_families
            .iter()
            .chain(&self.filters.exclude_families)
        {
            if let Err(e) = glob::Pattern::new(pattern) {
                return Err(ConfigError::Validation(format!(
                    "Invalid family pattern '{}': {}",
                    pattern, e
                )));
            }
        }

        Ok(())
    }
}
