use serde::{Deserialize, Serialize};

use crate::error::{DashboardError, Result};

/// Dashboard API connection settings.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// API key sent as a bearer token.
    #[serde(default)]
    pub api_key: String,

    /// API base URL, including the version segment.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// How many times a rate-limited (429) request is retried.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Page size for paginated list endpoints.
    #[serde(default = "default_per_page")]
    pub per_page: u32,

    /// User-Agent header value.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    "https://api.meraki.com/api/v1".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_per_page() -> u32 {
    1000
}

fn default_user_agent() -> String {
    format!("meraki-exporter/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
            per_page: default_per_page(),
            user_agent: default_user_agent(),
        }
    }
}

impl std::fmt::Debug for DashboardConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("per_page", &self.per_page)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl DashboardConfig {
    /// Validate everything except the API key, which may still be supplied
    /// from the command line or environment after the file is loaded.
    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("https://") || self.base_url.starts_with("http://")) {
            return Err(DashboardError::Config(format!(
                "base_url must be an http(s) URL: {}",
                self.base_url
            )));
        }

        if self.timeout_secs == 0 {
            return Err(DashboardError::Config(
                "timeout_secs must be > 0".to_string(),
            ));
        }

        if !(3..=1000).contains(&self.per_page) {
            return Err(DashboardError::Config(
                "per_page must be between 3 and 1000".to_string(),
            ));
        }

        Ok(())
    }

    /// Validate the API key.
    pub fn validate_api_key(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(DashboardError::Config("API key is required".to_string()));
        }
        Ok(())
    }
}
