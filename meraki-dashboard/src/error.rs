use thiserror::Error;

/// Errors returned by a [`TelemetryClient`](crate::TelemetryClient).
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Dashboard API returned {status} for {path}: {body}")]
    Status {
        status: u16,
        path: String,
        body: String,
    },

    #[error("Rate limited on {path} (retry after {retry_after_secs}s, retries exhausted)")]
    RateLimited { path: String, retry_after_secs: u64 },

    #[error("Failed to decode response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Pagination loop on {path}: {url} was already fetched")]
    Pagination { path: String, url: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using [`DashboardError`].
pub type Result<T> = std::result::Result<T, DashboardError>;
