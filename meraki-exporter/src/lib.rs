//! Prometheus exporter for Meraki Dashboard telemetry.
//!
//! Every scrape of the metrics endpoint walks the Dashboard API (organizations,
//! then devices), turns the raw records into gauge samples and renders them in
//! the Prometheus text format. Nothing is cached between scrapes.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐
//! │ Dashboard API   │────>│     Walker      │────>│   Transformers  │────>│   HTTP Server   │
//! │ (meraki-dash.)  │     │ (orgs, devices) │     │  (sample sink)  │     │   (/metrics)    │
//! └─────────────────┘     └─────────────────┘     └─────────────────┘     └─────────────────┘
//! ```
//!
//! A fetch failure for one organization or device only removes that entity's
//! samples; see [`walker`].
//!
//! # Usage
//!
//! ```bash
//! MERAKI_API_KEY=... meraki-exporter --config config.json5
//! ```
//!
//! # Configuration
//!
//! See [`config::ExporterConfig`] for configuration options.

pub mod config;
pub mod error;
pub mod exposition;
pub mod filter;
pub mod http;
pub mod registry;
pub mod sample;
pub mod scrape;
pub mod sink;
pub mod transform;
pub mod walker;

pub use config::ExporterConfig;
pub use error::ScrapeError;
pub use filter::FamilyFilter;
pub use http::HttpServer;
pub use registry::{Descriptor, Family};
pub use sample::Sample;
pub use scrape::{Scrape, ScrapeSettings, ScrapeState, ScrapeStats, Scraper};
pub use walker::{EntityOutcome, EntityVisit, ScrapeReport};

use config::{LogFormat, LoggingConfig};

/// Initialize tracing from the logging configuration.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_tracing(config: &LoggingConfig) -> anyhow::Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.level))?;

    match config.format {
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(fmt::layer())
                .with(filter)
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(fmt::layer().json())
                .with(filter)
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;
        }
    }

    Ok(())
}
