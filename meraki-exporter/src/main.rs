//! Prometheus exporter for Meraki Dashboard telemetry.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info};

use meraki_dashboard::DashboardClient;
use meraki_exporter::{ExporterConfig, FamilyFilter, HttpServer, ScrapeSettings, Scraper};

/// Prometheus exporter for Meraki Dashboard telemetry.
#[derive(Parser, Debug)]
#[command(name = "meraki-exporter")]
#[command(about = "Export Meraki Dashboard telemetry as Prometheus metrics")]
#[command(version)]
struct Args {
    /// Path to configuration file (JSON5 format).
    #[arg(short, long)]
    config: Option<String>,

    /// Dashboard API key (overrides config).
    #[arg(long, env = "MERAKI_API_KEY", hide_env_values = true)]
    meraki_api_key: Option<String>,

    /// HTTP listen address (overrides config).
    #[arg(long)]
    listen: Option<String>,

    /// Log level (trace, debug, info, warn, error; overrides config).
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = if let Some(config_path) = &args.config {
        ExporterConfig::load_from_file(config_path)?
    } else {
        ExporterConfig::default()
    };

    // Apply CLI and environment overrides
    if let Some(api_key) = args.meraki_api_key {
        config.meraki.api_key = api_key;
    }
    if let Some(listen) = args.listen {
        config.prometheus.listen = listen;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    config.validate()?;
    config.meraki.validate_api_key()?;

    meraki_exporter::init_tracing(&config.logging)?;

    info!(
        base_url = %config.meraki.base_url,
        "Starting Meraki Dashboard exporter"
    );

    let listen_addr: SocketAddr = config
        .prometheus
        .listen
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid listen address: {}", e))?;

    let client = Arc::new(DashboardClient::new(&config.meraki)?);
    let scraper = Arc::new(Scraper::new(
        client,
        ScrapeSettings::from(&config.scrape),
        FamilyFilter::new(&config.filters),
    ));

    info!(
        families = scraper.describe().len(),
        timespan_secs = config.scrape.timespan_secs,
        serialize = config.scrape.serialize,
        "Scraper ready"
    );

    // Create shutdown signal
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Start HTTP server
    let http_server = HttpServer::new(
        Arc::clone(&scraper),
        listen_addr,
        config.prometheus.path.clone(),
    );
    let mut http_task = tokio::spawn(async move { http_server.run(shutdown_rx).await });

    // Wait for shutdown signal, or for the server to stop on its own
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate() => {
            info!("Received SIGTERM, shutting down...");
        }
        result = &mut http_task => {
            match result {
                Ok(Ok(())) => info!("HTTP server exited"),
                Ok(Err(e)) => {
                    error!(error = %e, "HTTP server error");
                    return Err(e);
                }
                Err(e) => return Err(e.into()),
            }
            return Ok(());
        }
    }

    // Signal shutdown
    shutdown_tx.send(true)?;

    // Wait for the server to drain
    match tokio::time::timeout(Duration::from_secs(5), http_task).await {
        Ok(Ok(Err(e))) => error!(error = %e, "HTTP server error"),
        Ok(Err(e)) => error!(error = %e, "HTTP server task failed"),
        Err(_) => error!("HTTP server did not stop within 5s"),
        Ok(Ok(Ok(()))) => {}
    }

    scraper.log_summary();
    info!("Exporter stopped");
    Ok(())
}

/// Resolve on SIGTERM. Never resolves where the signal is unavailable.
async fn terminate() {
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                return;
            }
            Err(e) => error!(error = %e, "Failed to install SIGTERM handler"),
        }
    }
    std::future::pending::<()>().await;
}
