//! HTTP server for the Prometheus metrics endpoint.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use meraki_dashboard::TelemetryClient;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::exposition;
use crate::scrape::Scraper;

/// Application state shared across handlers.
struct AppState<C> {
    scraper: Arc<Scraper<C>>,
}

impl<C> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            scraper: Arc::clone(&self.scraper),
        }
    }
}

/// Create the HTTP router.
fn create_router<C>(scraper: Arc<Scraper<C>>, metrics_path: &str) -> Router
where
    C: TelemetryClient + 'static,
{
    let state = AppState { scraper };

    Router::new()
        .route(metrics_path, get(metrics_handler::<C>))
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler::<C>))
        .route("/families", get(families_handler::<C>))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Handler for the metrics endpoint. Every request runs a fresh scrape.
///
/// An aborted scrape still answers 200 with family metadata and the
/// exporter's own metrics; the failure is visible in those.
async fn metrics_handler<C>(State(state): State<AppState<C>>) -> Response
where
    C: TelemetryClient + 'static,
{
    let (result, stats) = state.scraper.scrape_with_stats().await;
    let samples = match result {
        Ok(scrape) => scrape.samples,
        Err(_) => Vec::new(),
    };

    let body = exposition::render(&state.scraper.families(), &samples, &stats);

    (
        StatusCode::OK,
        [("content-type", exposition::CONTENT_TYPE)],
        body,
    )
        .into_response()
}

/// Handler for the /health endpoint.
async fn health_handler() -> Response {
    (StatusCode::OK, "healthy\n").into_response()
}

/// Handler for the /ready endpoint.
async fn ready_handler<C>(State(state): State<AppState<C>>) -> Response
where
    C: TelemetryClient + 'static,
{
    // Ready unless the most recent scrape could not list organizations
    if state.scraper.stats().last_success == Some(false) {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            "not ready - last scrape could not list organizations\n",
        )
            .into_response()
    } else {
        (StatusCode::OK, "ready\n").into_response()
    }
}

/// Handler for the /families endpoint. Lists descriptors without fetching.
async fn families_handler<C>(State(state): State<AppState<C>>) -> Response
where
    C: TelemetryClient + 'static,
{
    Json(state.scraper.describe()).into_response()
}

/// HTTP server configuration.
pub struct HttpServer<C> {
    scraper: Arc<Scraper<C>>,
    listen_addr: SocketAddr,
    metrics_path: String,
}

impl<C> HttpServer<C>
where
    C: TelemetryClient + 'static,
{
    /// Create a new HTTP server.
    pub fn new(scraper: Arc<Scraper<C>>, listen_addr: SocketAddr, metrics_path: String) -> Self {
        Self {
            scraper,
            listen_addr,
            metrics_path,
        }
    }

    /// Bind the listen address and run until the shutdown signal is received.
    pub async fn run(self, shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        info!(
            addr = %self.listen_addr,
            path = %self.metrics_path,
            "Starting HTTP server"
        );

        let listener = TcpListener::bind(self.listen_addr)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", self.listen_addr, e))?;

        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until the shutdown signal is received.
    ///
    /// The configured listen address is not used.
    pub async fn serve(
        self,
        listener: TcpListener,
        mut shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<()> {
        let addr = listener.local_addr()?;
        let router = create_router(self.scraper, &self.metrics_path);

        info!(
            addr = %addr,
            path = %self.metrics_path,
            "HTTP server listening"
        );

        // Run server with graceful shutdown
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                // Wait for shutdown signal
                loop {
                    if shutdown.changed().await.is_err() {
                        break;
                    }
                    if *shutdown.borrow() {
                        break;
                    }
                }
                info!("HTTP server shutting down");
            })
            .await
            .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))?;

        info!("HTTP server stopped");
        Ok(())
    }
}
