//! Meraki Dashboard API client.
//!
//! This crate provides the data model and HTTP client the exporter uses to
//! read telemetry from the Dashboard API:
//!
//! - [`model`] - Response types (`Organization`, `Device`, per-endpoint records)
//! - [`client`] - The [`TelemetryClient`] trait and its `reqwest` implementation
//! - [`config`] - Connection settings
//! - [`mock`] - In-memory client for tests
//! - [`error`] - Error types

pub mod client;
pub mod config;
pub mod error;
pub mod mock;
pub mod model;

// Re-export commonly used types at the crate root
pub use client::{DashboardClient, TelemetryClient};
pub use config::DashboardConfig;
pub use error::{DashboardError, Result};
pub use mock::MockClient;
pub use model::{
    BandUtilization, ClientCountEntry, Device, DeviceChannelUtilization, DeviceUplinkLossLatency,
    FailedConnection, JitterSummary, LatencySummary, LossLatencyPoint, LossSummary,
    MerakiVpnPeer, NetworkRef, NetworkVpnStats, NetworkVpnStatus, Organization, ProductType,
    QueryWindow, ThirdPartyVpnPeer, Utilization, VpnPeerStats,
};
