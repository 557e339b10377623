//! In-memory [`TelemetryClient`] for tests.
//!
//! Holds canned responses keyed by scope and can be told to fail any
//! endpoint for a given scope. Every call is recorded so tests can assert
//! what was (or was not) fetched.

use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;

use crate::client::TelemetryClient;
use crate::error::{DashboardError, Result};
use crate::model::{
    ClientCountEntry, Device, DeviceChannelUtilization, DeviceUplinkLossLatency,
    FailedConnection, NetworkVpnStats, NetworkVpnStatus, Organization, ProductType, QueryWindow,
};

/// Dashboard endpoints served by the mock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Organizations,
    Devices,
    FailedConnections,
    ClientCountHistory,
    ChannelUtilization,
    UplinksLossAndLatency,
    VpnStatuses,
    VpnStats,
}

/// A recorded call: endpoint plus the scope it was made for
/// (organization id, or device serial for device-scoped endpoints).
pub type Call = (Endpoint, String);

/// Mock Dashboard client.
#[derive(Debug, Default)]
pub struct MockClient {
    organizations: Vec<Organization>,
    devices: HashMap<String, Vec<Device>>,
    failed_connections: HashMap<String, Vec<FailedConnection>>,
    client_counts: HashMap<String, Vec<ClientCountEntry>>,
    channel_utilization: HashMap<String, Vec<DeviceChannelUtilization>>,
    uplinks: HashMap<String, Vec<DeviceUplinkLossLatency>>,
    vpn_statuses: HashMap<String, Vec<NetworkVpnStatus>>,
    vpn_stats: HashMap<String, Vec<NetworkVpnStats>>,
    failures: HashSet<Call>,
    calls: Mutex<Vec<Call>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_organization(mut self, org: Organization) -> Self {
        self.organizations.push(org);
        self
    }

    pub fn with_devices(mut self, org_id: &str, devices: Vec<Device>) -> Self {
        self.devices.insert(org_id.to_string(), devices);
        self
    }

    pub fn with_failed_connections(mut self, serial: &str, events: Vec<FailedConnection>) -> Self {
        self.failed_connections.insert(serial.to_string(), events);
        self
    }

    pub fn with_client_counts(mut self, serial: &str, entries: Vec<ClientCountEntry>) -> Self {
        self.client_counts.insert(serial.to_string(), entries);
        self
    }

    pub fn with_channel_utilization(
        mut self,
        org_id: &str,
        devices: Vec<DeviceChannelUtilization>,
    ) -> Self {
        self.channel_utilization.insert(org_id.to_string(), devices);
        self
    }

    pub fn with_uplinks(mut self, org_id: &str, uplinks: Vec<DeviceUplinkLossLatency>) -> Self {
        self.uplinks.insert(org_id.to_string(), uplinks);
        self
    }

    pub fn with_vpn_statuses(mut self, org_id: &str, statuses: Vec<NetworkVpnStatus>) -> Self {
        self.vpn_statuses.insert(org_id.to_string(), statuses);
        self
    }

    pub fn with_vpn_stats(mut self, org_id: &str, stats: Vec<NetworkVpnStats>) -> Self {
        self.vpn_stats.insert(org_id.to_string(), stats);
        self
    }

    /// Make `endpoint` fail for `scope`. Use an empty scope for
    /// [`Endpoint::Organizations`].
    pub fn failing(mut self, endpoint: Endpoint, scope: &str) -> Self {
        self.failures.insert((endpoint, scope.to_string()));
        self
    }

    /// Calls made so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// Number of calls made to `endpoint`.
    pub fn call_count(&self, endpoint: Endpoint) -> usize {
        self.calls.lock().iter().filter(|(e, _)| *e == endpoint).count()
    }

    fn respond<T: Clone>(
        &self,
        endpoint: Endpoint,
        scope: &str,
        data: &HashMap<String, Vec<T>>,
    ) -> Result<Vec<T>> {
        self.record(endpoint, scope)?;
        Ok(data.get(scope).cloned().unwrap_or_default())
    }

    fn record(&self, endpoint: Endpoint, scope: &str) -> Result<()> {
        let call = (endpoint, scope.to_string());
        let failing = self.failures.contains(&call);
        self.calls.lock().push(call);

        if failing {
            return Err(DashboardError::Status {
                status: 500,
                path: format!("mock/{:?}/{}", endpoint, scope),
                body: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}

impl TelemetryClient for MockClient {
    async fn list_organizations(&self) -> Result<Vec<Organization>> {
        self.record(Endpoint::Organizations, "")?;
        Ok(self.organizations.clone())
    }

    async fn list_devices(
        &self,
        org_id: &str,
        product_types: &[ProductType],
    ) -> Result<Vec<Device>> {
        let devices = self.respond(Endpoint::Devices, org_id, &self.devices)?;
        Ok(devices
            .into_iter()
            .filter(|d| match d.product_type.as_deref() {
                Some(kind) => product_types.iter().any(|p| p.as_str() == kind),
                None => true,
            })
            .collect())
    }

    async fn wireless_failed_connections(
        &self,
        _network_id: &str,
        serial: &str,
        _window: QueryWindow,
    ) -> Result<Vec<FailedConnection>> {
        self.respond(Endpoint::FailedConnections, serial, &self.failed_connections)
    }

    async fn wireless_client_count_history(
        &self,
        _network_id: &str,
        serial: &str,
        _window: QueryWindow,
    ) -> Result<Vec<ClientCountEntry>> {
        self.respond(Endpoint::ClientCountHistory, serial, &self.client_counts)
    }

    async fn channel_utilization_by_device(
        &self,
        org_id: &str,
        _window: QueryWindow,
    ) -> Result<Vec<DeviceChannelUtilization>> {
        self.respond(Endpoint::ChannelUtilization, org_id, &self.channel_utilization)
    }

    async fn uplinks_loss_and_latency(
        &self,
        org_id: &str,
        _window: QueryWindow,
    ) -> Result<Vec<DeviceUplinkLossLatency>> {
        self.respond(Endpoint::UplinksLossAndLatency, org_id, &self.uplinks)
    }

    async fn appliance_vpn_statuses(&self, org_id: &str) -> Result<Vec<NetworkVpnStatus>> {
        self.respond(Endpoint::VpnStatuses, org_id, &self.vpn_statuses)
    }

    async fn appliance_vpn_stats(
        &self,
        org_id: &str,
        _window: QueryWindow,
    ) -> Result<Vec<NetworkVpnStats>> {
        self.respond(Endpoint::VpnStats, org_id, &self.vpn_stats)
    }
}
