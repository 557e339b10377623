//! Organization and device traversal with per-entity failure isolation.
//!
//! The walker fetches raw records through a [`TelemetryClient`], runs the
//! matching transformer, and pushes the resulting samples into the scrape's
//! sink. A fetch failure below the organization listing only removes that
//! entity's contribution; it is logged, recorded in the [`ScrapeReport`] and
//! the walk moves on.

use std::time::Duration;

use meraki_dashboard::{
    DashboardError, Device, Organization, ProductType, QueryWindow, TelemetryClient,
};
use tracing::{debug, error, trace, warn};

use crate::error::ScrapeError;
use crate::filter::FamilyFilter;
use crate::registry::Family;
use crate::sample::Sample;
use crate::sink::SampleSink;
use crate::transform;

/// Collections fetched once per organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrgCollection {
    UplinksLossAndLatency,
    ChannelUtilization,
    VpnStatuses,
    VpnStats,
}

impl OrgCollection {
    /// Run order within a scrape.
    pub const ALL: [OrgCollection; 4] = [
        OrgCollection::UplinksLossAndLatency,
        OrgCollection::ChannelUtilization,
        OrgCollection::VpnStatuses,
        OrgCollection::VpnStats,
    ];

    pub fn name(self) -> &'static str {
        match self {
            OrgCollection::UplinksLossAndLatency => "uplinks_loss_and_latency",
            OrgCollection::ChannelUtilization => "channel_utilization",
            OrgCollection::VpnStatuses => "vpn_statuses",
            OrgCollection::VpnStats => "vpn_stats",
        }
    }

    /// Families produced by this collection.
    pub fn families(self) -> &'static [Family] {
        match self {
            OrgCollection::UplinksLossAndLatency => {
                &[Family::DeviceUplinkLoss, Family::DeviceUplinkLatency]
            }
            OrgCollection::ChannelUtilization => &[
                Family::ChannelUtilizationWifi,
                Family::ChannelUtilizationNonWifi,
                Family::ChannelUtilizationTotal,
            ],
            OrgCollection::VpnStatuses => &[Family::VpnPeerStatus, Family::ThirdPartyVpnPeerStatus],
            OrgCollection::VpnStats => &[
                Family::VpnPeerStatsAvgJitter,
                Family::VpnPeerStatsMinJitter,
                Family::VpnPeerStatsMaxJitter,
                Family::VpnPeerStatsAvgLatency,
                Family::VpnPeerStatsMinLatency,
                Family::VpnPeerStatsMaxLatency,
                Family::VpnPeerStatsAvgLoss,
                Family::VpnPeerStatsMinLoss,
                Family::VpnPeerStatsMaxLoss,
            ],
        }
    }
}

/// Collections fetched once per device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceCollection {
    ClientCountHistory,
    FailedConnections,
}

impl DeviceCollection {
    /// Run order within a device.
    pub const ALL: [DeviceCollection; 2] = [
        DeviceCollection::ClientCountHistory,
        DeviceCollection::FailedConnections,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DeviceCollection::ClientCountHistory => "client_count_history",
            DeviceCollection::FailedConnections => "failed_connections",
        }
    }

    pub fn families(self) -> &'static [Family] {
        match self {
            DeviceCollection::ClientCountHistory => &[Family::WirelessClientCount],
            DeviceCollection::FailedConnections => &[Family::FailedConn],
        }
    }
}

/// Result of visiting one entity for one collection.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityOutcome {
    /// Fetched and transformed; `samples` were emitted.
    Collected { samples: usize },
    /// Fetch failed; the entity contributed nothing.
    Skipped { reason: String },
}

/// One entity visit, with enough context to explain a gap in the output.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityVisit {
    pub collection: &'static str,
    pub org_id: String,
    /// Device serial for device-scoped visits.
    pub serial: Option<String>,
    pub outcome: EntityOutcome,
}

impl EntityVisit {
    pub fn is_skipped(&self) -> bool {
        matches!(self.outcome, EntityOutcome::Skipped { .. })
    }
}

/// Every entity visit of one scrape, in walk order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrapeReport {
    pub visits: Vec<EntityVisit>,
}

impl ScrapeReport {
    /// Number of visits that produced data.
    pub fn collected(&self) -> usize {
        self.visits.iter().filter(|v| !v.is_skipped()).count()
    }

    /// Number of visits skipped after a failure.
    pub fn skipped_count(&self) -> usize {
        self.visits.iter().filter(|v| v.is_skipped()).count()
    }

    /// Skipped visits, in walk order.
    pub fn skipped(&self) -> impl Iterator<Item = &EntityVisit> {
        self.visits.iter().filter(|v| v.is_skipped())
    }

    /// Total samples emitted across all visits.
    pub fn samples(&self) -> usize {
        self.visits
            .iter()
            .map(|v| match v.outcome {
                EntityOutcome::Collected { samples } => samples,
                EntityOutcome::Skipped { .. } => 0,
            })
            .sum()
    }
}

/// Drives one scrape's traversal.
pub struct Walker<'a, C> {
    client: &'a C,
    sink: SampleSink,
    filter: &'a FamilyFilter,
    window: QueryWindow,
    pacing: Duration,
    report: ScrapeReport,
}

impl<'a, C: TelemetryClient> Walker<'a, C> {
    pub fn new(
        client: &'a C,
        sink: SampleSink,
        filter: &'a FamilyFilter,
        window: QueryWindow,
        pacing: Duration,
    ) -> Self {
        Self {
            client,
            sink,
            filter,
            window,
            pacing,
            report: ScrapeReport::default(),
        }
    }

    /// Fetch the organization list. Failure or an empty list aborts the scrape.
    pub async fn organizations(&mut self) -> Result<Vec<Organization>, ScrapeError> {
        let orgs = self.client.list_organizations().await.map_err(|e| {
            error!(error = %e, "Failed to list organizations, aborting scrape");
            ScrapeError::from(e)
        })?;

        if orgs.is_empty() {
            error!("No organizations returned, aborting scrape");
            return Err(ScrapeError::NoOrganizations);
        }

        debug!(count = orgs.len(), "Listed organizations");
        Ok(orgs)
    }

    /// Run one organization-scoped collection for every organization.
    pub async fn for_each_organization(
        &mut self,
        orgs: &[Organization],
        collection: OrgCollection,
    ) {
        for org in orgs {
            let outcome = match self.fetch_org(collection, &org.id).await {
                Ok(samples) => self.emit(samples),
                Err(e) => {
                    warn!(
                        org = %org.id,
                        org_name = %org.name,
                        collection = collection.name(),
                        error = %e,
                        "Skipping organization"
                    );
                    EntityOutcome::Skipped {
                        reason: e.to_string(),
                    }
                }
            };

            self.report.visits.push(EntityVisit {
                collection: collection.name(),
                org_id: org.id.clone(),
                serial: None,
                outcome,
            });
        }
    }

    /// Run device-scoped collections for every device of one organization.
    ///
    /// If the device listing fails only this organization's device families
    /// are lost.
    pub async fn for_each_device(
        &mut self,
        org: &Organization,
        product_types: &[ProductType],
        collections: &[DeviceCollection],
    ) {
        let devices = match self.client.list_devices(&org.id, product_types).await {
            Ok(devices) => devices,
            Err(e) => {
                warn!(
                    org = %org.id,
                    org_name = %org.name,
                    collection = "devices",
                    error = %e,
                    "Skipping devices of organization"
                );
                self.report.visits.push(EntityVisit {
                    collection: "devices",
                    org_id: org.id.clone(),
                    serial: None,
                    outcome: EntityOutcome::Skipped {
                        reason: e.to_string(),
                    },
                });
                return;
            }
        };

        debug!(org = %org.id, count = devices.len(), "Listed devices");

        for (index, device) in devices.iter().enumerate() {
            if index > 0 && !self.pacing.is_zero() {
                tokio::time::sleep(self.pacing).await;
            }

            for &collection in collections {
                let outcome = match self.fetch_device(collection, device).await {
                    Ok(samples) => self.emit(samples),
                    Err(e) => {
                        warn!(
                            org = %org.id,
                            network = %device.network_id,
                            serial = %device.serial,
                            collection = collection.name(),
                            error = %e,
                            "Skipping device"
                        );
                        EntityOutcome::Skipped {
                            reason: e.to_string(),
                        }
                    }
                };

                self.report.visits.push(EntityVisit {
                    collection: collection.name(),
                    org_id: org.id.clone(),
                    serial: Some(device.serial.clone()),
                    outcome,
                });
            }
        }
    }

    /// End the walk. Dropping the walker closes its end of the sink.
    pub fn finish(self) -> ScrapeReport {
        self.report
    }

    async fn fetch_org(
        &self,
        collection: OrgCollection,
        org_id: &str,
    ) -> Result<Vec<Sample>, DashboardError> {
        let window = self.window;
        let samples = match collection {
            OrgCollection::UplinksLossAndLatency => {
                let uplinks = self.client.uplinks_loss_and_latency(org_id, window).await?;
                transform::uplink_loss_latency(&uplinks)
            }
            OrgCollection::ChannelUtilization => {
                let devices = self
                    .client
                    .channel_utilization_by_device(org_id, window)
                    .await?;
                transform::channel_utilization(&devices)
            }
            OrgCollection::VpnStatuses => {
                let networks = self.client.appliance_vpn_statuses(org_id).await?;
                transform::vpn_statuses(&networks)
            }
            OrgCollection::VpnStats => {
                let networks = self.client.appliance_vpn_stats(org_id, window).await?;
                transform::vpn_stats(&networks)
            }
        };
        Ok(samples)
    }

    async fn fetch_device(
        &self,
        collection: DeviceCollection,
        device: &Device,
    ) -> Result<Vec<Sample>, DashboardError> {
        let window = self.window;
        let samples = match collection {
            DeviceCollection::ClientCountHistory => {
                let history = self
                    .client
                    .wireless_client_count_history(&device.network_id, &device.serial, window)
                    .await?;
                transform::client_count_history(device, &history)
            }
            DeviceCollection::FailedConnections => {
                let events = self
                    .client
                    .wireless_failed_connections(&device.network_id, &device.serial, window)
                    .await?;
                transform::failed_connections(device, &events)
            }
        };
        Ok(samples)
    }

    fn emit(&self, samples: Vec<Sample>) -> EntityOutcome {
        let enabled = samples
            .into_iter()
            .filter(|s| self.filter.is_enabled(s.family));
        let sent = self.sink.emit(enabled);
        trace!(samples = sent, "Emitted samples");
        EntityOutcome::Collected { samples: sent }
    }
}
