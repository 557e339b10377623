//! Dashboard API response types.
//!
//! Only the fields the exporter reads are modelled; unknown fields are ignored.
//! Anything the API may omit or send as `null` is an `Option`, and lists that may
//! be missing or `null` deserialize to an empty `Vec`.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

/// A Dashboard organization, the root scope of every query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

impl Organization {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A network reference embedded in other records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkRef {
    pub id: String,
}

/// A device in an organization's inventory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub serial: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub network_id: String,
    #[serde(default)]
    pub lan_ip: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub product_type: Option<String>,
}

impl Device {
    pub fn new(serial: impl Into<String>, network_id: impl Into<String>) -> Self {
        Self {
            serial: serial.into(),
            network_id: network_id.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_lan_ip(mut self, ip: impl Into<String>) -> Self {
        self.lan_ip = Some(ip.into());
        self
    }

    /// Display name, empty when the device is unnamed.
    pub fn name_or_empty(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    /// LAN IP, empty when the device has none.
    pub fn lan_ip_or_empty(&self) -> &str {
        self.lan_ip.as_deref().unwrap_or_default()
    }
}

/// Product type filter for device listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProductType {
    Appliance,
    Camera,
    CellularGateway,
    Sensor,
    Switch,
    SystemsManager,
    Wireless,
}

impl ProductType {
    /// Value used in the `productTypes[]` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::Appliance => "appliance",
            ProductType::Camera => "camera",
            ProductType::CellularGateway => "cellularGateway",
            ProductType::Sensor => "sensor",
            ProductType::Switch => "switch",
            ProductType::SystemsManager => "systemsManager",
            ProductType::Wireless => "wireless",
        }
    }
}

impl std::fmt::Display for ProductType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Time span and bucket size for windowed queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryWindow {
    pub timespan: Duration,
    pub resolution: Duration,
}

impl QueryWindow {
    pub fn new(timespan: Duration, resolution: Duration) -> Self {
        Self {
            timespan,
            resolution,
        }
    }

    pub fn timespan_secs(&self) -> u64 {
        self.timespan.as_secs()
    }

    pub fn resolution_secs(&self) -> u64 {
        self.resolution.as_secs()
    }
}

impl Default for QueryWindow {
    fn default() -> Self {
        Self::new(Duration::from_secs(300), Duration::from_secs(300))
    }
}

/// One failed client connection event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedConnection {
    #[serde(default)]
    pub serial: Option<String>,
    #[serde(default)]
    pub failure_step: Option<String>,
    #[serde(default, rename = "type")]
    pub failure_type: Option<String>,
    #[serde(default)]
    pub ts: Option<String>,
}

impl FailedConnection {
    pub fn new(step: impl Into<String>, failure_type: impl Into<String>) -> Self {
        Self {
            failure_step: Some(step.into()),
            failure_type: Some(failure_type.into()),
            ..Default::default()
        }
    }
}

/// One bucket of a wireless client count history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientCountEntry {
    #[serde(default)]
    pub start_ts: Option<String>,
    #[serde(default)]
    pub end_ts: Option<String>,
    #[serde(default)]
    pub client_count: Option<u64>,
}

/// Channel utilization of one wireless device, broken down by band.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceChannelUtilization {
    pub serial: String,
    #[serde(default)]
    pub network: NetworkRef,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub by_band: Vec<BandUtilization>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BandUtilization {
    #[serde(default)]
    pub band: String,
    #[serde(default)]
    pub wifi: Option<Utilization>,
    #[serde(default)]
    pub non_wifi: Option<Utilization>,
    #[serde(default)]
    pub total: Option<Utilization>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Utilization {
    #[serde(default)]
    pub percentage: Option<f64>,
}

impl Utilization {
    pub fn percent(value: f64) -> Option<Self> {
        Some(Self {
            percentage: Some(value),
        })
    }
}

/// Loss and latency time series for one device uplink.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceUplinkLossLatency {
    #[serde(default)]
    pub network_id: String,
    pub serial: String,
    #[serde(default)]
    pub uplink: String,
    #[serde(default)]
    pub ip: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub time_series: Vec<LossLatencyPoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LossLatencyPoint {
    #[serde(default)]
    pub ts: Option<String>,
    #[serde(default)]
    pub loss_percent: Option<f64>,
    #[serde(default)]
    pub latency_ms: Option<f64>,
}

impl LossLatencyPoint {
    pub fn new(loss_percent: Option<f64>, latency_ms: Option<f64>) -> Self {
        Self {
            ts: None,
            loss_percent,
            latency_ms,
        }
    }
}

/// Site-to-site VPN status of one appliance network.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkVpnStatus {
    pub network_id: String,
    #[serde(default)]
    pub network_name: String,
    #[serde(default)]
    pub device_serial: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub meraki_vpn_peers: Vec<MerakiVpnPeer>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub third_party_vpn_peers: Vec<ThirdPartyVpnPeer>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerakiVpnPeer {
    pub network_id: String,
    #[serde(default)]
    pub network_name: String,
    #[serde(default)]
    pub reachability: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThirdPartyVpnPeer {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub public_ip: String,
    #[serde(default)]
    pub reachability: Option<String>,
}

/// Site-to-site VPN quality statistics of one appliance network.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkVpnStats {
    pub network_id: String,
    #[serde(default)]
    pub network_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub meraki_vpn_peers: Vec<VpnPeerStats>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VpnPeerStats {
    pub network_id: String,
    #[serde(default)]
    pub network_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub jitter_summaries: Vec<JitterSummary>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub latency_summaries: Vec<LatencySummary>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub loss_percentage_summaries: Vec<LossSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JitterSummary {
    #[serde(default)]
    pub sender_uplink: String,
    #[serde(default)]
    pub receiver_uplink: String,
    #[serde(default)]
    pub avg_jitter: Option<f64>,
    #[serde(default)]
    pub min_jitter: Option<f64>,
    #[serde(default)]
    pub max_jitter: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatencySummary {
    #[serde(default)]
    pub sender_uplink: String,
    #[serde(default)]
    pub receiver_uplink: String,
    #[serde(default)]
    pub avg_latency_ms: Option<f64>,
    #[serde(default)]
    pub min_latency_ms: Option<f64>,
    #[serde(default)]
    pub max_latency_ms: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LossSummary {
    #[serde(default)]
    pub sender_uplink: String,
    #[serde(default)]
    pub receiver_uplink: String,
    #[serde(default)]
    pub avg_loss_percentage: Option<f64>,
    #[serde(default)]
    pub min_loss_percentage: Option<f64>,
    #[serde(default)]
    pub max_loss_percentage: Option<f64>,
}

/// Deserialize a list that the API may send as `null`.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
