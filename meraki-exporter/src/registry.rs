//! Static table of exported metric families.
//!
//! Every family is a gauge. Label order is fixed here and every transformer
//! emits label values in exactly this order; `network_id` is always first.

use serde::Serialize;

/// Name, help text and ordered label names of one metric family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Descriptor {
    pub name: &'static str,
    pub help: &'static str,
    pub labels: &'static [&'static str],
}

const FAILED_CONN_LABELS: &[&str] = &[
    "network_id",
    "device_serial",
    "failure_step",
    "failure_type",
];
const CLIENT_COUNT_LABELS: &[&str] = &["network_id", "ip", "device_name", "device_serial"];
const UPLINK_LABELS: &[&str] = &["network_id", "ip", "uplink", "device_serial"];
const CHANNEL_LABELS: &[&str] = &["network_id", "device_serial", "band"];
const VPN_STATUS_LABELS: &[&str] = &[
    "network_id",
    "network_name",
    "device_serial",
    "peer_network_id",
    "peer_network_name",
    "status",
];
const THIRD_PARTY_STATUS_LABELS: &[&str] = &[
    "network_id",
    "network_name",
    "device_serial",
    "peer_name",
    "peer_public_ip",
    "status",
];
const VPN_STATS_LABELS: &[&str] = &[
    "network_id",
    "network_name",
    "peer_network_id",
    "peer_network_name",
    "receiver_uplink",
    "sender_uplink",
];

/// Descriptors indexed by `Family` discriminant; order must match the enum.
static DESCRIPTORS: [Descriptor; 18] = [
    Descriptor {
        name: "failed_conn",
        help: "Shows failed connections",
        labels: FAILED_CONN_LABELS,
    },
    Descriptor {
        name: "wireless_client_count",
        help: "Shows wireless client count",
        labels: CLIENT_COUNT_LABELS,
    },
    Descriptor {
        name: "device_uplink_loss",
        help: "Shows device uplink loss",
        labels: UPLINK_LABELS,
    },
    Descriptor {
        name: "device_uplink_latency",
        help: "Shows device uplink latency",
        labels: UPLINK_LABELS,
    },
    Descriptor {
        name: "channel_utilization_wifi",
        help: "Shows channel utilization for wifi",
        labels: CHANNEL_LABELS,
    },
    Descriptor {
        name: "channel_utilization_non_wifi",
        help: "Shows channel utilization for non wifi",
        labels: CHANNEL_LABELS,
    },
    Descriptor {
        name: "channel_utilization_total",
        help: "Shows channel utilization total",
        labels: CHANNEL_LABELS,
    },
    Descriptor {
        name: "vpn_peer_status",
        help: "Shows vpn peer status",
        labels: VPN_STATUS_LABELS,
    },
    Descriptor {
        name: "third_party_vpn_peer_status",
        help: "Shows third party vpn peer status",
        labels: THIRD_PARTY_STATUS_LABELS,
    },
    Descriptor {
        name: "vpn_peer_stats_avg_jitter",
        help: "Shows vpn peer avg jitter",
        labels: VPN_STATS_LABELS,
    },
    Descriptor {
        name: "vpn_peer_stats_min_jitter",
        help: "Shows vpn peer min jitter",
        labels: VPN_STATS_LABELS,
    },
    Descriptor {
        name: "vpn_peer_stats_max_jitter",
        help: "Shows vpn peer max jitter",
        labels: VPN_STATS_LABELS,
    },
    Descriptor {
        name: "vpn_peer_stats_avg_latency",
        help: "Shows vpn peer avg latency",
        labels: VPN_STATS_LABELS,
    },
    Descriptor {
        name: "vpn_peer_stats_min_latency",
        help: "Shows vpn peer min latency",
        labels: VPN_STATS_LABELS,
    },
    Descriptor {
        name: "vpn_peer_stats_max_latency",
        help: "Shows vpn peer max latency",
        labels: VPN_STATS_LABELS,
    },
    Descriptor {
        name: "vpn_peer_stats_avg_loss",
        help: "Shows vpn peer avg loss",
        labels: VPN_STATS_LABELS,
    },
    Descriptor {
        name: "vpn_peer_stats_min_loss",
        help: "Shows vpn peer min loss",
        labels: VPN_STATS_LABELS,
    },
    Descriptor {
        name: "vpn_peer_stats_max_loss",
        help: "Shows vpn peer max loss",
        labels: VPN_STATS_LABELS,
    },
];

/// Identifier of an exported metric family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Family {
    FailedConn,
    WirelessClientCount,
    DeviceUplinkLoss,
    DeviceUplinkLatency,
    ChannelUtilizationWifi,
    ChannelUtilizationNonWifi,
    ChannelUtilizationTotal,
    VpnPeerStatus,
    ThirdPartyVpnPeerStatus,
    VpnPeerStatsAvgJitter,
    VpnPeerStatsMinJitter,
    VpnPeerStatsMaxJitter,
    VpnPeerStatsAvgLatency,
    VpnPeerStatsMinLatency,
    VpnPeerStatsMaxLatency,
    VpnPeerStatsAvgLoss,
    VpnPeerStatsMinLoss,
    VpnPeerStatsMaxLoss,
}

impl Family {
    /// All families in exposition order.
    pub const ALL: [Family; 18] = [
        Family::FailedConn,
        Family::WirelessClientCount,
        Family::DeviceUplinkLoss,
        Family::DeviceUplinkLatency,
        Family::ChannelUtilizationWifi,
        Family::ChannelUtilizationNonWifi,
        Family::ChannelUtilizationTotal,
        Family::VpnPeerStatus,
        Family::ThirdPartyVpnPeerStatus,
        Family::VpnPeerStatsAvgJitter,
        Family::VpnPeerStatsMinJitter,
        Family::VpnPeerStatsMaxJitter,
        Family::VpnPeerStatsAvgLatency,
        Family::VpnPeerStatsMinLatency,
        Family::VpnPeerStatsMaxLatency,
        Family::VpnPeerStatsAvgLoss,
        Family::VpnPeerStatsMinLoss,
        Family::VpnPeerStatsMaxLoss,
    ];

    /// Static descriptor of this family.
    pub fn descriptor(self) -> &'static Descriptor {
        &DESCRIPTORS[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.descriptor().name
    }

    /// Look up a family by its exported name.
    pub fn from_name(name: &str) -> Option<Family> {
        Family::ALL.into_iter().find(|f| f.name() == name)
    }
}

impl std::fmt::Display for Family {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
