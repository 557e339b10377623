use meraki_dashboard::{NetworkVpnStats, VpnPeerStats};

use crate::registry::Family;
use crate::sample::Sample;

/// Jitter, latency and loss summaries for every peer of every network.
///
/// Each summary yields up to three samples (avg, min, max); absent
/// statistics are skipped.
pub fn vpn_stats(networks: &[NetworkVpnStats]) -> Vec<Sample> {
    let mut samples = Vec::new();

    for network in networks {
        for peer in &network.meraki_vpn_peers {
            peer_samples(network, peer, &mut samples);
        }
    }

    samples
}

fn peer_samples(network: &NetworkVpnStats, peer: &VpnPeerStats, out: &mut Vec<Sample>) {
    let mut push = |family: Family, value: Option<f64>, receiver: &str, sender: &str| {
        if let Some(value) = value {
            out.push(Sample::new(
                family,
                value,
                [
                    network.network_id.as_str(),
                    network.network_name.as_str(),
                    peer.network_id.as_str(),
                    peer.network_name.as_str(),
                    receiver,
                    sender,
                ],
            ));
        }
    };

    for s in &peer.jitter_summaries {
        let (rx, tx) = (s.receiver_uplink.as_str(), s.sender_uplink.as_str());
        push(Family::VpnPeerStatsAvgJitter, s.avg_jitter, rx, tx);
        push(Family::VpnPeerStatsMinJitter, s.min_jitter, rx, tx);
        push(Family::VpnPeerStatsMaxJitter, s.max_jitter, rx, tx);
    }

    for s in &peer.latency_summaries {
        let (rx, tx) = (s.receiver_uplink.as_str(), s.sender_uplink.as_str());
        push(Family::VpnPeerStatsAvgLatency, s.avg_latency_ms, rx, tx);
        push(Family::VpnPeerStatsMinLatency, s.min_latency_ms, rx, tx);
        push(Family::VpnPeerStatsMaxLatency, s.max_latency_ms, rx, tx);
    }

    for s in &peer.loss_percentage_summaries {
        let (rx, tx) = (s.receiver_uplink.as_str(), s.sender_uplink.as_str());
        push(Family::VpnPeerStatsAvgLoss, s.avg_loss_percentage, rx, tx);
        push(Family::VpnPeerStatsMinLoss, s.min_loss_percentage, rx, tx);
        push(Family::VpnPeerStatsMaxLoss, s.max_loss_percentage, rx, tx);
    }
}
