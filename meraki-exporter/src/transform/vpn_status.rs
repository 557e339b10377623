use meraki_dashboard::NetworkVpnStatus;

use crate::registry::Family;
use crate::sample::Sample;

/// Status label for a peer reachability string.
///
/// Matching is case-insensitive; anything other than "reachable" is passed
/// through lower-cased. A missing value becomes the empty string.
pub fn reachability_label(reachability: Option<&str>) -> String {
    let status = reachability.unwrap_or_default().to_lowercase();
    if status == "reachable" {
        "reachable".to_string()
    } else {
        status
    }
}

/// One presence sample (value 1) per Meraki and third-party VPN peer.
pub fn vpn_statuses(networks: &[NetworkVpnStatus]) -> Vec<Sample> {
    let mut samples = Vec::new();

    for network in networks {
        for peer in &network.meraki_vpn_peers {
            let status = reachability_label(peer.reachability.as_deref());
            samples.push(Sample::new(
                Family::VpnPeerStatus,
                1.0,
                [
                    network.network_id.as_str(),
                    network.network_name.as_str(),
                    network.device_serial.as_str(),
                    peer.network_id.as_str(),
                    peer.network_name.as_str(),
                    status.as_str(),
                ],
            ));
        }

        for peer in &network.third_party_vpn_peers {
            let status = reachability_label(peer.reachability.as_deref());
            samples.push(Sample::new(
                Family::ThirdPartyVpnPeerStatus,
                1.0,
                [
                    network.network_id.as_str(),
                    network.network_name.as_str(),
                    network.device_serial.as_str(),
                    peer.name.as_str(),
                    peer.public_ip.as_str(),
                    status.as_str(),
                ],
            ));
        }
    }

    samples
}
