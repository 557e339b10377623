use meraki_dashboard::{ClientCountEntry, Device};

use crate::registry::Family;
use crate::sample::Sample;

/// One sample per history bucket that has a client count.
pub fn client_count_history(device: &Device, history: &[ClientCountEntry]) -> Vec<Sample> {
    history
        .iter()
        .filter_map(|entry| entry.client_count)
        .map(|count| {
            Sample::new(
                Family::WirelessClientCount,
                count as f64,
                [
                    device.network_id.as_str(),
                    device.lan_ip_or_empty(),
                    device.name_or_empty(),
                    device.serial.as_str(),
                ],
            )
        })
        .collect()
}
