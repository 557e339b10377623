use meraki_dashboard::DeviceUplinkLossLatency;

use crate::registry::Family;
use crate::sample::Sample;

/// Worst loss and latency seen in the window, one pair of samples per uplink.
pub fn uplink_loss_latency(uplinks: &[DeviceUplinkLossLatency]) -> Vec<Sample> {
    let mut samples = Vec::with_capacity(uplinks.len() * 2);

    for uplink in uplinks {
        let loss = window_max(uplink.time_series.iter().filter_map(|p| p.loss_percent));
        let latency = window_max(uplink.time_series.iter().filter_map(|p| p.latency_ms));
        let labels = [
            uplink.network_id.as_str(),
            uplink.ip.as_str(),
            uplink.uplink.as_str(),
            uplink.serial.as_str(),
        ];

        samples.push(Sample::new(Family::DeviceUplinkLoss, loss, labels));
        samples.push(Sample::new(Family::DeviceUplinkLatency, latency, labels));
    }

    samples
}

/// Maximum of the values, 0 when there are none.
fn window_max(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(0.0, f64::max)
}
