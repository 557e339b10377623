use std::collections::BTreeMap;

use meraki_dashboard::{Device, FailedConnection};

use crate::registry::Family;
use crate::sample::Sample;

/// Count failure events per `(failure step, failure type)` pair.
///
/// Pairs with no events produce nothing. Output is sorted by pair.
pub fn failed_connections(device: &Device, events: &[FailedConnection]) -> Vec<Sample> {
    let mut counts: BTreeMap<(&str, &str), u64> = BTreeMap::new();

    for event in events {
        let step = event.failure_step.as_deref().unwrap_or_default();
        let kind = event.failure_type.as_deref().unwrap_or_default();
        *counts.entry((step, kind)).or_default() += 1;
    }

    counts
        .into_iter()
        .map(|((step, kind), count)| {
            Sample::new(
                Family::FailedConn,
                count as f64,
                [device.network_id.as_str(), device.serial.as_str(), step, kind],
            )
        })
        .collect()
}
