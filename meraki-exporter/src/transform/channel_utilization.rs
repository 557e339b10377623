use meraki_dashboard::DeviceChannelUtilization;

use crate::registry::Family;
use crate::sample::Sample;

/// Wifi, non-wifi and total utilization per device and band.
///
/// A missing percentage drops only that one sample.
pub fn channel_utilization(devices: &[DeviceChannelUtilization]) -> Vec<Sample> {
    let mut samples = Vec::with_capacity(devices.len() * 6);

    for device in devices {
        for band in &device.by_band {
            let readings = [
                (Family::ChannelUtilizationWifi, &band.wifi),
                (Family::ChannelUtilizationNonWifi, &band.non_wifi),
                (Family::ChannelUtilizationTotal, &band.total),
            ];

            for (family, reading) in readings {
                if let Some(percentage) = reading.as_ref().and_then(|u| u.percentage) {
                    samples.push(Sample::new(
                        family,
                        percentage,
                        [
                            device.network.id.as_str(),
                            device.serial.as_str(),
                            band.band.as_str(),
                        ],
                    ));
                }
            }
        }
    }

    samples
}

#[cfg(test)]
mod tests {
    use super::*;
    use meraki_dashboard::{BandUtilization, NetworkRef, Utilization};

    fn band(name: &str, wifi: f64, non_wifi: f64, total: f64) -> BandUtilization {
        BandUtilization {
            band: name.to_string(),
            wifi: Utilization::percent(wifi),
            non_wifi: Utilization::percent(non_wifi),
            total: Utilization::percent(total),
        }
    }

    fn device(serial: &str, bands: Vec<BandUtilization>) -> DeviceChannelUtilization {
        DeviceChannelUtilization {
            serial: serial.to_string(),
            network: NetworkRef {
                id: "N_1".to_string(),
            },
            by_band: bands,
        }
    }

    #[test]
    fn test_three_samples_per_band() {
        let devices = vec![device(
            "Q1",
            vec![band("2.4", 10.0, 5.0, 15.0), band("5", 3.5, 1.5, 5.0)],
        )];

        let samples = channel_utilization(&devices);

        assert_eq!(samples.len(), 6);
        for triple in samples.chunks(3) {
            assert_eq!(triple[0].labels, triple[1].labels);
            assert_eq!(triple[1].labels, triple[2].labels);
            assert_eq!(triple[0].family, Family::ChannelUtilizationWifi);
            assert_eq!(triple[1].family, Family::ChannelUtilizationNonWifi);
            assert_eq!(triple[2].family, Family::ChannelUtilizationTotal);
        }
        assert_eq!(samples[3].labels, vec!["N_1", "Q1", "5"]);
        assert_eq!(samples[5].value, 5.0);
    }

    #[test]
    fn test_percentages_pass_through() {
        let samples = channel_utilization(&[device("Q1", vec![band("5", 99.9, 0.1, 100.0)])]);
        let values: Vec<f64> = samples.iter().map(|s| s.value).collect();
        assert_eq!(values, vec![99.9, 0.1, 100.0]);
    }

    #[test]
    fn test_missing_percentage_skips_one_sample() {
        let mut partial = band("6", 1.0, 2.0, 3.0);
        partial.non_wifi = Some(Utilization { percentage: None });
        partial.total = None;

        let samples = channel_utilization(&[device("Q1", vec![partial])]);

        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].family, Family::ChannelUtilizationWifi);
    }

    #[test]
    fn test_device_without_bands() {
        assert!(channel_utilization(&[device("Q1", Vec::new())]).is_empty());
        assert!(channel_utilization(&[]).is_empty());
    }
}
