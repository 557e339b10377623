//! Integration tests for the Meraki exporter.
//!
//! These tests run full scrapes against an in-memory Dashboard client and
//! check what ends up on the HTTP /metrics endpoint.

use std::collections::BTreeSet;
use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use meraki_dashboard::mock::Endpoint;
use meraki_dashboard::{
    BandUtilization, ClientCountEntry, Device, DeviceChannelUtilization, DeviceUplinkLossLatency,
    FailedConnection, JitterSummary, LossLatencyPoint, MerakiVpnPeer, MockClient, NetworkRef,
    NetworkVpnStats, NetworkVpnStatus, Organization, Utilization, VpnPeerStats,
};
use meraki_exporter::config::FilterConfig;
use meraki_exporter::{
    ExporterConfig, Family, FamilyFilter, HttpServer, ScrapeError, ScrapeSettings, Scraper,
    exposition,
};
use tokio::sync::watch;

fn settings() -> ScrapeSettings {
    ScrapeSettings {
        device_pacing: Duration::ZERO,
        ..Default::default()
    }
}

fn scraper(client: MockClient) -> Scraper<MockClient> {
    Scraper::new(Arc::new(client), settings(), FamilyFilter::default())
}

fn ap(serial: &str, network_id: &str) -> Device {
    Device::new(serial, network_id)
        .with_name(format!("ap-{}", serial))
        .with_lan_ip("10.0.0.10")
}

fn client_counts(values: &[u64]) -> Vec<ClientCountEntry> {
    values
        .iter()
        .map(|v| ClientCountEntry {
            client_count: Some(*v),
            ..Default::default()
        })
        .collect()
}

/// Three organizations with one access point each plus org-level data for "A".
fn three_orgs() -> MockClient {
    MockClient::new()
        .with_organization(Organization::new("A", "Alpha"))
        .with_organization(Organization::new("B", "Beta"))
        .with_organization(Organization::new("C", "Gamma"))
        .with_devices("A", vec![ap("QA", "N_A")])
        .with_devices("B", vec![ap("QB", "N_B")])
        .with_devices("C", vec![ap("QC", "N_C")])
        .with_client_counts("QA", client_counts(&[1]))
        .with_client_counts("QB", client_counts(&[2, 3]))
        .with_client_counts("QC", client_counts(&[4]))
        .with_failed_connections("QB", vec![FailedConnection::new("auth", "psk")])
        .with_uplinks(
            "A",
            vec![DeviceUplinkLossLatency {
                network_id: "N_A".to_string(),
                serial: "QMX".to_string(),
                uplink: "wan1".to_string(),
                ip: "8.8.8.8".to_string(),
                time_series: vec![
                    LossLatencyPoint::new(Some(2.0), Some(10.0)),
                    LossLatencyPoint::new(Some(7.0), Some(5.0)),
                    LossLatencyPoint::new(Some(3.0), Some(20.0)),
                ],
            }],
        )
        .with_channel_utilization(
            "A",
            vec![DeviceChannelUtilization {
                serial: "QA".to_string(),
                network: NetworkRef {
                    id: "N_A".to_string(),
                },
                by_band: vec![
                    BandUtilization {
                        band: "2.4".to_string(),
                        wifi: Utilization::percent(12.0),
                        non_wifi: Utilization::percent(3.0),
                        total: Utilization::percent(15.0),
                    },
                    BandUtilization {
                        band: "5".to_string(),
                        wifi: Utilization::percent(4.5),
                        non_wifi: Utilization::percent(0.5),
                        total: Utilization::percent(5.0),
                    },
                ],
            }],
        )
        .with_vpn_statuses(
            "A",
            vec![NetworkVpnStatus {
                network_id: "N_A".to_string(),
                network_name: "Alpha HQ".to_string(),
                device_serial: "QMX".to_string(),
                meraki_vpn_peers: vec![MerakiVpnPeer {
                    network_id: "N_B".to_string(),
                    network_name: "Beta HQ".to_string(),
                    reachability: Some("REACHABLE".to_string()),
                }],
                third_party_vpn_peers: Vec::new(),
            }],
        )
        .with_vpn_stats(
            "A",
            vec![NetworkVpnStats {
                network_id: "N_A".to_string(),
                network_name: "Alpha HQ".to_string(),
                meraki_vpn_peers: vec![VpnPeerStats {
                    network_id: "N_B".to_string(),
                    network_name: "Beta HQ".to_string(),
                    jitter_summaries: vec![JitterSummary {
                        sender_uplink: "wan1".to_string(),
                        receiver_uplink: "wan1".to_string(),
                        avg_jitter: Some(0.5),
                        min_jitter: Some(0.1),
                        max_jitter: Some(2.0),
                    }],
                    ..Default::default()
                }],
            }],
        )
}

/// Helper to parse Prometheus text format into `(name{labels}, value)` pairs.
fn parse_prometheus_line(line: &str) -> Option<(&str, f64)> {
    // Skip comments and empty lines
    if line.starts_with('#') || line.trim().is_empty() {
        return None;
    }

    let (series, value) = line.rsplit_once(' ')?;
    value.parse::<f64>().ok().map(|v| (series, v))
}

fn series_of(output: &str, family: &str) -> Vec<(String, f64)> {
    output
        .lines()
        .filter_map(parse_prometheus_line)
        .filter(|(series, _)| series.split('{').next() == Some(family))
        .map(|(series, value)| (series.to_string(), value))
        .collect()
}

#[tokio::test]
async fn test_full_scrape_all_families() {
    let scraper = scraper(three_orgs());

    let scrape = scraper.scrape().await.unwrap();
    let output = exposition::render(&scraper.families(), &scrape.samples, &scraper.stats());

    let loss = series_of(&output, "device_uplink_loss");
    assert_eq!(loss.len(), 1);
    assert_eq!(loss[0].1, 7.0);
    assert_eq!(series_of(&output, "device_uplink_latency")[0].1, 20.0);

    assert_eq!(series_of(&output, "channel_utilization_wifi").len(), 2);
    assert_eq!(series_of(&output, "channel_utilization_non_wifi").len(), 2);
    assert_eq!(series_of(&output, "channel_utilization_total").len(), 2);

    let status = series_of(&output, "vpn_peer_status");
    assert_eq!(status.len(), 1);
    assert!(status[0].0.contains("status=\"reachable\""));

    assert_eq!(series_of(&output, "vpn_peer_stats_max_jitter")[0].1, 2.0);
    assert!(series_of(&output, "vpn_peer_stats_avg_latency").is_empty());
    assert!(output.contains("# TYPE vpn_peer_stats_avg_latency gauge"));

    assert_eq!(series_of(&output, "wireless_client_count").len(), 4);
    assert_eq!(series_of(&output, "failed_conn").len(), 1);

    assert!(scrape.report.skipped().next().is_none());
}

#[tokio::test]
async fn test_device_failure_in_one_org_keeps_others() {
    let client = three_orgs().failing(Endpoint::Devices, "A");
    let scraper = scraper(client);

    let scrape = scraper.scrape().await.unwrap();

    let serials: BTreeSet<&str> = scrape
        .samples
        .iter()
        .filter(|s| s.family == Family::WirelessClientCount)
        .filter_map(|s| s.label("device_serial"))
        .collect();
    assert_eq!(serials, BTreeSet::from(["QB", "QC"]));

    // org-scoped families of A are unaffected
    assert!(
        scrape
            .samples
            .iter()
            .any(|s| s.family == Family::DeviceUplinkLoss && s.label("network_id") == Some("N_A"))
    );

    let skipped: Vec<_> = scrape.report.skipped().collect();
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].org_id, "A");
    assert_eq!(scraper.stats().last_skipped, 1);
}

#[tokio::test]
async fn test_org_collection_failure_continues() {
    let client = three_orgs()
        .failing(Endpoint::UplinksLossAndLatency, "A")
        .failing(Endpoint::VpnStats, "B");
    let scraper = scraper(client);

    let scrape = scraper.scrape().await.unwrap();

    assert!(!scrape.samples.iter().any(|s| s.family == Family::DeviceUplinkLoss));
    assert!(scrape.samples.iter().any(|s| s.family == Family::VpnPeerStatsMaxJitter));
    assert_eq!(scraper.client().call_count(Endpoint::UplinksLossAndLatency), 3);
    assert_eq!(scrape.report.skipped_count(), 2);
}

#[tokio::test]
async fn test_org_listing_failure_emits_nothing() {
    let client = three_orgs().failing(Endpoint::Organizations, "");
    let scraper = scraper(client);

    let result = scraper.scrape().await;

    assert!(matches!(result, Err(ScrapeError::Organizations(_))));
    assert_eq!(scraper.client().calls().len(), 1);
}

#[tokio::test]
async fn test_no_organizations() {
    let scraper = scraper(MockClient::new());
    assert!(matches!(scraper.scrape().await, Err(ScrapeError::NoOrganizations)));
}

#[tokio::test]
async fn test_zero_devices_zero_samples() {
    let client = MockClient::new().with_organization(Organization::new("A", "Alpha"));
    let scraper = scraper(client);

    let scrape = scraper.scrape().await.unwrap();

    assert!(scrape.samples.is_empty());
    assert_eq!(scrape.report.skipped_count(), 0);
}

#[tokio::test]
async fn test_identical_snapshot_identical_samples() {
    let scraper = scraper(three_orgs());

    let first = scraper.scrape().await.unwrap().samples;
    let second = scraper.scrape().await.unwrap().samples;

    assert_eq!(first, second);
    assert_eq!(scraper.stats().scrapes_total, 2);
}

#[tokio::test]
async fn test_filters_skip_fetches() {
    let filter = FamilyFilter::new(&FilterConfig {
        exclude_families: vec![
            "vpn_*".to_string(),
            "third_party_vpn_peer_status".to_string(),
            "wireless_client_count".to_string(),
        ],
        ..Default::default()
    });
    let scraper = Scraper::new(Arc::new(three_orgs()), settings(), filter);

    let scrape = scraper.scrape().await.unwrap();
    let output = exposition::render(&scraper.families(), &scrape.samples, &scraper.stats());

    let client = scraper.client();
    assert_eq!(client.call_count(Endpoint::VpnStatuses), 0);
    assert_eq!(client.call_count(Endpoint::VpnStats), 0);
    assert_eq!(client.call_count(Endpoint::ClientCountHistory), 0);
    assert_eq!(client.call_count(Endpoint::FailedConnections), 3);

    assert!(!output.contains("# TYPE vpn_peer_status "));
    assert!(!output.contains("\nvpn_peer_status{"));
    assert!(!output.contains("# TYPE third_party_vpn_peer_status "));
    assert!(!output.contains("\nthird_party_vpn_peer_status{"));
    assert!(!output.contains("# TYPE wireless_client_count "));
    assert!(output.contains("# TYPE failed_conn gauge"));
}

#[tokio::test(start_paused = true)]
async fn test_device_pacing() {
    let devices = (0..3).map(|i| ap(&format!("Q{}", i), "N_A")).collect();
    let client = MockClient::new()
        .with_organization(Organization::new("A", "Alpha"))
        .with_devices("A", devices);
    let settings = ScrapeSettings {
        device_pacing: Duration::from_millis(250),
        ..Default::default()
    };
    let scraper = Scraper::new(Arc::new(client), settings, FamilyFilter::default());

    let started = tokio::time::Instant::now();
    scraper.scrape().await.unwrap();

    assert_eq!(started.elapsed(), Duration::from_millis(500));
}

#[test]
fn test_load_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            // comments are allowed
            meraki: {{ api_key: "key-from-file" }},
            prometheus: {{ listen: "127.0.0.1:9200" }},
            scrape: {{ timespan_secs: 900, device_pacing_ms: 50 }},
            filters: {{ exclude_families: ["vpn_peer_stats_*"] }},
        }}"#
    )
    .unwrap();

    let config = ExporterConfig::load_from_file(file.path()).unwrap();

    assert_eq!(config.meraki.api_key, "key-from-file");
    assert_eq!(config.prometheus.listen, "127.0.0.1:9200");
    assert_eq!(config.scrape.timespan_secs, 900);
    assert_eq!(config.scrape.resolution_secs, 300);

    let settings = ScrapeSettings::from(&config.scrape);
    assert_eq!(settings.device_pacing, Duration::from_millis(50));
    assert_eq!(FamilyFilter::new(&config.filters).enabled_families().len(), 9);
}

#[tokio::test]
async fn test_http_server_metrics_endpoint() {
    let scraper = Arc::new(scraper(three_orgs()));

    // The server takes over the bound listener, so the port is live before spawn
    let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    let actual_addr = listener.local_addr().unwrap();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let server = HttpServer::new(Arc::clone(&scraper), actual_addr, "/metrics".to_string());
    let server_handle = tokio::spawn(server.serve(listener, shutdown_rx));

    let client = reqwest::Client::new();
    let response = client
        .get(format!("http://{}/metrics", actual_addr))
        .send()
        .await
        .expect("metrics request failed");

    assert!(response.status().is_success());
    let body = response.text().await.unwrap();
    assert!(body.contains(
        "failed_conn{network_id=\"N_B\",device_serial=\"QB\",failure_step=\"auth\",failure_type=\"psk\"} 1"
    ));
    assert!(body.contains("meraki_exporter_scrapes_total 1\n"));

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), server_handle)
        .await
        .expect("server did not shut down")
        .unwrap()
        .unwrap();
}
