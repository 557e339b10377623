//! Scrape orchestration.
//!
//! A [`Scraper`] owns the client, the query settings and the family filter.
//! Each call to [`Scraper::scrape`] walks every organization in a fixed
//! order and returns the samples collected along with a per-entity report.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use meraki_dashboard::{ProductType, QueryWindow, TelemetryClient};
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::ScrapeConfig;
use crate::error::ScrapeError;
use crate::filter::FamilyFilter;
use crate::registry::{Descriptor, Family};
use crate::sample::Sample;
use crate::sink::{self, SampleSink};
use crate::walker::{DeviceCollection, OrgCollection, ScrapeReport, Walker};

/// Settings applied to every scrape.
#[derive(Debug, Clone)]
pub struct ScrapeSettings {
    pub window: QueryWindow,
    pub device_pacing: Duration,
    pub product_types: Vec<ProductType>,
    /// Run at most one scrape at a time.
    pub serialize: bool,
}

impl From<&ScrapeConfig> for ScrapeSettings {
    fn from(config: &ScrapeConfig) -> Self {
        Self {
            window: config.window(),
            device_pacing: config.device_pacing(),
            product_types: config.product_types.clone(),
            serialize: config.serialize,
        }
    }
}

impl Default for ScrapeSettings {
    fn default() -> Self {
        Self::from(&ScrapeConfig::default())
    }
}

/// Whether a scrape is currently running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapeState {
    Idle,
    Collecting,
}

/// Counters describing past scrapes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrapeStats {
    pub scrapes_total: u64,
    pub failures_total: u64,
    pub last_duration_secs: f64,
    pub last_samples: usize,
    pub last_skipped: usize,
    /// `None` until the first scrape finishes.
    pub last_success: Option<bool>,
}

/// Output of a successful scrape.
#[derive(Debug, Clone)]
pub struct Scrape {
    pub samples: Vec<Sample>,
    pub report: ScrapeReport,
    pub duration: Duration,
}

/// Runs scrapes against a [`TelemetryClient`].
pub struct Scraper<C> {
    client: Arc<C>,
    settings: ScrapeSettings,
    filter: FamilyFilter,
    gate: Mutex<()>,
    in_flight: AtomicUsize,
    stats: RwLock<ScrapeStats>,
}

impl<C: TelemetryClient> Scraper<C> {
    pub fn new(client: Arc<C>, settings: ScrapeSettings, filter: FamilyFilter) -> Self {
        Self {
            client,
            settings,
            filter,
            gate: Mutex::new(()),
            in_flight: AtomicUsize::new(0),
            stats: RwLock::new(ScrapeStats::default()),
        }
    }

    /// Descriptors of every enabled family. Performs no I/O.
    pub fn describe(&self) -> Vec<&'static Descriptor> {
        self.filter
            .enabled_families()
            .into_iter()
            .map(Family::descriptor)
            .collect()
    }

    /// Enabled families in exposition order.
    pub fn families(&self) -> Vec<Family> {
        self.filter.enabled_families()
    }

    pub fn stats(&self) -> ScrapeStats {
        self.stats.read().clone()
    }

    pub fn state(&self) -> ScrapeState {
        if self.in_flight.load(Ordering::Acquire) > 0 {
            ScrapeState::Collecting
        } else {
            ScrapeState::Idle
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Run one full scrape.
    ///
    /// Fails only when the organization listing fails or is empty; every
    /// other failure is isolated to its entity and shows up in the report.
    pub async fn scrape(&self) -> Result<Scrape, ScrapeError> {
        self.scrape_with_stats().await.0
    }

    /// Run one full scrape and return the stats as this scrape left them.
    ///
    /// The snapshot is taken while the stats are still locked, so it is not
    /// affected by scrapes that finish later.
    pub async fn scrape_with_stats(&self) -> (Result<Scrape, ScrapeError>, ScrapeStats) {
        let _serialized = if self.settings.serialize {
            Some(self.gate.lock().await)
        } else {
            None
        };
        let _collecting = InFlight::enter(&self.in_flight);

        debug!("Scrape started");
        let started = Instant::now();
        let (sink, stream) = sink::channel();

        let result = self.collect(sink).await;
        let samples = stream.drain().await;
        let duration = started.elapsed();

        let mut stats = self.stats.write();
        stats.scrapes_total += 1;
        stats.last_duration_secs = duration.as_secs_f64();

        let result = match result {
            Ok(report) => {
                stats.last_samples = samples.len();
                stats.last_skipped = report.skipped_count();
                stats.last_success = Some(true);
                debug!(
                    samples = samples.len(),
                    skipped = report.skipped_count(),
                    duration_ms = duration.as_millis() as u64,
                    "Scrape finished"
                );
                Ok(Scrape {
                    samples,
                    report,
                    duration,
                })
            }
            Err(e) => {
                stats.failures_total += 1;
                stats.last_samples = 0;
                stats.last_skipped = 0;
                stats.last_success = Some(false);
                Err(e)
            }
        };

        (result, stats.clone())
    }

    async fn collect(&self, sink: SampleSink) -> Result<ScrapeReport, ScrapeError> {
        let mut walker = Walker::new(
            self.client.as_ref(),
            sink,
            &self.filter,
            self.settings.window,
            self.settings.device_pacing,
        );

        let orgs = walker.organizations().await?;

        for collection in OrgCollection::ALL {
            if self.filter.any_enabled(collection.families()) {
                walker.for_each_organization(&orgs, collection).await;
            }
        }

        let device_collections: Vec<DeviceCollection> = DeviceCollection::ALL
            .into_iter()
            .filter(|c| self.filter.any_enabled(c.families()))
            .collect();

        if !device_collections.is_empty() {
            for org in &orgs {
                walker
                    .for_each_device(org, &self.settings.product_types, &device_collections)
                    .await;
            }
        }

        Ok(walker.finish())
    }

    /// Log a summary of all scrapes so far.
    pub fn log_summary(&self) {
        let stats = self.stats();
        info!(
            scrapes = stats.scrapes_total,
            failures = stats.failures_total,
            "Scraper summary"
        );
    }
}

/// Marks a scrape as in flight for as long as it is alive.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FilterConfig;
    use meraki_dashboard::mock::Endpoint;
    use meraki_dashboard::{Device, FailedConnection, MockClient, Organization};

    fn settings() -> ScrapeSettings {
        ScrapeSettings {
            device_pacing: Duration::ZERO,
            ..Default::default()
        }
    }

    fn client() -> MockClient {
        MockClient::new()
            .with_organization(Organization::new("1", "Acme"))
            .with_devices("1", vec![Device::new("Q1", "N_1")])
            .with_failed_connections(
                "Q1",
                vec![
                    FailedConnection::new("auth", "psk"),
                    FailedConnection::new("auth", "psk"),
                ],
            )
    }

    #[tokio::test]
    async fn test_scrape_collects_and_updates_stats() {
        let scraper = Scraper::new(Arc::new(client()), settings(), FamilyFilter::default());

        let scrape = scraper.scrape().await.unwrap();

        assert_eq!(scrape.samples.len(), 1);
        assert_eq!(scrape.samples[0].value, 2.0);
        assert_eq!(scraper.state(), ScrapeState::Idle);

        let stats = scraper.stats();
        assert_eq!(stats.scrapes_total, 1);
        assert_eq!(stats.failures_total, 0);
        assert_eq!(stats.last_samples, 1);
        assert_eq!(stats.last_success, Some(true));
    }

    #[tokio::test]
    async fn test_org_failure_counts_as_failed_scrape() {
        let client = client().failing(Endpoint::Organizations, "");
        let scraper = Scraper::new(Arc::new(client), settings(), FamilyFilter::default());

        assert!(scraper.scrape().await.is_err());

        let stats = scraper.stats();
        assert_eq!(stats.failures_total, 1);
        assert_eq!(stats.last_success, Some(false));
        assert_eq!(scraper.client().call_count(Endpoint::Devices), 0);
    }

    #[tokio::test]
    async fn test_collection_order() {
        let scraper = Scraper::new(Arc::new(client()), settings(), FamilyFilter::default());
        scraper.scrape().await.unwrap();

        let endpoints: Vec<Endpoint> = scraper
            .client()
            .calls()
            .into_iter()
            .map(|(e, _)| e)
            .collect();
        assert_eq!(
            endpoints,
            vec![
                Endpoint::Organizations,
                Endpoint::UplinksLossAndLatency,
                Endpoint::ChannelUtilization,
                Endpoint::VpnStatuses,
                Endpoint::VpnStats,
                Endpoint::Devices,
                Endpoint::ClientCountHistory,
                Endpoint::FailedConnections,
            ]
        );
    }

    #[tokio::test]
    async fn test_disabled_collections_not_fetched() {
        let filter = FamilyFilter::new(&FilterConfig {
            include_families: vec!["failed_conn".to_string()],
            ..Default::default()
        });
        let scraper = Scraper::new(Arc::new(client()), settings(), filter);
        scraper.scrape().await.unwrap();

        let client = scraper.client();
        assert_eq!(client.call_count(Endpoint::VpnStats), 0);
        assert_eq!(client.call_count(Endpoint::ChannelUtilization), 0);
        assert_eq!(client.call_count(Endpoint::ClientCountHistory), 0);
        assert_eq!(client.call_count(Endpoint::FailedConnections), 1);
    }

    #[test]
    fn test_describe_follows_filter() {
        let scraper = Scraper::new(
            Arc::new(MockClient::new()),
            settings(),
            FamilyFilter::default(),
        );
        assert_eq!(scraper.describe().len(), 18);

        let filter = FamilyFilter::new(&FilterConfig {
            exclude_families: vec!["vpn_peer_stats_*".to_string()],
            ..Default::default()
        });
        let scraper = Scraper::new(Arc::new(MockClient::new()), settings(), filter);
        assert_eq!(scraper.describe().len(), 9);
        assert!(scraper.client().calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_serialized_scrapes_do_not_overlap() {
        let client = client().with_devices(
            "1",
            vec![Device::new("Q1", "N_1"), Device::new("Q2", "N_1")],
        );
        let settings = ScrapeSettings {
            device_pacing: Duration::from_millis(10),
            ..Default::default()
        };
        let scraper = Scraper::new(Arc::new(client), settings, FamilyFilter::default());

        let (a, b) = tokio::join!(scraper.scrape(), scraper.scrape());
        assert!(a.is_ok() && b.is_ok());

        // each scrape's calls form one contiguous block
        let calls = scraper.client().calls();
        let second_start = calls
            .iter()
            .rposition(|(e, _)| *e == Endpoint::Organizations)
            .unwrap();
        assert_eq!(second_start, calls.len() / 2);
        assert_eq!(scraper.stats().scrapes_total, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stats_snapshot_belongs_to_its_scrape() {
        let settings = ScrapeSettings {
            device_pacing: Duration::from_millis(10),
            ..Default::default()
        };
        let scraper = Scraper::new(Arc::new(client()), settings, FamilyFilter::default());

        let ((first, first_stats), (second, second_stats)) =
            tokio::join!(scraper.scrape_with_stats(), scraper.scrape_with_stats());
        assert!(first.is_ok() && second.is_ok());

        assert_eq!(first_stats.scrapes_total, 1);
        assert_eq!(second_stats.scrapes_total, 2);
        assert_eq!(scraper.stats(), second_stats);
    }

    #[tokio::test]
    async fn test_stats_snapshot_on_failed_scrape() {
        let client = client().failing(Endpoint::Organizations, "");
        let scraper = Scraper::new(Arc::new(client), settings(), FamilyFilter::default());

        let (result, stats) = scraper.scrape_with_stats().await;

        assert!(result.is_err());
        assert_eq!(stats.scrapes_total, 1);
        assert_eq!(stats.failures_total, 1);
        assert_eq!(stats.last_success, Some(false));
    }
}
