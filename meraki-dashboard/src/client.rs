//! Dashboard API client.

use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, LINK, RETRY_AFTER};
use reqwest::{Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use crate::config::DashboardConfig;
use crate::error::{DashboardError, Result};
use crate::model::{
    ClientCountEntry, Device, DeviceChannelUtilization, DeviceUplinkLossLatency,
    FailedConnection, NetworkVpnStats, NetworkVpnStatus, Organization, ProductType, QueryWindow,
};

/// Largest `perPage` accepted by most list endpoints.
pub const MAX_PER_PAGE: u32 = 1000;

/// Largest `perPage` accepted by the appliance VPN endpoints.
pub const VPN_MAX_PER_PAGE: u32 = 300;

/// Source of raw Dashboard telemetry.
///
/// One method per endpoint the exporter reads. Implementations must be
/// shareable across concurrent scrapes.
pub trait TelemetryClient: Send + Sync {
    /// List every organization the API key can see.
    fn list_organizations(&self) -> impl Future<Output = Result<Vec<Organization>>> + Send;

    /// List devices of one organization, filtered by product type.
    fn list_devices(
        &self,
        org_id: &str,
        product_types: &[ProductType],
    ) -> impl Future<Output = Result<Vec<Device>>> + Send;

    /// Failed wireless connections of one device within the window.
    fn wireless_failed_connections(
        &self,
        network_id: &str,
        serial: &str,
        window: QueryWindow,
    ) -> impl Future<Output = Result<Vec<FailedConnection>>> + Send;

    /// Wireless client count history of one device, bucketed by the window resolution.
    fn wireless_client_count_history(
        &self,
        network_id: &str,
        serial: &str,
        window: QueryWindow,
    ) -> impl Future<Output = Result<Vec<ClientCountEntry>>> + Send;

    /// Channel utilization of every wireless device in an organization.
    fn channel_utilization_by_device(
        &self,
        org_id: &str,
        window: QueryWindow,
    ) -> impl Future<Output = Result<Vec<DeviceChannelUtilization>>> + Send;

    /// Uplink loss and latency time series of every device in an organization.
    fn uplinks_loss_and_latency(
        &self,
        org_id: &str,
        window: QueryWindow,
    ) -> impl Future<Output = Result<Vec<DeviceUplinkLossLatency>>> + Send;

    /// Site-to-site VPN peer reachability of every appliance network.
    fn appliance_vpn_statuses(
        &self,
        org_id: &str,
    ) -> impl Future<Output = Result<Vec<NetworkVpnStatus>>> + Send;

    /// Site-to-site VPN peer quality summaries of every appliance network.
    fn appliance_vpn_stats(
        &self,
        org_id: &str,
        window: QueryWindow,
    ) -> impl Future<Output = Result<Vec<NetworkVpnStats>>> + Send;
}

/// HTTP implementation of [`TelemetryClient`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct DashboardClient {
    http: reqwest::Client,
    base_url: String,
    max_retries: u32,
    per_page: u32,
}

impl DashboardClient {
    /// Build a client from configuration.
    ///
    /// Fails if the API key is blank or cannot be used as a header value,
    /// or if the base URL does not parse.
    pub fn new(config: &DashboardConfig) -> Result<Self> {
        config.validate()?;
        config.validate_api_key()?;

        Url::parse(&config.base_url)
            .map_err(|e| DashboardError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.api_key.trim()))
            .map_err(|_| DashboardError::Config("API key contains invalid characters".into()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_retries: config.max_retries,
            per_page: config.per_page,
        })
    }

    fn url(&self, path: &str, query: &[(&str, String)]) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/{}", self.base_url, path.trim_start_matches('/')))
            .map_err(|e| DashboardError::InvalidUrl(format!("{}: {}", path, e)))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Send a GET, retrying on 429 and mapping non-success statuses to errors.
    async fn send(&self, url: &Url) -> Result<Response> {
        let mut attempt = 0;

        loop {
            trace!(url = %url, attempt, "GET");
            let response = self.http.get(url.clone()).send().await?;
            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                let wait = retry_after(response.headers());
                if attempt < self.max_retries {
                    attempt += 1;
                    debug!(
                        path = %url.path(),
                        attempt,
                        wait_secs = wait.as_secs(),
                        "Rate limited, retrying"
                    );
                    tokio::time::sleep(wait).await;
                    continue;
                }
                return Err(DashboardError::RateLimited {
                    path: url.path().to_string(),
                    retry_after_secs: wait.as_secs(),
                });
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(DashboardError::Status {
                    status: status.as_u16(),
                    path: url.path().to_string(),
                    body: truncate(body, 512),
                });
            }

            return Ok(response);
        }
    }

    async fn decode<T: DeserializeOwned>(url: &Url, response: Response) -> Result<T> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|source| DashboardError::Decode {
            path: url.path().to_string(),
            source,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = self.url(path, query)?;
        let response = self.send(&url).await?;
        Self::decode(&url, response).await
    }

    /// GET a list endpoint, following `Link: rel=next` until exhausted.
    ///
    /// `perPage` is the configured page size capped at `max_per_page`. A next
    /// link that points at an already fetched page is an error.
    async fn get_paginated<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        max_per_page: u32,
    ) -> Result<Vec<T>> {
        let mut query = query.to_vec();
        query.push(("perPage", self.per_page.min(max_per_page).to_string()));

        let mut url = self.url(path, &query)?;
        let mut seen = HashSet::new();
        let mut items = Vec::new();

        loop {
            seen.insert(url.to_string());
            let response = self.send(&url).await?;
            let next = next_link(response.headers());
            let mut page: Vec<T> = Self::decode(&url, response).await?;
            items.append(&mut page);

            let Some(next) = next else { break };
            url = Url::parse(&next)
                .map_err(|e| DashboardError::InvalidUrl(format!("{}: {}", next, e)))?;
            if seen.contains(url.as_str()) {
                return Err(DashboardError::Pagination {
                    path: path.to_string(),
                    url: url.to_string(),
                });
            }
        }

        let pages = seen.len();

        trace!(path, pages, items = items.len(), "Paginated fetch complete");
        Ok(items)
    }
}

impl TelemetryClient for DashboardClient {
    async fn list_organizations(&self) -> Result<Vec<Organization>> {
        self.get_paginated("organizations", &[], MAX_PER_PAGE).await
    }

    async fn list_devices(
        &self,
        org_id: &str,
        product_types: &[ProductType],
    ) -> Result<Vec<Device>> {
        let query: Vec<_> = product_types
            .iter()
            .map(|p| ("productTypes[]", p.as_str().to_string()))
            .collect();
        self.get_paginated(
            &format!("organizations/{}/devices", org_id),
            &query,
            MAX_PER_PAGE,
        )
        .await
    }

    async fn wireless_failed_connections(
        &self,
        network_id: &str,
        serial: &str,
        window: QueryWindow,
    ) -> Result<Vec<FailedConnection>> {
        self.get_json(
            &format!("networks/{}/wireless/failedConnections", network_id),
            &[
                ("timespan", window.timespan_secs().to_string()),
                ("serial", serial.to_string()),
            ],
        )
        .await
    }

    async fn wireless_client_count_history(
        &self,
        network_id: &str,
        serial: &str,
        window: QueryWindow,
    ) -> Result<Vec<ClientCountEntry>> {
        self.get_json(
            &format!("networks/{}/wireless/clientCountHistory", network_id),
            &[
                ("timespan", window.timespan_secs().to_string()),
                ("resolution", window.resolution_secs().to_string()),
                ("deviceSerial", serial.to_string()),
            ],
        )
        .await
    }

    async fn channel_utilization_by_device(
        &self,
        org_id: &str,
        window: QueryWindow,
    ) -> Result<Vec<DeviceChannelUtilization>> {
        self.get_paginated(
            &format!(
                "organizations/{}/wireless/devices/channelUtilization/byDevice",
                org_id
            ),
            &[
                ("timespan", window.timespan_secs().to_string()),
                ("interval", window.resolution_secs().to_string()),
            ],
            MAX_PER_PAGE,
        )
        .await
    }

    async fn uplinks_loss_and_latency(
        &self,
        org_id: &str,
        window: QueryWindow,
    ) -> Result<Vec<DeviceUplinkLossLatency>> {
        self.get_json(
            &format!("organizations/{}/devices/uplinksLossAndLatency", org_id),
            &[("timespan", window.timespan_secs().to_string())],
        )
        .await
    }

    async fn appliance_vpn_statuses(&self, org_id: &str) -> Result<Vec<NetworkVpnStatus>> {
        self.get_paginated(
            &format!("organizations/{}/appliance/vpn/statuses", org_id),
            &[],
            VPN_MAX_PER_PAGE,
        )
        .await
    }

    async fn appliance_vpn_stats(
        &self,
        org_id: &str,
        window: QueryWindow,
    ) -> Result<Vec<NetworkVpnStats>> {
        self.get_paginated(
            &format!("organizations/{}/appliance/vpn/stats", org_id),
            &[("timespan", window.timespan_secs().to_string())],
            VPN_MAX_PER_PAGE,
        )
        .await
    }
}

/// Extract the `rel=next` target from a `Link` header.
pub(crate) fn next_link(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(LINK)?.to_str().ok()?;

    value.split(',').find_map(|part| {
        let mut pieces = part.split(';');
        let target = pieces.next()?.trim();
        let is_next = pieces.any(|p| {
            let p = p.trim();
            p == "rel=next" || p == "rel=\"next\""
        });
        if !is_next {
            return None;
        }
        target
            .strip_prefix('<')
            .and_then(|t| t.strip_suffix('>'))
            .map(str::to_string)
    })
}

/// Delay requested by a `Retry-After` header, defaulting to one second.
fn retry_after(headers: &HeaderMap) -> Duration {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(1))
}

fn truncate(mut body: String, max: usize) -> String {
    if body.len() > max {
        let mut end = max;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
        body.push_str("...");
    }
    body
}
