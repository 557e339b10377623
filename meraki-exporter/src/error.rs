//! Scrape-level errors.

use meraki_dashboard::DashboardError;
use thiserror::Error;

/// A scrape that could not get past the organization listing.
///
/// Everything below the organization level is isolated per entity and never
/// surfaces as an error.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Failed to list organizations: {0}")]
    Organizations(#[from] DashboardError),
    #[error("No organizations visible to this API key")]
    NoOrganizations,
}
