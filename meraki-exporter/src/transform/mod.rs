//! Pure functions turning raw Dashboard records into samples.
//!
//! Each transformer takes one fetched record plus whatever entity context
//! its labels need, and returns zero or more samples. Absent upstream values
//! are skipped, never coerced to zero.

mod channel_utilization;
mod client_count;
mod failed_connections;
mod uplink;
mod vpn_stats;
mod vpn_status;

pub use channel_utilization::channel_utilization;
pub use client_count::client_count_history;
pub use failed_connections::failed_connections;
pub use uplink::uplink_loss_latency;
pub use vpn_stats::vpn_stats;
pub use vpn_status::{reachability_label, vpn_statuses};
