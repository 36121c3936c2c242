//! Metrics collection and exposition.
//!
//! # Metrics
//! - `redirect_requests_total` (counter): requests by `outcome`
//!   (`redirect`, `fallback`, `store_error`)
//! - `store_loads_total` (counter): successful route loads
//!
//! # Design Decisions
//! - Counters are recorded unconditionally; without an installed recorder they are no-ops
//! - Prometheus exporter is opt-in via config

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;

    ::metrics::describe_counter!(
        "redirect_requests_total",
        "Requests handled, labelled by outcome"
    );
    ::metrics::describe_counter!("store_loads_total", "Route tables written to the store");

    tracing::info!(address = %addr, "Metrics endpoint started");
    Ok(())
}
