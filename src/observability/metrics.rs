//! Metrics collection and exposition.
//!
//! # Metrics
//! - `pipemux_requests_total` (counter): dispatched requests by route pattern
//! - `pipemux_handlers_skipped_total` (counter): handlers skipped after termination

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Route label used when the default pipe served the request.
pub const DEFAULT_ROUTE_LABEL: &str = "default";

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Count one dispatched request.
pub fn record_request(route: &str) {
    ::metrics::counter!("pipemux_requests_total", "route" => route.to_owned()).increment(1);
}

/// Count one handler skipped because the pipe was terminated.
pub fn record_skipped_handler() {
    ::metrics::counter!("pipemux_handlers_skipped_total").increment(1);
}
