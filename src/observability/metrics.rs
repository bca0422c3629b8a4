//! Metrics collection and exposition.
//!
//! # Metrics
//! - `registry_requests_total` (counter): requests by method, status
//! - `registry_request_duration_seconds` (histogram): latency distribution
//! - `registry_store_errors_total` (counter): storage failures by operation
//! - `registry_records` (gauge): records seen by the last full listing
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "registry_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("registry_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_store_error(op: &'static str) {
    counter!("registry_store_errors_total", "op" => op).increment(1);
}

pub fn record_records(count: usize) {
    gauge!("registry_records").set(count as f64);
}
