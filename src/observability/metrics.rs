//! Metrics collection and exposition.
//!
//! # Metrics
//! - `api_requests_total` (counter): completed requests by method, status
//! - `api_request_duration_seconds` (histogram): arrival-to-write latency
//! - `api_failures_total` (counter): normalized failures by kind
//!
//! # Design Decisions
//! - Low-overhead metric updates (atomic operations)
//! - Labels for method, status code and failure kind; no per-path labels
//!   to keep cardinality bounded
//! - Recording without an installed exporter is a no-op

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint and install the global recorder.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(err) => tracing::error!("Failed to start metrics endpoint: {err}"),
    }
}

/// Record one completed request. Called exactly once per request, by the
/// terminal responder.
pub fn record_request(method: &str, status: u16, elapsed: Duration) {
    counter!(
        "api_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
    )
    .increment(1);
    histogram!("api_request_duration_seconds", "method" => method.to_string())
        .record(elapsed.as_secs_f64());
}

/// Record a failure folded by the normalizer.
pub fn record_failure(kind: &'static str) {
    counter!("api_failures_total", "kind" => kind).increment(1);
}
