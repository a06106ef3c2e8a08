//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by method, status
//! - `proxy_request_duration_seconds` (histogram): end-to-end latency by method
//! - `proxy_failures_total` (counter): requests answered with a proxy error, by kind
//! - `proxy_html_rewrites_total` (counter): HTML documents rewritten
//! - `proxy_html_rewrite_duration_seconds` (histogram): parse + rewrite + serialize
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("proxy_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_failure(kind: &'static str) {
    metrics::counter!("proxy_failures_total", "kind" => kind).increment(1);
}

pub fn record_rewrite(start: Instant) {
    metrics::counter!("proxy_html_rewrites_total").increment(1);
    metrics::histogram!("proxy_html_rewrite_duration_seconds")
        .record(start.elapsed().as_secs_f64());
}
