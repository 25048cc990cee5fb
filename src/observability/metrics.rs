//! Metrics collection and exposition.
//!
//! # Metrics
//! - `dispatch_requests_total` (counter): requests by method, status,
//!   outcome (handled / not_found)
//! - `dispatch_duration_seconds` (histogram): dispatch latency
//! - `dispatch_rate_limited_total` (counter): rejections by algorithm

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on `addr`. Recording works (as a
/// no-op) even when this is never called, so tests and embedders can
/// skip it.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => {
            describe_counter!(
                "dispatch_requests_total",
                "Total dispatched requests by method, status and outcome"
            );
            describe_histogram!(
                "dispatch_duration_seconds",
                "Dispatch latency in seconds"
            );
            describe_counter!(
                "dispatch_rate_limited_total",
                "Requests rejected by a rate limiter, by algorithm"
            );
            tracing::info!(address = %addr, "metrics exporter listening");
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to install metrics exporter");
        }
    }
}

/// Record one dispatched request.
pub fn record_dispatch(method: &str, status: u16, outcome: &'static str, start: Instant) {
    counter!(
        "dispatch_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    histogram!("dispatch_duration_seconds").record(start.elapsed().as_secs_f64());
}

/// Record one rate-limited rejection.
pub fn record_rate_limited(algorithm: &'static str) {
    counter!("dispatch_rate_limited_total", "algorithm" => algorithm).increment(1);
}
