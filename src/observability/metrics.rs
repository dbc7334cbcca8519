//! Metrics collection and exposition.
//!
//! # Metrics
//! - `log_records_emitted_total` (counter): records written, by level
//! - `log_records_degraded_total` (counter): records written with `serialization_error`
//! - `log_records_suppressed_total` (counter): records below the threshold, by level
//! - `log_records_failed_total` (counter): records at least one output failed to write, by level
//! - `http_requests_total` (counter): requests by method, status
//! - `http_request_duration_seconds` (histogram): latency distribution
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op, so tests need no setup
//! - Exposition is optional (Prometheus listener)

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::logging::Level;

/// Install the Prometheus recorder and its HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_log_emitted(level: Level, degraded: bool) {
    counter!("log_records_emitted_total", "level" => level.as_str()).increment(1);
    if degraded {
        counter!("log_records_degraded_total").increment(1);
    }
}

pub fn record_log_failed(level: Level) {
    counter!("log_records_failed_total", "level" => level.as_str()).increment(1);
}

pub fn record_log_suppressed(level: Level) {
    counter!("log_records_suppressed_total", "level" => level.as_str()).increment(1);
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
    ];
    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(start.elapsed().as_secs_f64());
}
