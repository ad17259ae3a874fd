//! Metrics collection and exposition.
//!
//! # Metrics
//! - `guardd_control_actions_total` (counter): lifecycle triggers by action
//! - `guardd_api_requests_total` (counter): control API requests by path, status
//! - `guardd_debug_reports_total` (counter): debug reports by style
//! - `guardd_debug_section_failures_total` (counter): unavailable sections by section
//! - `guardd_debug_report_duration_seconds` (histogram): report build time

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_control_action(action: &'static str) {
    metrics::counter!("guardd_control_actions_total", "action" => action).increment(1);
}

pub fn record_api_request(path: &str, status: u16) {
    metrics::counter!(
        "guardd_api_requests_total",
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn record_debug_report(style: &'static str, start: Instant) {
    metrics::counter!("guardd_debug_reports_total", "style" => style).increment(1);
    metrics::histogram!("guardd_debug_report_duration_seconds")
        .record(start.elapsed().as_secs_f64());
}

pub fn record_section_failure(section: &'static str) {
    metrics::counter!("guardd_debug_section_failures_total", "section" => section).increment(1);
}
