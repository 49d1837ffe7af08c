//! Metrics collection and exposition.
//!
//! # Metrics
//! - `guard_outcomes_total` (counter): decisions by outcome, route
//! - `guard_log_failures_total` (counter): request log appends that failed
//! - `guard_policy_warnings_total` (counter): limit blocks disabled at load, by reason
//! - `guard_log_entries` (gauge): entries held by the in-memory log store

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_outcome(outcome: &'static str, route: &str) {
    ::metrics::counter!(
        "guard_outcomes_total",
        "outcome" => outcome,
        "route" => route.to_string()
    )
    .increment(1);
}

pub fn record_log_failure() {
    ::metrics::counter!("guard_log_failures_total").increment(1);
}

pub fn record_policy_warning(reason: &'static str) {
    ::metrics::counter!("guard_policy_warnings_total", "reason" => reason).increment(1);
}

pub fn record_log_size(entries: usize) {
    ::metrics::gauge!("guard_log_entries").set(entries as f64);
}
