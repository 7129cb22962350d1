//! Metrics collection and exposition.
//!
//! # Metrics
//! - `vault_contract_calls_total` (counter): wallet submissions by function, outcome
//! - `vault_validation_rejections_total` (counter): client-side rejections by form
//! - `vault_actions_total` (counter): tracked action transitions by status
//! - `vault_http_requests_total` (counter): requests by method, status
//! - `vault_http_request_duration_seconds` (histogram): request latency
//! - `vault_chain_api_health` (gauge): 1=healthy, 0=unhealthy
//!
//! # Design Decisions
//! - Recording is a no-op until `init_metrics` installs the exporter
//! - Labels are low-cardinality (function names, forms, statuses)

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a wallet submission attempt.
pub fn record_contract_call(function: &str, success: bool) {
    let outcome = if success { "submitted" } else { "failed" };
    metrics::counter!(
        "vault_contract_calls_total",
        "function" => function.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Record a form rejected before any wallet call.
pub fn record_validation_rejection(form: &'static str) {
    metrics::counter!("vault_validation_rejections_total", "form" => form).increment(1);
}

/// Record a tracked action reaching `status`.
pub fn record_action_status(status: &'static str) {
    metrics::counter!("vault_actions_total", "status" => status).increment(1);
}

/// Record a served HTTP request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "vault_http_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("vault_http_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

/// Record chain API reachability.
pub fn record_chain_api_health(endpoint: &str, healthy: bool) {
    metrics::gauge!("vault_chain_api_health", "endpoint" => endpoint.to_string())
        .set(if healthy { 1.0 } else { 0.0 });
}
