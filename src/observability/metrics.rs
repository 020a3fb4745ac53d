//! Metrics collection and exposition.
//!
//! # Metrics
//! - `router_not_found_total` (counter): dispatches answered with 404, by method
//! - `pool_borrows_total` (counter): connections lent out
//! - `pool_growth_total` (counter): connections added on exhaustion
//! - `pool_connect_failures_total` (counter): failed attempts, by stage
//! - `pool_sweep_repaired_total` (counter): dead connections replaced by sweeps
//! - `pool_size` (gauge): current number of pooled connections

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
///
/// Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_route_miss(method: &'static str) {
    metrics::counter!("router_not_found_total", "method" => method).increment(1);
}

pub fn record_borrow() {
    metrics::counter!("pool_borrows_total").increment(1);
}

pub fn record_pool_growth() {
    metrics::counter!("pool_growth_total").increment(1);
}

pub fn record_connect_failure(stage: &'static str) {
    metrics::counter!("pool_connect_failures_total", "stage" => stage).increment(1);
}

pub fn record_sweep_repaired(count: usize) {
    metrics::counter!("pool_sweep_repaired_total").increment(count as u64);
}

pub fn record_pool_size(size: usize) {
    metrics::gauge!("pool_size").set(size as f64);
}
