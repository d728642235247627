//! Prometheus metrics exposition
//!
//! - `mpesa_callbacks_total` (counter): label `outcome` (`success`, `failed`, `invalid`)
//! - `mpesa_requests_total`, `mpesa_token_refresh_total`: recorded by the
//!   client crates when they run in this process

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the global Prometheus recorder and return a handle for rendering.
pub fn install_recorder() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder")
}

/// Count a received callback by outcome.
pub fn record_callback(outcome: &'static str) {
    metrics::counter!("mpesa_callbacks_total", "outcome" => outcome).increment(1);
}
