//! Metrics collection and exposition.
//!
//! # Metrics
//! - `guard_auth_decisions_total` (counter): block decisions by outcome
//! - `guard_auth_failures_total` (counter): recorded authentication failures
//! - `guard_circuit_transitions_total` (counter): state changes by target state
//! - `guard_tracked_ips` (gauge): IPs currently held in memory
//! - `guard_cleanup_removed_total` (counter): IP states purged by cleanup
//! - `guard_validation_rejections_total` (counter): rejected inputs by rule
//! - `guard_validation_duration_seconds` (histogram): rule battery latency
//!
//! Recording without an installed exporter is a no-op.

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::resilience::CircuitState;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_auth_decision(outcome: &'static str) {
    counter!("guard_auth_decisions_total", "outcome" => outcome).increment(1);
}

pub fn record_auth_failure() {
    counter!("guard_auth_failures_total").increment(1);
}

pub fn record_transition(to: CircuitState) {
    let to = match to {
        CircuitState::Closed => "closed",
        CircuitState::HalfOpen => "half_open",
        CircuitState::Open => "open",
    };
    counter!("guard_circuit_transitions_total", "to" => to).increment(1);
}

pub fn record_tracked_ips(count: usize) {
    gauge!("guard_tracked_ips").set(count as f64);
}

pub fn record_cleanup_removed(count: usize) {
    counter!("guard_cleanup_removed_total").increment(count as u64);
}

pub fn record_validation_rejection(rule: &'static str) {
    counter!("guard_validation_rejections_total", "rule" => rule).increment(1);
}

pub fn record_validation_duration(elapsed: Duration) {
    histogram!("guard_validation_duration_seconds").record(elapsed.as_secs_f64());
}
