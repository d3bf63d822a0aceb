//! Per-IP failure tracking records.

use serde::Serialize;

use crate::resilience::CircuitState;

/// One recorded authentication failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedAttempt {
    pub ip_address: String,
    /// Seconds since the Unix epoch.
    pub timestamp: f64,
    pub user_identifier: Option<String>,
    pub user_agent: Option<String>,
    pub endpoint: Option<String>,
}

/// Mutable tracking record for a single source IP.
#[derive(Debug, Clone)]
pub struct CircuitBreakerState {
    pub ip_address: String,
    pub state: CircuitState,
    /// Chronological; appended on failure, trimmed from the front on cleanup.
    pub failed_attempts: Vec<FailedAttempt>,
    pub last_failure_time: f64,
    pub consecutive_failures: u32,
    /// 0.0 when the circuit is not open.
    pub circuit_opened_at: f64,
    /// Lifetime failure count, never reset.
    pub total_attempts: u64,
}

impl CircuitBreakerState {
    pub fn new(ip_address: &str) -> Self {
        Self {
            ip_address: ip_address.to_string(),
            state: CircuitState::Closed,
            failed_attempts: Vec::new(),
            last_failure_time: 0.0,
            consecutive_failures: 0,
            circuit_opened_at: 0.0,
            total_attempts: 0,
        }
    }

    /// Append a failure and bump the counters. Returns the new consecutive count.
    pub fn record_failure(&mut self, attempt: FailedAttempt) -> u32 {
        self.last_failure_time = attempt.timestamp;
        self.failed_attempts.push(attempt);
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.total_attempts = self.total_attempts.saturating_add(1);
        self.consecutive_failures
    }

    /// Close the circuit. Attempt history and the lifetime total are kept.
    pub fn reset(&mut self) {
        self.consecutive_failures = 0;
        self.state = CircuitState::Closed;
        self.circuit_opened_at = 0.0;
    }

    /// Drop attempts strictly older than `cutoff`. Returns how many went.
    pub fn evict_older_than(&mut self, cutoff: f64) -> usize {
        // Attempts are chronological, so everything to evict is a prefix.
        let keep_from = self
            .failed_attempts
            .iter()
            .position(|a| a.timestamp >= cutoff)
            .unwrap_or(self.failed_attempts.len());
        self.failed_attempts.drain(..keep_from);
        keep_from
    }

    /// Whether cleanup may forget this source entirely.
    pub fn is_stale(&self, cutoff: f64) -> bool {
        self.failed_attempts.is_empty()
            && self.last_failure_time < cutoff
            && self.state == CircuitState::Closed
    }

    pub fn snapshot(&self) -> CircuitSnapshot {
        CircuitSnapshot {
            ip_address: self.ip_address.clone(),
            state: self.state,
            consecutive_failures: self.consecutive_failures,
            recorded_attempts: self.failed_attempts.len(),
            total_attempts: self.total_attempts,
            last_failure_time: self.last_failure_time,
            circuit_opened_at: self.circuit_opened_at,
        }
    }
}

/// Read-only copy of a tracking record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CircuitSnapshot {
    pub ip_address: String,
    pub state: CircuitState,
    pub consecutive_failures: u32,
    pub recorded_attempts: usize,
    pub total_attempts: u64,
    pub last_failure_time: f64,
    pub circuit_opened_at: f64,
}
