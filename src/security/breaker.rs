//! Per-IP authentication circuit breaker.
//!
//! Tracks failed authentication attempts per source IP and decides whether a
//! new attempt from that IP is admitted. Escalation is progressive: a warning
//! state first, then open circuits with longer blocks at higher failure
//! counts. Transition rules come from [`crate::resilience::circuit_breaker`].
//!
//! One mutex guards the whole tracking map. Every mutation, including the
//! OPEN → HALF_OPEN transition taken on the read path, happens under it.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::config::CircuitBreakerConfig;
use crate::observability::metrics;
use crate::resilience::{next_state, CircuitEvent, CircuitState, EscalationPolicy};
use crate::security::attempts::{CircuitBreakerState, CircuitSnapshot, FailedAttempt};
use crate::security::clock::{Clock, SystemClock};
use crate::security::ip_trust::TrustedIps;

/// Why a request was admitted or blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    Disabled,
    TrustedIp,
    NoHistory,
    HalfOpenRecovery,
    CircuitOpen { failures: u32 },
    HalfOpenAllowed,
    Allowed,
}

impl BlockReason {
    /// Low-cardinality label for metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            BlockReason::Disabled => "disabled",
            BlockReason::TrustedIp => "trusted_ip",
            BlockReason::NoHistory => "no_history",
            BlockReason::HalfOpenRecovery => "half_open_recovery",
            BlockReason::CircuitOpen { .. } => "blocked",
            BlockReason::HalfOpenAllowed => "half_open_allowed",
            BlockReason::Allowed => "allowed",
        }
    }
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockReason::CircuitOpen { failures } => {
                write!(f, "circuit_open_{failures}_failures")
            }
            other => f.write_str(other.outcome()),
        }
    }
}

impl Serialize for BlockReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Admission decision for one authentication attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockDecision {
    pub should_block: bool,
    pub reason: BlockReason,
    pub retry_after_secs: Option<u64>,
}

impl BlockDecision {
    fn allow(reason: BlockReason) -> Self {
        Self {
            should_block: false,
            reason,
            retry_after_secs: None,
        }
    }

    fn block(failures: u32, retry_after_secs: u64) -> Self {
        Self {
            should_block: true,
            reason: BlockReason::CircuitOpen { failures },
            retry_after_secs: Some(retry_after_secs),
        }
    }

    /// Generic client-facing text for a blocked attempt. Reveals no thresholds.
    pub fn user_message(&self) -> Option<String> {
        if !self.should_block {
            return None;
        }
        Some(match self.retry_after_secs {
            Some(secs) => format!("Too many attempts. Please retry after {secs} seconds."),
            None => "Too many attempts. Please try again later.".to_string(),
        })
    }
}

/// Optional metadata attached to a failed attempt.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttemptContext<'a> {
    pub user_identifier: Option<&'a str>,
    pub user_agent: Option<&'a str>,
    pub endpoint: Option<&'a str>,
}

/// Aggregate view for monitoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CircuitBreakerStats {
    pub total_tracked_ips: usize,
    pub circuits_open: usize,
    pub circuits_half_open: usize,
    pub circuits_closed: usize,
    pub total_failed_attempts: usize,
    pub most_failed_ip: Option<String>,
    pub most_failures: usize,
}

/// What one cleanup pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CleanupReport {
    pub evicted_attempts: usize,
    pub removed_ips: usize,
}

struct Tracking {
    states: HashMap<String, CircuitBreakerState>,
    last_cleanup: f64,
}

/// Caller-owned circuit breaker. Share it with `Arc`.
pub struct CircuitBreakerEngine {
    config: CircuitBreakerConfig,
    policy: EscalationPolicy,
    trusted: TrustedIps,
    clock: Arc<dyn Clock>,
    tracking: Mutex<Tracking>,
}

impl CircuitBreakerEngine {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: CircuitBreakerConfig, clock: Arc<dyn Clock>) -> Self {
        let policy = EscalationPolicy::from_config(&config);
        let trusted = TrustedIps::new(config.trusted_ips.iter().cloned());
        let last_cleanup = clock.now();
        Self {
            config,
            policy,
            trusted,
            clock,
            tracking: Mutex::new(Tracking {
                states: HashMap::new(),
                last_cleanup,
            }),
        }
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    pub fn is_ip_trusted(&self, ip: &str) -> bool {
        self.trusted.is_trusted(ip)
    }

    /// Decide whether an authentication attempt from `ip` is admitted.
    pub fn should_block_request(&self, ip: &str, user_identifier: Option<&str>) -> BlockDecision {
        let decision = self.decide(ip, user_identifier);
        metrics::record_auth_decision(decision.reason.outcome());
        decision
    }

    fn decide(&self, ip: &str, user_identifier: Option<&str>) -> BlockDecision {
        if !self.config.enabled {
            return BlockDecision::allow(BlockReason::Disabled);
        }
        if self.is_ip_trusted(ip) {
            return BlockDecision::allow(BlockReason::TrustedIp);
        }

        let mut tracking = self.lock();
        let now = self.clock.now();
        self.cleanup_if_due(&mut tracking, now);

        let Some(state) = tracking.states.get_mut(ip) else {
            return BlockDecision::allow(BlockReason::NoHistory);
        };
        let failures = state.consecutive_failures;

        match state.state {
            CircuitState::Open => {
                let elapsed = (now - state.circuit_opened_at).max(0.0);
                let required = self.policy.block_duration_for(failures);
                let next = next_state(
                    CircuitState::Open,
                    CircuitEvent::Probe {
                        consecutive_failures: failures,
                        elapsed_open: secs_to_duration(elapsed),
                    },
                    &self.policy,
                );
                if next == CircuitState::HalfOpen {
                    state.state = next;
                    metrics::record_transition(next);
                    tracing::info!(
                        ip = %ip,
                        failures,
                        "Block expired, circuit half-open for recovery"
                    );
                    return BlockDecision::allow(BlockReason::HalfOpenRecovery);
                }

                let retry_after = (required.as_secs_f64() - elapsed).max(0.0) as u64;
                if self.config.log_blocked {
                    tracing::warn!(
                        ip = %ip,
                        user = ?user_identifier,
                        failures,
                        retry_after_secs = retry_after,
                        "Blocked authentication attempt"
                    );
                }
                BlockDecision::block(failures, retry_after)
            }
            CircuitState::HalfOpen => BlockDecision::allow(BlockReason::HalfOpenAllowed),
            CircuitState::Closed => {
                if failures >= self.policy.warning_threshold {
                    tracing::warn!(
                        ip = %ip,
                        failures,
                        threshold = self.policy.temporary_block_threshold,
                        "IP approaching authentication failure limit"
                    );
                }
                BlockDecision::allow(BlockReason::Allowed)
            }
        }
    }

    /// Record a failed authentication from `ip`. Trusted IPs are not tracked.
    pub fn record_failed_attempt(&self, ip: &str, context: AttemptContext<'_>) {
        if !self.config.enabled || self.is_ip_trusted(ip) {
            return;
        }

        let mut tracking = self.lock();
        let now = self.clock.now();
        let state = tracking
            .states
            .entry(ip.to_string())
            .or_insert_with(|| CircuitBreakerState::new(ip));

        let failures = state.record_failure(FailedAttempt {
            ip_address: ip.to_string(),
            timestamp: now,
            user_identifier: context.user_identifier.map(str::to_string),
            user_agent: context.user_agent.map(str::to_string),
            endpoint: context.endpoint.map(str::to_string),
        });
        metrics::record_auth_failure();

        let previous = state.state;
        let next = next_state(
            previous,
            CircuitEvent::Failure {
                consecutive_failures: failures,
            },
            &self.policy,
        );

        if next != previous {
            state.state = next;
            metrics::record_transition(next);
            match next {
                CircuitState::Open => {
                    state.circuit_opened_at = now;
                    tracing::warn!(
                        ip = %ip,
                        failures,
                        tier = ?self.policy.tier_for(failures),
                        block_secs = self.policy.block_duration_for(failures).as_secs(),
                        "Circuit opened for IP"
                    );
                }
                CircuitState::HalfOpen => {
                    tracing::warn!(ip = %ip, failures, "IP entered warning state");
                }
                CircuitState::Closed => {}
            }
        } else {
            tracing::debug!(ip = %ip, failures, state = ?next, "Failed attempt recorded");
        }

        let tracked = tracking.states.len();
        metrics::record_tracked_ips(tracked);
    }

    /// Record a successful authentication. Unknown IPs are left untracked.
    pub fn record_successful_attempt(&self, ip: &str, user_identifier: Option<&str>) {
        let mut tracking = self.lock();
        if let Some(state) = tracking.states.get_mut(ip) {
            let was = state.state;
            self.close(state);
            if self.config.log_success {
                tracing::info!(
                    ip = %ip,
                    user = ?user_identifier,
                    previous_state = ?was,
                    "Successful authentication reset circuit"
                );
            }
        }
    }

    /// Administrative override. Returns whether `ip` was tracked.
    pub fn reset_ip(&self, ip: &str) -> bool {
        let mut tracking = self.lock();
        match tracking.states.get_mut(ip) {
            Some(state) => {
                self.close(state);
                tracing::info!(ip = %ip, "Circuit manually reset");
                true
            }
            None => false,
        }
    }

    fn close(&self, state: &mut CircuitBreakerState) {
        let previous = state.state;
        let next = next_state(previous, CircuitEvent::Success, &self.policy);
        state.reset();
        state.state = next;
        if previous != next {
            metrics::record_transition(next);
        }
    }

    /// Run cleanup if `cleanup_interval` has passed since the last pass.
    pub fn run_scheduled_cleanup(&self) -> Option<CleanupReport> {
        let mut tracking = self.lock();
        let now = self.clock.now();
        self.cleanup_if_due(&mut tracking, now)
    }

    fn cleanup_if_due(&self, tracking: &mut Tracking, now: f64) -> Option<CleanupReport> {
        if now - tracking.last_cleanup < self.config.cleanup_interval_secs as f64 {
            return None;
        }
        tracking.last_cleanup = now;

        let cutoff = now - self.config.max_tracking_age_secs as f64;
        let mut report = CleanupReport::default();

        for state in tracking.states.values_mut() {
            report.evicted_attempts += state.evict_older_than(cutoff);
        }
        let before = tracking.states.len();
        tracking.states.retain(|_, state| !state.is_stale(cutoff));
        report.removed_ips = before - tracking.states.len();

        metrics::record_cleanup_removed(report.removed_ips);
        metrics::record_tracked_ips(tracking.states.len());
        if report.removed_ips > 0 || report.evicted_attempts > 0 {
            tracing::info!(
                removed_ips = report.removed_ips,
                evicted_attempts = report.evicted_attempts,
                remaining = tracking.states.len(),
                "Circuit breaker cleanup completed"
            );
        } else {
            tracing::debug!(remaining = tracking.states.len(), "Circuit breaker cleanup found nothing stale");
        }
        Some(report)
    }

    pub fn get_stats(&self) -> CircuitBreakerStats {
        let tracking = self.lock();
        let mut stats = CircuitBreakerStats {
            total_tracked_ips: tracking.states.len(),
            circuits_open: 0,
            circuits_half_open: 0,
            circuits_closed: 0,
            total_failed_attempts: 0,
            most_failed_ip: None,
            most_failures: 0,
        };

        for (ip, state) in &tracking.states {
            match state.state {
                CircuitState::Open => stats.circuits_open += 1,
                CircuitState::HalfOpen => stats.circuits_half_open += 1,
                CircuitState::Closed => stats.circuits_closed += 1,
            }
            let count = state.failed_attempts.len();
            stats.total_failed_attempts += count;

            let better = match &stats.most_failed_ip {
                None => count > 0,
                Some(current) => {
                    count > stats.most_failures
                        || (count == stats.most_failures && ip.as_str() < current.as_str())
                }
            };
            if better {
                stats.most_failed_ip = Some(ip.clone());
                stats.most_failures = count;
            }
        }
        stats
    }

    pub fn snapshot(&self, ip: &str) -> Option<CircuitSnapshot> {
        self.lock().states.get(ip).map(CircuitBreakerState::snapshot)
    }

    pub fn tracked_ip_count(&self) -> usize {
        self.lock().states.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tracking> {
        self.tracking
            .lock()
            .expect("circuit breaker mutex poisoned")
    }
}

fn secs_to_duration(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::clock::ManualClock;

    fn config() -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            warning_threshold: 2,
            temporary_block_threshold: 3,
            extended_block_threshold: 5,
            long_term_block_threshold: 10,
            temporary_block_duration_secs: 10,
            extended_block_duration_secs: 60,
            long_term_block_duration_secs: 600,
            cleanup_interval_secs: 3600,
            max_tracking_age_secs: 7 * 86_400,
            ..CircuitBreakerConfig::default()
        }
    }

    fn engine() -> (CircuitBreakerEngine, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_700_000_000.0));
        (CircuitBreakerEngine::with_clock(config(), clock.clone()), clock)
    }

    fn fail(engine: &CircuitBreakerEngine, ip: &str, times: u32) {
        for _ in 0..times {
            engine.record_failed_attempt(ip, AttemptContext::default());
        }
    }

    #[test]
    fn test_block_reason_strings() {
        assert_eq!(BlockReason::CircuitOpen { failures: 3 }.to_string(), "circuit_open_3_failures");
        assert_eq!(BlockReason::HalfOpenRecovery.to_string(), "half_open_recovery");
        assert_eq!(BlockReason::NoHistory.to_string(), "no_history");
        assert_eq!(BlockReason::TrustedIp.to_string(), "trusted_ip");
    }

    #[test]
    fn test_open_then_recover() {
        let (engine, clock) = engine();
        fail(&engine, "1.2.3.4", 3);

        let decision = engine.should_block_request("1.2.3.4", None);
        assert!(decision.should_block);
        assert_eq!(decision.reason.to_string(), "circuit_open_3_failures");
        assert_eq!(decision.retry_after_secs, Some(10));

        clock.advance(4.0);
        assert_eq!(engine.should_block_request("1.2.3.4", None).retry_after_secs, Some(6));

        clock.advance(6.0);
        let decision = engine.should_block_request("1.2.3.4", None);
        assert!(!decision.should_block);
        assert_eq!(decision.reason, BlockReason::HalfOpenRecovery);
        assert_eq!(engine.snapshot("1.2.3.4").unwrap().state, CircuitState::HalfOpen);

        let decision = engine.should_block_request("1.2.3.4", None);
        assert_eq!(decision.reason, BlockReason::HalfOpenAllowed);
    }

    #[test]
    fn test_reopen_does_not_reset_opened_at() {
        let (engine, clock) = engine();
        fail(&engine, "1.2.3.4", 3);
        let opened = engine.snapshot("1.2.3.4").unwrap().circuit_opened_at;
        clock.advance(2.0);
        fail(&engine, "1.2.3.4", 1);
        assert_eq!(engine.snapshot("1.2.3.4").unwrap().circuit_opened_at, opened);
    }

    #[test]
    fn test_failure_during_recovery_reopens() {
        let (engine, clock) = engine();
        fail(&engine, "1.2.3.4", 3);
        clock.advance(10.0);
        engine.should_block_request("1.2.3.4", None);

        fail(&engine, "1.2.3.4", 1);
        let snap = engine.snapshot("1.2.3.4").unwrap();
        assert_eq!(snap.state, CircuitState::Open);
        assert_eq!(snap.circuit_opened_at, clock.now());
        assert!(engine.should_block_request("1.2.3.4", None).should_block);
    }

    #[test]
    fn test_warning_state_does_not_block() {
        let (engine, _) = engine();
        fail(&engine, "1.2.3.4", 2);
        let decision = engine.should_block_request("1.2.3.4", None);
        assert!(!decision.should_block);
        assert_eq!(decision.reason, BlockReason::HalfOpenAllowed);
    }

    #[test]
    fn test_success_keeps_audit_trail() {
        let (engine, _) = engine();
        fail(&engine, "1.2.3.4", 4);
        engine.record_successful_attempt("1.2.3.4", Some("alice"));

        let snap = engine.snapshot("1.2.3.4").unwrap();
        assert_eq!(snap.state, CircuitState::Closed);
        assert_eq!(snap.consecutive_failures, 0);
        assert_eq!(snap.circuit_opened_at, 0.0);
        assert_eq!(snap.recorded_attempts, 4);
        assert_eq!(snap.total_attempts, 4);
    }

    #[test]
    fn test_success_for_unknown_ip_is_noop() {
        let (engine, _) = engine();
        engine.record_successful_attempt("9.9.9.9", None);
        assert_eq!(engine.tracked_ip_count(), 0);
        assert!(engine.snapshot("9.9.9.9").is_none());
    }

    #[test]
    fn test_reset_ip() {
        let (engine, _) = engine();
        assert!(!engine.reset_ip("1.2.3.4"));
        fail(&engine, "1.2.3.4", 5);
        assert!(engine.reset_ip("1.2.3.4"));
        assert_eq!(
            engine.should_block_request("1.2.3.4", None).reason,
            BlockReason::Allowed
        );
    }

    #[test]
    fn test_disabled_engine_tracks_nothing() {
        let clock = Arc::new(ManualClock::new(0.0));
        let config = CircuitBreakerConfig {
            enabled: false,
            ..config()
        };
        let engine = CircuitBreakerEngine::with_clock(config, clock);
        fail(&engine, "1.2.3.4", 20);
        assert_eq!(engine.tracked_ip_count(), 0);
        let decision = engine.should_block_request("1.2.3.4", None);
        assert!(!decision.should_block);
        assert_eq!(decision.reason, BlockReason::Disabled);
    }

    #[test]
    fn test_stats() {
        let (engine, _) = engine();
        fail(&engine, "1.1.1.1", 1);
        fail(&engine, "2.2.2.2", 2);
        fail(&engine, "3.3.3.3", 6);
        fail(&engine, "4.4.4.4", 6);

        let stats = engine.get_stats();
        assert_eq!(stats.total_tracked_ips, 4);
        assert_eq!(stats.circuits_open, 2);
        assert_eq!(stats.circuits_half_open, 1);
        assert_eq!(stats.circuits_closed, 1);
        assert_eq!(stats.total_failed_attempts, 15);
        assert_eq!(stats.most_failed_ip.as_deref(), Some("3.3.3.3"));
        assert_eq!(stats.most_failures, 6);
    }

    #[test]
    fn test_empty_stats() {
        let (engine, _) = engine();
        let stats = engine.get_stats();
        assert_eq!(stats.total_tracked_ips, 0);
        assert_eq!(stats.most_failed_ip, None);
        assert_eq!(stats.most_failures, 0);
    }

    #[test]
    fn test_cleanup_is_rate_limited() {
        let (engine, clock) = engine();
        assert!(engine.run_scheduled_cleanup().is_none());
        clock.advance(3600.0);
        assert!(engine.run_scheduled_cleanup().is_some());
        assert!(engine.run_scheduled_cleanup().is_none());
    }

    #[test]
    fn test_user_message() {
        let (engine, _) = engine();
        assert_eq!(engine.should_block_request("1.2.3.4", None).user_message(), None);
        fail(&engine, "1.2.3.4", 3);
        let msg = engine.should_block_request("1.2.3.4", None).user_message().unwrap();
        assert_eq!(msg, "Too many attempts. Please retry after 10 seconds.");
    }
}
