//! Circuit breaker state machine.
//!
//! # States
//! - Closed: normal operation, requests pass through
//! - Half-Open: warning or recovery, requests pass but are watched
//! - Open: source is blocked until its block duration elapses
//!
//! # State Transitions
//! ```text
//! Closed    → Half-Open: consecutive failures >= warning threshold
//! any       → Open:      consecutive failures >= temporary block threshold
//! Open      → Half-Open: probe after block_duration_for(failures) elapsed
//! any       → Closed:    success or manual reset
//! ```
//!
//! All transition logic lives in [`next_state`]; callers own the counters
//! and timestamps and only ask this module what the new state is.

use std::time::Duration;

use serde::Serialize;

use crate::config::CircuitBreakerConfig;

/// Circuit state for a single tracked source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    HalfOpen,
    Open,
}

/// Something that happened to a tracked source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitEvent {
    /// A failure was recorded; the count already includes it.
    Failure { consecutive_failures: u32 },
    /// A success was recorded, or an operator reset the source.
    Success,
    /// A request was checked while the circuit may be open.
    Probe {
        consecutive_failures: u32,
        elapsed_open: Duration,
    },
}

/// Block severity tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockTier {
    Temporary,
    Extended,
    LongTerm,
}

/// Thresholds and durations driving escalation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscalationPolicy {
    pub warning_threshold: u32,
    pub temporary_block_threshold: u32,
    pub extended_block_threshold: u32,
    pub long_term_block_threshold: u32,
    pub temporary_block_duration: Duration,
    pub extended_block_duration: Duration,
    pub long_term_block_duration: Duration,
}

impl EscalationPolicy {
    pub fn from_config(config: &CircuitBreakerConfig) -> Self {
        Self {
            warning_threshold: config.warning_threshold,
            temporary_block_threshold: config.temporary_block_threshold,
            extended_block_threshold: config.extended_block_threshold,
            long_term_block_threshold: config.long_term_block_threshold,
            temporary_block_duration: Duration::from_secs(config.temporary_block_duration_secs),
            extended_block_duration: Duration::from_secs(config.extended_block_duration_secs),
            long_term_block_duration: Duration::from_secs(config.long_term_block_duration_secs),
        }
    }

    /// Highest block tier reached by `failures`, checked high-threshold-first.
    pub fn tier_for(&self, failures: u32) -> Option<BlockTier> {
        if failures >= self.long_term_block_threshold {
            Some(BlockTier::LongTerm)
        } else if failures >= self.extended_block_threshold {
            Some(BlockTier::Extended)
        } else if failures >= self.temporary_block_threshold {
            Some(BlockTier::Temporary)
        } else {
            None
        }
    }

    /// How long a circuit opened at `failures` stays open.
    ///
    /// Counts below the temporary threshold map to the temporary duration.
    pub fn block_duration_for(&self, failures: u32) -> Duration {
        match self.tier_for(failures) {
            Some(BlockTier::LongTerm) => self.long_term_block_duration,
            Some(BlockTier::Extended) => self.extended_block_duration,
            Some(BlockTier::Temporary) | None => self.temporary_block_duration,
        }
    }
}

/// Compute the state that follows `event` in `current`.
pub fn next_state(
    current: CircuitState,
    event: CircuitEvent,
    policy: &EscalationPolicy,
) -> CircuitState {
    match event {
        CircuitEvent::Success => CircuitState::Closed,
        CircuitEvent::Failure {
            consecutive_failures,
        } => {
            if policy.tier_for(consecutive_failures).is_some() {
                CircuitState::Open
            } else if consecutive_failures >= policy.warning_threshold
                && current == CircuitState::Closed
            {
                CircuitState::HalfOpen
            } else {
                current
            }
        }
        CircuitEvent::Probe {
            consecutive_failures,
            elapsed_open,
        } => match current {
            CircuitState::Open
                if elapsed_open >= policy.block_duration_for(consecutive_failures) =>
            {
                CircuitState::HalfOpen
            }
            other => other,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> EscalationPolicy {
        EscalationPolicy {
            warning_threshold: 2,
            temporary_block_threshold: 3,
            extended_block_threshold: 5,
            long_term_block_threshold: 10,
            temporary_block_duration: Duration::from_secs(10),
            extended_block_duration: Duration::from_secs(60),
            long_term_block_duration: Duration::from_secs(600),
        }
    }

    fn failure(n: u32) -> CircuitEvent {
        CircuitEvent::Failure {
            consecutive_failures: n,
        }
    }

    #[test]
    fn test_escalation_ladder() {
        let p = policy();
        let mut state = CircuitState::Closed;
        let mut seen = Vec::new();
        for n in 1..=10 {
            state = next_state(state, failure(n), &p);
            seen.push(state);
        }
        assert_eq!(seen[0], CircuitState::Closed);
        assert_eq!(seen[1], CircuitState::HalfOpen);
        assert!(seen[2..].iter().all(|s| *s == CircuitState::Open));
    }

    #[test]
    fn test_warning_only_from_closed() {
        let p = policy();
        // Open stays open on further failures
        assert_eq!(next_state(CircuitState::Open, failure(2), &p), CircuitState::Open);
        assert_eq!(next_state(CircuitState::HalfOpen, failure(2), &p), CircuitState::HalfOpen);
    }

    #[test]
    fn test_half_open_reopens_on_failure_at_block_threshold() {
        let p = policy();
        assert_eq!(next_state(CircuitState::HalfOpen, failure(4), &p), CircuitState::Open);
    }

    #[test]
    fn test_success_always_closes() {
        let p = policy();
        for s in [CircuitState::Closed, CircuitState::HalfOpen, CircuitState::Open] {
            assert_eq!(next_state(s, CircuitEvent::Success, &p), CircuitState::Closed);
        }
    }

    #[test]
    fn test_probe_recovers_only_after_duration() {
        let p = policy();
        let probe = |secs: u64, n: u32| CircuitEvent::Probe {
            consecutive_failures: n,
            elapsed_open: Duration::from_secs(secs),
        };
        assert_eq!(next_state(CircuitState::Open, probe(9, 3), &p), CircuitState::Open);
        assert_eq!(next_state(CircuitState::Open, probe(10, 3), &p), CircuitState::HalfOpen);
        assert_eq!(next_state(CircuitState::Open, probe(59, 5), &p), CircuitState::Open);
        assert_eq!(next_state(CircuitState::Open, probe(60, 5), &p), CircuitState::HalfOpen);
        // probes never touch non-open states
        assert_eq!(next_state(CircuitState::Closed, probe(1000, 3), &p), CircuitState::Closed);
    }

    #[test]
    fn test_block_duration_tiers() {
        let p = policy();
        assert_eq!(p.block_duration_for(0), Duration::from_secs(10));
        assert_eq!(p.block_duration_for(3), Duration::from_secs(10));
        assert_eq!(p.block_duration_for(4), Duration::from_secs(10));
        assert_eq!(p.block_duration_for(5), Duration::from_secs(60));
        assert_eq!(p.block_duration_for(9), Duration::from_secs(60));
        assert_eq!(p.block_duration_for(10), Duration::from_secs(600));
        assert_eq!(p.block_duration_for(500), Duration::from_secs(600));
        assert_eq!(p.tier_for(2), None);
        assert_eq!(p.tier_for(7), Some(BlockTier::Extended));
    }
}
