//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Authentication outcome:
//!     → circuit_breaker.rs (pure next_state: escalate, recover, close)
//!
//! Untrusted input check:
//!     → timeouts.rs (Deadline checked between rules, fail closed on expiry)
//! ```
//!
//! # Design Decisions
//! - State machine is a pure function; callers own counters and timestamps
//! - Every adversarial computation has a deadline
//! - Timeouts are distinct errors, never silent passes

pub mod circuit_breaker;
pub mod timeouts;

pub use circuit_breaker::{next_state, BlockTier, CircuitEvent, CircuitState, EscalationPolicy};
pub use timeouts::{bounded, Deadline, TimedOut};
