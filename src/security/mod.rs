//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Authentication attempt (caller):
//!     → breaker.rs should_block_request (trusted? open? retry after?)
//!     → caller verifies credentials
//!     → breaker.rs record_failed_attempt / record_successful_attempt
//!
//! Chat message (caller):
//!     → validator.rs validate_chat_input (rules.rs, first violation wins)
//!     → caller forwards accepted text downstream
//!     → sanitize.rs sanitize_output before display
//!
//! Background:
//!     → sweeper.rs (periodic, rate-limited cleanup of stale IP state)
//! ```
//!
//! # Design Decisions
//! - Defense in depth: validation plus output encoding
//! - Fail closed: malformed IPs are tracked, validator timeouts reject
//! - No trust in client input; raw text is never logged

pub mod attempts;
pub mod breaker;
pub mod clock;
pub mod ip_trust;
pub mod rules;
pub mod sanitize;
pub mod sweeper;
pub mod validator;

pub use attempts::{CircuitBreakerState, CircuitSnapshot, FailedAttempt};
pub use breaker::{
    AttemptContext, BlockDecision, BlockReason, CircuitBreakerEngine, CircuitBreakerStats,
    CleanupReport,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use ip_trust::TrustedIps;
pub use sanitize::sanitize_output;
pub use sweeper::CleanupSweeper;
pub use validator::{validate_chat_input, InputValidator, ValidationOutcome};
