//! VANA authentication abuse protection and chat input validation.
//!
//! Two decoupled components consumed by an authentication/API layer:
//! - [`security::CircuitBreakerEngine`]: per-IP progressive blocking driven
//!   by failed authentication attempts
//! - [`security::validate_chat_input`]: ordered, time-bounded rule battery
//!   rejecting injection and prompt-manipulation payloads

pub mod admin;
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod security;

pub use config::GuardConfig;
pub use lifecycle::Shutdown;
pub use security::{
    sanitize_output, validate_chat_input, AttemptContext, BlockDecision, CircuitBreakerEngine,
    InputValidator, ValidationOutcome,
};
