//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults (development preset)
//!     → optional TOML file (VANA_GUARD_CONFIG)
//!     → CB_ENVIRONMENT preset, then individual CB_* overrides
//!     → validation.rs (semantic checks)
//!     → GuardConfig (validated, immutable)
//!     → handed by value/Arc to the engine, validator and admin API
//! ```
//!
//! # Design Decisions
//! - Config values are plain data; presets are constants, not constructors
//! - Unparsable numbers fail startup instead of silently defaulting
//! - Validation returns every error, not just the first

pub mod loader;
pub mod profiles;
pub mod schema;
pub mod summary;
pub mod validation;

pub use loader::{apply_env_overrides, load_from_env, load_with, read_config_file, ConfigError};
pub use profiles::Profile;
pub use schema::{AdminConfig, CircuitBreakerConfig, GuardConfig, ObservabilityConfig, ValidationConfig};
pub use summary::ConfigSummary;
