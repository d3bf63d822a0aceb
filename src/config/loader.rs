//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

use crate::config::profiles::{Profile, UnknownProfile};
use crate::config::schema::{CircuitBreakerConfig, GuardConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Path of an optional TOML configuration file.
pub const CONFIG_PATH_VAR: &str = "VANA_GUARD_CONFIG";
/// Profile selector applied before individual overrides.
pub const PROFILE_VAR: &str = "CB_ENVIRONMENT";
pub const ADMIN_KEY_VAR: &str = "VANA_GUARD_ADMIN_KEY";
pub const ADMIN_BIND_VAR: &str = "VANA_GUARD_BIND";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error(transparent)]
    UnknownProfile(#[from] UnknownProfile),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a TOML configuration file. Not validated; overrides may follow.
pub fn read_config_file(path: &Path) -> Result<GuardConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Build the startup configuration from the process environment.
pub fn load_from_env() -> Result<GuardConfig, ConfigError> {
    load_with(|key: &str| std::env::var(key).ok())
}

/// Optional file, then environment overlay, then semantic validation.
pub fn load_with<F>(lookup: F) -> Result<GuardConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match lookup(CONFIG_PATH_VAR) {
        Some(path) => read_config_file(Path::new(&path))?,
        None => GuardConfig::default(),
    };

    apply_env_overrides(&mut config, lookup)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment variables onto `config`.
///
/// `CB_ENVIRONMENT` replaces the whole circuit breaker section with the
/// named preset first; the individual `CB_*` variables then override single
/// fields.
pub fn apply_env_overrides<F>(config: &mut GuardConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(name) = lookup(PROFILE_VAR) {
        let profile = Profile::from_str(&name)?;
        config.circuit_breaker = CircuitBreakerConfig::for_profile(profile);
    }

    let cb = &mut config.circuit_breaker;

    set_parsed(&lookup, "CB_WARNING_THRESHOLD", &mut cb.warning_threshold)?;
    set_parsed(&lookup, "CB_TEMP_BLOCK_THRESHOLD", &mut cb.temporary_block_threshold)?;
    set_parsed(&lookup, "CB_EXTENDED_BLOCK_THRESHOLD", &mut cb.extended_block_threshold)?;
    set_parsed(&lookup, "CB_LONG_TERM_BLOCK_THRESHOLD", &mut cb.long_term_block_threshold)?;
    set_parsed(&lookup, "CB_TEMP_BLOCK_DURATION", &mut cb.temporary_block_duration_secs)?;
    set_parsed(&lookup, "CB_EXTENDED_BLOCK_DURATION", &mut cb.extended_block_duration_secs)?;
    set_parsed(&lookup, "CB_LONG_TERM_BLOCK_DURATION", &mut cb.long_term_block_duration_secs)?;
    set_parsed(&lookup, "CB_CLEANUP_INTERVAL", &mut cb.cleanup_interval_secs)?;
    set_parsed(&lookup, "CB_MAX_TRACKING_AGE", &mut cb.max_tracking_age_secs)?;

    if let Some(list) = lookup("CB_TRUSTED_IPS") {
        cb.trusted_ips = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
    }

    if let Some(v) = lookup("CB_ENABLED") {
        cb.enabled = parse_bool(&v);
    }
    if let Some(v) = lookup("CB_LOG_BLOCKED") {
        cb.log_blocked = parse_bool(&v);
    }
    if let Some(v) = lookup("CB_LOG_SUCCESS") {
        cb.log_success = parse_bool(&v);
    }

    if let Some(key) = lookup(ADMIN_KEY_VAR) {
        config.admin.api_key = key;
    }
    if let Some(bind) = lookup(ADMIN_BIND_VAR) {
        config.admin.bind_address = bind;
    }

    Ok(())
}

/// `true`, `1`, `yes` and `on` (any case) are true; anything else is false.
pub fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

fn set_parsed<F, T>(lookup: &F, key: &'static str, slot: &mut T) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if let Some(raw) = lookup(key) {
        *slot = raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        })?;
    }
    Ok(())
}
