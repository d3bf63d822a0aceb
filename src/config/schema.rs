//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the guard.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::config::profiles::{Profile, DEVELOPMENT};

/// Root configuration for the guard service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GuardConfig {
    /// Authentication abuse protection.
    pub circuit_breaker: CircuitBreakerConfig,

    /// Chat input validation limits.
    pub validation: ValidationConfig,

    /// Admin API settings.
    pub admin: AdminConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Per-IP circuit breaker tunables.
///
/// When deserialized, the `profile` key selects the preset every omitted
/// field is taken from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "CircuitBreakerSection")]
pub struct CircuitBreakerConfig {
    /// Preset this configuration started from.
    pub profile: Profile,

    /// Master switch. When false nothing is tracked or blocked.
    pub enabled: bool,

    /// Consecutive failures that raise the HALF_OPEN warning state.
    pub warning_threshold: u32,

    /// Consecutive failures that open the circuit for the short block.
    pub temporary_block_threshold: u32,

    /// Consecutive failures that escalate to the extended block.
    pub extended_block_threshold: u32,

    /// Consecutive failures that escalate to the long-term block.
    pub long_term_block_threshold: u32,

    /// Block durations in seconds, one per tier.
    pub temporary_block_duration_secs: u64,
    pub extended_block_duration_secs: u64,
    pub long_term_block_duration_secs: u64,

    /// Minimum spacing between garbage-collection passes in seconds.
    pub cleanup_interval_secs: u64,

    /// Attempts older than this (seconds) are purged.
    pub max_tracking_age_secs: u64,

    /// Literal IPs that bypass all blocking. Private and loopback
    /// addresses are trusted regardless of this list.
    pub trusted_ips: Vec<String>,

    /// Log every blocked decision at warn level.
    pub log_blocked: bool,

    /// Log successful authentications that reset a tracked IP.
    pub log_success: bool,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        CircuitBreakerConfig::from(&DEVELOPMENT)
    }
}

/// `[circuit_breaker]` as written in a config file. Absent keys are `None`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CircuitBreakerSection {
    profile: Option<Profile>,
    enabled: Option<bool>,
    warning_threshold: Option<u32>,
    temporary_block_threshold: Option<u32>,
    extended_block_threshold: Option<u32>,
    long_term_block_threshold: Option<u32>,
    temporary_block_duration_secs: Option<u64>,
    extended_block_duration_secs: Option<u64>,
    long_term_block_duration_secs: Option<u64>,
    cleanup_interval_secs: Option<u64>,
    max_tracking_age_secs: Option<u64>,
    trusted_ips: Option<Vec<String>>,
    log_blocked: Option<bool>,
    log_success: Option<bool>,
}

impl From<CircuitBreakerSection> for CircuitBreakerConfig {
    fn from(section: CircuitBreakerSection) -> Self {
        let base = CircuitBreakerConfig::for_profile(section.profile.unwrap_or_default());
        Self {
            profile: base.profile,
            enabled: section.enabled.unwrap_or(base.enabled),
            warning_threshold: section.warning_threshold.unwrap_or(base.warning_threshold),
            temporary_block_threshold: section
                .temporary_block_threshold
                .unwrap_or(base.temporary_block_threshold),
            extended_block_threshold: section
                .extended_block_threshold
                .unwrap_or(base.extended_block_threshold),
            long_term_block_threshold: section
                .long_term_block_threshold
                .unwrap_or(base.long_term_block_threshold),
            temporary_block_duration_secs: section
                .temporary_block_duration_secs
                .unwrap_or(base.temporary_block_duration_secs),
            extended_block_duration_secs: section
                .extended_block_duration_secs
                .unwrap_or(base.extended_block_duration_secs),
            long_term_block_duration_secs: section
                .long_term_block_duration_secs
                .unwrap_or(base.long_term_block_duration_secs),
            cleanup_interval_secs: section
                .cleanup_interval_secs
                .unwrap_or(base.cleanup_interval_secs),
            max_tracking_age_secs: section
                .max_tracking_age_secs
                .unwrap_or(base.max_tracking_age_secs),
            trusted_ips: section.trusted_ips.unwrap_or(base.trusted_ips),
            log_blocked: section.log_blocked.unwrap_or(base.log_blocked),
            log_success: section.log_success.unwrap_or(base.log_success),
        }
    }
}

/// Chat input validation limits.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Maximum message length in characters.
    pub max_length: usize,

    /// Wall-clock budget for the whole rule battery in milliseconds.
    pub timeout_ms: u64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_length: 4000,
            timeout_ms: 10,
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Bearer token expected on every admin request.
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
            request_timeout_secs: 10,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format: "pretty" or "json".
    pub log_format: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_key_seeds_omitted_fields() {
        let config: GuardConfig = toml::from_str(
            r#"
            [circuit_breaker]
            profile = "production"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.circuit_breaker,
            CircuitBreakerConfig::for_profile(Profile::Production)
        );
    }

    #[test]
    fn test_explicit_keys_override_profile() {
        let config: GuardConfig = toml::from_str(
            r#"
            [circuit_breaker]
            profile = "test"
            temporary_block_duration_secs = 45
            trusted_ips = ["203.0.113.9"]
            "#,
        )
        .unwrap();
        let cb = &config.circuit_breaker;
        assert_eq!(cb.profile, Profile::Test);
        assert_eq!(cb.temporary_block_threshold, 3);
        assert_eq!(cb.temporary_block_duration_secs, 45);
        assert_eq!(cb.trusted_ips, vec!["203.0.113.9".to_string()]);
    }

    #[test]
    fn test_missing_section_is_development() {
        let config: GuardConfig = toml::from_str("").unwrap();
        assert_eq!(config.circuit_breaker, CircuitBreakerConfig::default());

        let config: GuardConfig = toml::from_str("[circuit_breaker]\nenabled = false").unwrap();
        assert_eq!(config.circuit_breaker.profile, Profile::Development);
        assert_eq!(config.circuit_breaker.warning_threshold, 5);
        assert!(!config.circuit_breaker.enabled);
    }
}
