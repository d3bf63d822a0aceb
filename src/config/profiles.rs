//! Named circuit breaker presets.
//!
//! Presets are plain data. Selecting one (via `CB_ENVIRONMENT` or the
//! `profile` key) copies its values into a [`CircuitBreakerConfig`], after
//! which individual overrides apply.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::schema::CircuitBreakerConfig;

/// Deployment profile selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    Production,
    #[default]
    Development,
    Test,
}

impl Profile {
    /// The preset bundle for this profile.
    pub fn preset(self) -> &'static ProfilePreset {
        match self {
            Profile::Production => &PRODUCTION,
            Profile::Development => &DEVELOPMENT,
            Profile::Test => &TEST,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Profile::Production => "production",
            Profile::Development => "development",
            Profile::Test => "test",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a profile name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown environment profile '{0}' (expected production, development or test)")]
pub struct UnknownProfile(pub String);

impl FromStr for Profile {
    type Err = UnknownProfile;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Profile::Production),
            "development" | "dev" => Ok(Profile::Development),
            "test" | "testing" => Ok(Profile::Test),
            _ => Err(UnknownProfile(s.to_string())),
        }
    }
}

/// A complete set of circuit breaker tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfilePreset {
    pub profile: Profile,
    pub warning_threshold: u32,
    pub temporary_block_threshold: u32,
    pub extended_block_threshold: u32,
    pub long_term_block_threshold: u32,
    pub temporary_block_duration_secs: u64,
    pub extended_block_duration_secs: u64,
    pub long_term_block_duration_secs: u64,
    pub cleanup_interval_secs: u64,
    pub max_tracking_age_secs: u64,
    pub trusted_ips: &'static [&'static str],
    pub log_blocked: bool,
    pub log_success: bool,
}

const LOOPBACK: &[&str] = &["127.0.0.1", "::1"];

/// Base defaults.
pub const DEVELOPMENT: ProfilePreset = ProfilePreset {
    profile: Profile::Development,
    warning_threshold: 5,
    temporary_block_threshold: 10,
    extended_block_threshold: 20,
    long_term_block_threshold: 50,
    temporary_block_duration_secs: 900,
    extended_block_duration_secs: 3600,
    long_term_block_duration_secs: 86_400,
    cleanup_interval_secs: 3600,
    max_tracking_age_secs: 7 * 86_400,
    trusted_ips: LOOPBACK,
    log_blocked: true,
    log_success: true,
};

/// Stricter thresholds, longer blocks.
pub const PRODUCTION: ProfilePreset = ProfilePreset {
    profile: Profile::Production,
    warning_threshold: 3,
    temporary_block_threshold: 5,
    extended_block_threshold: 10,
    long_term_block_threshold: 25,
    temporary_block_duration_secs: 1800,
    extended_block_duration_secs: 7200,
    long_term_block_duration_secs: 2 * 86_400,
    cleanup_interval_secs: 1800,
    max_tracking_age_secs: 14 * 86_400,
    trusted_ips: LOOPBACK,
    log_blocked: true,
    log_success: false,
};

/// Sub-minute durations for fast test cycles.
pub const TEST: ProfilePreset = ProfilePreset {
    profile: Profile::Test,
    warning_threshold: 2,
    temporary_block_threshold: 3,
    extended_block_threshold: 5,
    long_term_block_threshold: 10,
    temporary_block_duration_secs: 5,
    extended_block_duration_secs: 10,
    long_term_block_duration_secs: 30,
    cleanup_interval_secs: 10,
    max_tracking_age_secs: 60,
    trusted_ips: LOOPBACK,
    log_blocked: true,
    log_success: true,
};

impl From<&ProfilePreset> for CircuitBreakerConfig {
    fn from(p: &ProfilePreset) -> Self {
        Self {
            profile: p.profile,
            enabled: true,
            warning_threshold: p.warning_threshold,
            temporary_block_threshold: p.temporary_block_threshold,
            extended_block_threshold: p.extended_block_threshold,
            long_term_block_threshold: p.long_term_block_threshold,
            temporary_block_duration_secs: p.temporary_block_duration_secs,
            extended_block_duration_secs: p.extended_block_duration_secs,
            long_term_block_duration_secs: p.long_term_block_duration_secs,
            cleanup_interval_secs: p.cleanup_interval_secs,
            max_tracking_age_secs: p.max_tracking_age_secs,
            trusted_ips: p.trusted_ips.iter().map(|s| s.to_string()).collect(),
            log_blocked: p.log_blocked,
            log_success: p.log_success,
        }
    }
}

impl CircuitBreakerConfig {
    /// Configuration for a named profile with no overrides.
    pub fn for_profile(profile: Profile) -> Self {
        Self::from(profile.preset())
    }
}
