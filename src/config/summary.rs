//! Configuration introspection for debugging endpoints.

use serde::Serialize;

use crate::config::profiles::Profile;
use crate::config::schema::{CircuitBreakerConfig, GuardConfig, ValidationConfig};

/// Effective tunables. Never carries the admin key.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSummary {
    pub profile: Profile,
    pub enabled: bool,
    pub warning_threshold: u32,
    pub temporary_block_threshold: u32,
    pub extended_block_threshold: u32,
    pub long_term_block_threshold: u32,
    pub temporary_block_duration_secs: u64,
    pub extended_block_duration_secs: u64,
    pub long_term_block_duration_secs: u64,
    pub cleanup_interval_secs: u64,
    pub max_tracking_age_secs: u64,
    pub trusted_ips: Vec<String>,
    pub log_blocked: bool,
    pub log_success: bool,
    pub validation_max_length: usize,
    pub validation_timeout_ms: u64,
}

impl ConfigSummary {
    /// Summarise the sections a running engine and validator were built from.
    pub fn new(cb: &CircuitBreakerConfig, validation: &ValidationConfig) -> Self {
        Self {
            profile: cb.profile,
            enabled: cb.enabled,
            warning_threshold: cb.warning_threshold,
            temporary_block_threshold: cb.temporary_block_threshold,
            extended_block_threshold: cb.extended_block_threshold,
            long_term_block_threshold: cb.long_term_block_threshold,
            temporary_block_duration_secs: cb.temporary_block_duration_secs,
            extended_block_duration_secs: cb.extended_block_duration_secs,
            long_term_block_duration_secs: cb.long_term_block_duration_secs,
            cleanup_interval_secs: cb.cleanup_interval_secs,
            max_tracking_age_secs: cb.max_tracking_age_secs,
            trusted_ips: cb.trusted_ips.clone(),
            log_blocked: cb.log_blocked,
            log_success: cb.log_success,
            validation_max_length: validation.max_length,
            validation_timeout_ms: validation.timeout_ms,
        }
    }
}

impl GuardConfig {
    /// Snapshot of the configured values.
    pub fn environment_summary(&self) -> ConfigSummary {
        ConfigSummary::new(&self.circuit_breaker, &self.validation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_omits_admin_key() {
        let mut config = GuardConfig::default();
        config.admin.api_key = "super-secret".into();
        let json = serde_json::to_string(&config.environment_summary()).unwrap();
        assert!(!json.contains("super-secret"));
        assert!(json.contains("\"profile\":\"development\""));
        assert!(json.contains("\"warning_threshold\":5"));
    }

    #[test]
    fn test_summary_from_sections() {
        let cb = CircuitBreakerConfig::for_profile(Profile::Test);
        let summary = ConfigSummary::new(&cb, &ValidationConfig::default());
        assert_eq!(summary.profile, Profile::Test);
        assert_eq!(summary.temporary_block_threshold, 3);
        assert_eq!(summary.temporary_block_duration_secs, 5);
        assert_eq!(summary.validation_max_length, 4000);
    }
}
