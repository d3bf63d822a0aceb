//! Configuration validation.
//!
//! Semantic checks that serde cannot express. Every violation is collected
//! so an operator sees the whole list in one startup failure.

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::GuardConfig;

/// A single semantic configuration problem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("circuit_breaker.warning_threshold must be at least 1")]
    ZeroWarningThreshold,

    #[error("circuit breaker thresholds must be non-decreasing: {lower} ({lower_value}) > {upper} ({upper_value})")]
    ThresholdOrder {
        lower: &'static str,
        lower_value: u32,
        upper: &'static str,
        upper_value: u32,
    },

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("validation.max_length must be greater than zero")]
    ZeroMaxLength,

    #[error("validation.timeout_ms must be greater than zero")]
    ZeroValidationTimeout,

    #[error("observability.metrics_address '{0}' is not a valid socket address")]
    MetricsAddress(String),
}

/// Validate a loaded configuration.
pub fn validate_config(config: &GuardConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let cb = &config.circuit_breaker;

    if cb.warning_threshold == 0 {
        errors.push(ValidationError::ZeroWarningThreshold);
    }

    let ladder = [
        ("warning_threshold", cb.warning_threshold),
        ("temporary_block_threshold", cb.temporary_block_threshold),
        ("extended_block_threshold", cb.extended_block_threshold),
        ("long_term_block_threshold", cb.long_term_block_threshold),
    ];
    for pair in ladder.windows(2) {
        let (lower, lower_value) = pair[0];
        let (upper, upper_value) = pair[1];
        if lower_value > upper_value {
            errors.push(ValidationError::ThresholdOrder {
                lower,
                lower_value,
                upper,
                upper_value,
            });
        }
    }

    let durations = [
        ("temporary_block_duration_secs", cb.temporary_block_duration_secs),
        ("extended_block_duration_secs", cb.extended_block_duration_secs),
        ("long_term_block_duration_secs", cb.long_term_block_duration_secs),
        ("cleanup_interval_secs", cb.cleanup_interval_secs),
        ("max_tracking_age_secs", cb.max_tracking_age_secs),
    ];
    for (name, value) in durations {
        if value == 0 {
            errors.push(ValidationError::ZeroDuration(name));
        }
    }

    if config.validation.max_length == 0 {
        errors.push(ValidationError::ZeroMaxLength);
    }
    if config.validation.timeout_ms == 0 {
        errors.push(ValidationError::ZeroValidationTimeout);
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
