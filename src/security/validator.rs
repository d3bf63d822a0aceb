//! Chat input validation.
//!
//! Classifies untrusted text as safe or unsafe for downstream LLM use. Rules
//! run in a fixed order and the first violation wins:
//!
//! 1. non-empty
//! 2. maximum length (before any regex work)
//! 3. HTML tags, 4. `javascript:`, 5. inline event handlers
//! 6. SQL keywords, 7. shell operators, 8. filesystem commands
//! 9. path traversal, 10. system paths, 11. prompt-injection phrases
//!
//! The battery runs under a [`Deadline`]; running out of budget rejects the
//! input with `"validation timeout"` instead of returning late.
//!
//! Keyword matching cannot tell prose from code, so questions such as
//! "What does SELECT do?" are rejected. This trade-off is accepted.

use std::sync::LazyLock;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::config::ValidationConfig;
use crate::observability::metrics;
use crate::resilience::{bounded, Deadline, TimedOut};
use crate::security::rules::{compile_rules, PatternRule};

pub const EMPTY_MESSAGE: &str = "Message cannot be empty";
pub const TIMEOUT_MESSAGE: &str = "validation timeout";
pub const UNAVAILABLE_MESSAGE: &str = "validation unavailable";

/// Result of validating one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationOutcome {
    pub is_valid: bool,
    /// Empty when valid.
    pub error_message: String,
    /// Name of the rule that rejected the input.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<&'static str>,
}

impl ValidationOutcome {
    fn valid() -> Self {
        Self {
            is_valid: true,
            error_message: String::new(),
            rule: None,
        }
    }

    fn rejected(rule: &'static str, message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            error_message: message.into(),
            rule: Some(rule),
        }
    }

    pub fn into_tuple(self) -> (bool, String) {
        (self.is_valid, self.error_message)
    }
}

/// Compiled rule battery with its limits.
#[derive(Debug, Clone)]
pub struct InputValidator {
    rules: Vec<PatternRule>,
    max_length: usize,
    timeout: Duration,
}

impl InputValidator {
    /// Validator with the default limits (4000 characters, 10ms).
    pub fn new() -> Result<Self, regex::Error> {
        Self::with_limits(&ValidationConfig::default())
    }

    pub fn with_limits(config: &ValidationConfig) -> Result<Self, regex::Error> {
        Ok(Self {
            rules: compile_rules()?,
            max_length: config.max_length,
            timeout: Duration::from_millis(config.timeout_ms),
        })
    }

    /// Limits this validator enforces.
    pub fn limits(&self) -> ValidationConfig {
        ValidationConfig {
            max_length: self.max_length,
            timeout_ms: self.timeout.as_millis() as u64,
        }
    }

    pub fn validate(&self, text: &str) -> ValidationOutcome {
        let started = Instant::now();
        let outcome = match bounded(self.timeout, |deadline| self.run_rules(text, deadline)) {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(
                    budget_ms = err.budget.as_millis() as u64,
                    elapsed_us = err.elapsed.as_micros() as u64,
                    length = text.len(),
                    "Input validation timed out"
                );
                ValidationOutcome::rejected("timeout", TIMEOUT_MESSAGE)
            }
        };
        metrics::record_validation_duration(started.elapsed());

        if let Some(rule) = outcome.rule {
            metrics::record_validation_rejection(rule);
            tracing::debug!(rule, "Chat input rejected");
        }
        outcome
    }

    fn run_rules(&self, text: &str, deadline: &Deadline) -> Result<ValidationOutcome, TimedOut> {
        if text.trim().is_empty() {
            return Ok(ValidationOutcome::rejected("empty", EMPTY_MESSAGE));
        }

        // A UTF-8 char is at most 4 bytes, so this skips counting huge inputs.
        let too_long = text.len() > self.max_length.saturating_mul(4)
            || text.chars().count() > self.max_length;
        if too_long {
            return Ok(ValidationOutcome::rejected(
                "max_length",
                format!("Message too long (maximum {} characters)", self.max_length),
            ));
        }

        for rule in &self.rules {
            deadline.check()?;
            if rule.is_match(text) {
                return Ok(ValidationOutcome::rejected(rule.name, rule.message));
            }
        }
        Ok(ValidationOutcome::valid())
    }
}

static DEFAULT_VALIDATOR: LazyLock<Result<InputValidator, regex::Error>> =
    LazyLock::new(InputValidator::new);

/// Validate with the default limits.
///
/// Fails closed if the rule battery could not be built.
pub fn validate_chat_input(text: &str) -> ValidationOutcome {
    match DEFAULT_VALIDATOR.as_ref() {
        Ok(validator) => validator.validate(text),
        Err(err) => {
            tracing::error!(error = %err, "Input validator unavailable");
            ValidationOutcome::rejected("unavailable", UNAVAILABLE_MESSAGE)
        }
    }
}
