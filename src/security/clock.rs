//! Time source for the circuit breaker.
//!
//! Timestamps are seconds since the Unix epoch as `f64`.

use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

pub trait Clock: Send + Sync {
    fn now(&self) -> f64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64()
    }
}

/// Manually advanced clock.
///
/// Part of the public API so embedders can drive an engine in simulated
/// time: replaying an authentication log at recorded timestamps, or testing
/// their own escalation settings without waiting out real block durations.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<f64>,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, secs: f64) {
        let mut now = self.now.lock().expect("manual clock mutex poisoned");
        *now += secs;
    }

    pub fn set(&self, secs: f64) {
        *self.now.lock().expect("manual clock mutex poisoned") = secs;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        *self.now.lock().expect("manual clock mutex poisoned")
    }
}
