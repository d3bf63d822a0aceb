//! Bounded computation.
//!
//! Synchronous, CPU-bound work that must not stall the caller runs under a
//! [`Deadline`]. The work checks the deadline between steps and gives up
//! with [`TimedOut`] once the budget is spent. Callers decide what a timeout
//! means; security checks treat it as a rejection.

use std::time::{Duration, Instant};

use thiserror::Error;

/// Returned when a bounded computation runs past its budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("computation exceeded its {budget:?} budget after {elapsed:?}")]
pub struct TimedOut {
    pub budget: Duration,
    pub elapsed: Duration,
}

/// A wall-clock budget started at construction.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    budget: Duration,
}

impl Deadline {
    pub fn start(budget: Duration) -> Self {
        Self {
            started: Instant::now(),
            budget,
        }
    }

    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Checkpoint between steps of a bounded computation.
    pub fn check(&self) -> Result<(), TimedOut> {
        let elapsed = self.elapsed();
        if elapsed > self.budget {
            Err(TimedOut {
                budget: self.budget,
                elapsed,
            })
        } else {
            Ok(())
        }
    }
}

/// Run `work` under a fresh deadline of `budget`.
///
/// `work` receives the deadline and is expected to call
/// [`Deadline::check`] between steps, propagating the error with `?`.
pub fn bounded<T, F>(budget: Duration, work: F) -> Result<T, TimedOut>
where
    F: FnOnce(&Deadline) -> Result<T, TimedOut>,
{
    let deadline = Deadline::start(budget);
    work(&deadline)
}
