//! Periodic circuit breaker cleanup.
//!
//! Idle services receive no `should_block_request` calls, so the inline
//! cleanup trigger would never fire. The sweeper drives the same
//! rate-limited pass from a timer.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time;

use crate::security::breaker::CircuitBreakerEngine;

pub struct CleanupSweeper {
    engine: Arc<CircuitBreakerEngine>,
    interval: Duration,
}

impl CleanupSweeper {
    pub fn new(engine: Arc<CircuitBreakerEngine>) -> Self {
        let interval = Duration::from_secs(engine.config().cleanup_interval_secs.max(1));
        Self { engine, interval }
    }

    pub fn with_interval(engine: Arc<CircuitBreakerEngine>, interval: Duration) -> Self {
        Self { engine, interval }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(interval_secs = self.interval.as_secs(), "Cleanup sweeper starting");

        let mut ticker = time::interval(self.interval);
        // The first tick completes immediately; the engine skips it as not due.
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Some(report) = self.engine.run_scheduled_cleanup() {
                        tracing::debug!(
                            removed_ips = report.removed_ips,
                            evicted_attempts = report.evicted_attempts,
                            "Scheduled cleanup pass"
                        );
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Cleanup sweeper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
