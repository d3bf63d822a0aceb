//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use vana_guard::admin::{setup_admin_router, AdminState};
use vana_guard::config::{AdminConfig, CircuitBreakerConfig};
use vana_guard::lifecycle::Shutdown;
use vana_guard::security::{AttemptContext, CircuitBreakerEngine, InputValidator, ManualClock};

#[allow(dead_code)]
pub const ADMIN_KEY: &str = "test-admin-key";

/// Small thresholds: warning 2, temporary 3, extended 5, long-term 10.
pub fn escalation_config() -> CircuitBreakerConfig {
    CircuitBreakerConfig {
        warning_threshold: 2,
        temporary_block_threshold: 3,
        extended_block_threshold: 5,
        long_term_block_threshold: 10,
        temporary_block_duration_secs: 10,
        extended_block_duration_secs: 60,
        long_term_block_duration_secs: 600,
        ..CircuitBreakerConfig::default()
    }
}

/// Engine driven by a manual clock starting at a fixed epoch time.
pub fn manual_engine(config: CircuitBreakerConfig) -> (Arc<CircuitBreakerEngine>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(1_700_000_000.0));
    let engine = Arc::new(CircuitBreakerEngine::with_clock(config, clock.clone()));
    (engine, clock)
}

pub fn fail(engine: &CircuitBreakerEngine, ip: &str, times: u32) {
    for _ in 0..times {
        engine.record_failed_attempt(
            ip,
            AttemptContext {
                user_identifier: Some("mallory"),
                user_agent: Some("curl/8.0"),
                endpoint: Some("/auth/login"),
            },
        );
    }
}

/// Start the admin API on an ephemeral port.
#[allow(dead_code)]
pub async fn start_admin_server(breaker: Arc<CircuitBreakerEngine>) -> (SocketAddr, Shutdown) {
    let admin = AdminConfig {
        api_key: ADMIN_KEY.to_string(),
        ..AdminConfig::default()
    };

    let router = setup_admin_router(AdminState {
        breaker,
        validator: Arc::new(InputValidator::new().unwrap()),
        admin: Arc::new(admin),
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let mut rx = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = rx.recv().await;
            })
            .await;
    });

    (addr, shutdown)
}
