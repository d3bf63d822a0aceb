//! VANA guard service.
//!
//! ```text
//!                 ┌──────────────────────────────────────────────┐
//!                 │                 VANA GUARD                   │
//!   auth layer ──▶│  CircuitBreakerEngine  ◀── CleanupSweeper    │
//!   chat layer ──▶│  InputValidator                              │
//!                 │                                              │
//!   operators ───▶│  admin API (/admin/*, bearer key)            │
//!   Prometheus ──▶│  metrics exporter (optional)                 │
//!                 └──────────────────────────────────────────────┘
//! ```
//!
//! The engine and validator are library components; this binary hosts one
//! engine instance, its sweeper and the admin API for operators.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use vana_guard::admin::{setup_admin_router, AdminState};
use vana_guard::config::load_from_env;
use vana_guard::lifecycle::{signals, Shutdown};
use vana_guard::observability::{logging, metrics};
use vana_guard::security::{CircuitBreakerEngine, CleanupSweeper, InputValidator};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Bad configuration is fatal before anything starts.
    let config = match load_from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("vana-guard: configuration error: {e}");
            std::process::exit(2);
        }
    };

    logging::init_tracing(&config.observability);

    tracing::info!("vana-guard v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        profile = %config.circuit_breaker.profile,
        enabled = config.circuit_breaker.enabled,
        warning_threshold = config.circuit_breaker.warning_threshold,
        temporary_block_threshold = config.circuit_breaker.temporary_block_threshold,
        trusted_ips = config.circuit_breaker.trusted_ips.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let breaker = Arc::new(CircuitBreakerEngine::new(config.circuit_breaker));
    let validator = Arc::new(InputValidator::with_limits(&config.validation)?);
    let admin = Arc::new(config.admin);

    let shutdown = Arc::new(Shutdown::new());

    let sweeper = CleanupSweeper::new(breaker.clone());
    let sweeper_handle = tokio::spawn(sweeper.run(shutdown.subscribe()));

    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        signals::forward_signals(&signal_shutdown).await;
    });

    let router = setup_admin_router(AdminState {
        breaker,
        validator,
        admin: admin.clone(),
    });

    let listener = TcpListener::bind(&admin.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Admin API listening");

    let mut server_shutdown = shutdown.subscribe();
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = server_shutdown.recv().await;
        })
        .await?;

    let _ = sweeper_handle.await;
    tracing::info!("Shutdown complete");
    Ok(())
}
