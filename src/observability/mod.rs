//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Engine and validator produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//!     → Admin API (/admin/stats aggregate snapshot)
//! ```
//!
//! # Design Decisions
//! - Raw user input never appears in logs, only rule names
//! - Metrics are cheap (atomic increments) and no-ops without an exporter

pub mod logging;
pub mod metrics;
