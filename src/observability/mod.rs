//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatch and limiters produce:
//!     → tracing events (structured log lines, request id attached)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log output (stdout, level from config)
//!     → Metrics endpoint (Prometheus scrape, when enabled)
//! ```
//!
//! # Design Decisions
//! - Metric updates are cheap enough for the dispatch hot path
//! - The exporter is optional; recording without it is a no-op

pub mod metrics;
