//! Tollgate — an HTTP request-dispatch engine.
//!
//! Given an incoming method and path, the engine selects a registered
//! handler (or an ordered chain of handlers) using one of three matching
//! strategies, optionally rewrites the path first, and enforces per-route
//! admission control through pluggable rate limiters.
//!
//! # Architecture Overview
//!
//! ```text
//! Client Request
//!     → http::server   (axum shell: request id, timeout, body limit)
//!     → rewrite        (optional source→target URL rewriting)
//!     → routing        (exact/glob → path-parameter → regex tables)
//!     → chain          (ordered links, stop short-circuits)
//!     → limiter        (token bucket / sliding window links)
//!     → terminal handler writes the response
//!
//! Misses at any stage fall through to the error-page-aware
//! not-found fallback; they never unwind as errors.
//! ```
//!
//! Registration happens at startup through an explicitly constructed
//! [`routing::Router`], [`rewrite::RewriteTable`] and
//! [`http::ErrorPages`]; dispatch shares them behind `Arc` across all
//! request tasks.

// Core subsystems
pub mod chain;
pub mod config;
pub mod http;
pub mod rewrite;
pub mod routing;

// Admission control
pub mod limiter;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
