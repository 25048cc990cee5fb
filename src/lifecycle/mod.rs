//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     Load config → init tracing/metrics → register routes → serve
//!
//! Shutdown:
//!     ctrl-c or Shutdown::trigger
//!     → server stops accepting, drains within the configured period
//!     → limiter refill tasks are stopped by their owners
//! ```

pub mod shutdown;

pub use shutdown::Shutdown;
