//! Admission-control subsystem.
//!
//! # Data Flow
//! ```text
//! Chain executor reaches a limiter link
//!     → serve_next: atomic admission check under the limiter's mutex
//!     → admitted: return true, the chain continues
//!     → rejected: write the rejection response (status configurable,
//!       200 by default) and stop the chain
//! ```
//!
//! # Design Decisions
//! - Two independent algorithms behind the same chain-link capability,
//!   insertable anywhere in plain or path-parameter chains
//! - Each limiter instance owns one mutex; critical sections are short
//!   and never perform I/O
//! - The token bucket's periodic refiller is a cancellable background
//!   task, started lazily on the first admission check

pub mod sliding_window;
pub mod token_bucket;

pub use sliding_window::SlidingWindowLimiter;
pub use token_bucket::TokenBucketLimiter;
