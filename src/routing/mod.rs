//! Request routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → registry.rs (Router: three route tables behind one RwLock)
//!     → matcher.rs (exact/glob → path-parameter → regex, in that order)
//!     → Return: Handled (response written) or NotFound
//!
//! Route Registration (at startup):
//!     add_handler* / add_chain_handler*
//!     → filter HTTP methods, compile glob/regex, tokenize templates
//!     → append to the table for that pattern shape
//! ```
//!
//! # Design Decisions
//! - Tables are ordered lists: among simultaneously-matching patterns
//!   the first-registered route wins, deterministically
//! - A structural match consumes the dispatch; a disallowed method on a
//!   matched route yields not-found, it does not try further tables
//! - Handlers run after the table lock is released; no I/O under a lock

pub mod matcher;
pub mod path;
pub mod registry;

pub use matcher::DispatchOutcome;
pub use path::{PathParams, PathToken};
pub use registry::{Handler, PathParamHandler, Router};
