//! URL rewriting subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming path
//!     → RewriteTable::resolve
//!     → per rule, in registration order:
//!         exact equality → glob → path-parameter → regex
//!     → first rule with a succeeding sub-strategy wins; its target
//!       (with placeholder / capture substitution) replaces the path
//!     → no rule matched: the path passes through unchanged
//! ```
//!
//! # Design Decisions
//! - Rewriting is a no-op on miss, never an error
//! - Rules compile their glob/regex forms once at registration; a
//!   source valid under neither grammar still matches exactly or by
//!   path parameters
//! - Rewrite regexes are case-sensitive (route regexes are not)

pub mod table;

pub use table::RewriteTable;
