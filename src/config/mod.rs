//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → AppConfig (immutable once loaded)
//!     → shared with the server and subsystems at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no runtime reload
//! - All fields have defaults so a minimal (or absent) file still runs
//! - Loading failures abort startup before the engine sees traffic

pub mod loader;
pub mod schema;

pub use loader::{load_config, ConfigError};
pub use schema::AppConfig;
pub use schema::DispatchConfig;
pub use schema::ObservabilityConfig;
pub use schema::ServerConfig;
