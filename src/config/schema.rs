//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! dispatch engine. All types derive Serde traits for deserialization
//! from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the dispatch engine.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Server configuration (bind address, timeouts, static files).
    pub server: ServerConfig,

    /// Dispatch behavior toggles.
    pub dispatch: DispatchConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Site name, sent back in the `Server` response header.
    pub name: String,

    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Request timeout (total time for request/response) in seconds.
    pub request_timeout_secs: u64,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Drain period after a shutdown signal before in-flight
    /// connections are abandoned.
    pub graceful_shutdown_secs: u64,

    /// Timeout for the post-startup liveness self-probe in seconds.
    pub check_alive_timeout_secs: u64,

    /// Directory served as static files under `/<basename>/...`.
    /// Ignored when unset or when the directory does not exist.
    pub static_file_path: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "tollgate".to_string(),
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
            max_body_bytes: 2 * 1024 * 1024,
            graceful_shutdown_secs: 10,
            check_alive_timeout_secs: 5,
            static_file_path: None,
        }
    }
}

/// Dispatch behavior toggles.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Run every incoming path through the rewrite table before routing.
    /// Off by default; rewriting adds a table scan to every request.
    pub url_rewrite: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self { url_rewrite: false }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
