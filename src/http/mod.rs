//! HTTP shell subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum setup: request id, timeout, body limit, trace)
//!     → request.rs (DispatchRequest: method + path + headers)
//!     → rewrite table (optional) → routing engine
//!     → response.rs (ResponseWriter accumulated by handlers/links)
//!     → errors.rs (not-found fallback, custom error pages)
//!     → Send to client
//! ```
//!
//! The shell owns the transport; the engine only ever sees a method, a
//! path and a writer.

pub mod errors;
pub mod request;
pub mod response;
pub mod server;

pub use errors::ErrorPages;
pub use request::{DispatchRequest, X_REQUEST_ID};
pub use response::ResponseWriter;
pub use server::HttpServer;
