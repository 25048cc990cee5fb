//! Request handling.
//!
//! # Responsibilities
//! - Carry the dispatch-relevant view of a request: method, (possibly
//!   rewritten) path, and headers
//! - Generate unique request IDs (UUID v4) as early as possible so
//!   they flow through all log lines
//!
//! # Design Decisions
//! - The engine never sees the transport request; the shell projects
//!   it into a `DispatchRequest` after rewriting

use axum::http::{HeaderMap, HeaderValue, Method, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// The dispatch-relevant view of an incoming request.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    method: Method,
    path: String,
    headers: HeaderMap,
}

impl DispatchRequest {
    /// Build a request view. `path` is the path to match routes
    /// against — after rewriting, when rewriting is enabled.
    pub fn new(method: Method, path: String, headers: HeaderMap) -> Self {
        Self {
            method,
            path,
            headers,
        }
    }

    /// The HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The path routes are matched against.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The incoming request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// A header value as a string, when present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Generates UUID v4 request IDs for `SetRequestIdLayer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeUuidRequestId;

impl MakeRequestId for MakeUuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}
