//! Response accumulation for handlers and chain links.
//!
//! # Responsibilities
//! - Give handlers a place to write status, headers and body without
//!   touching the transport
//! - Convert the accumulated state into an axum response at the end of
//!   dispatch
//!
//! # Design Decisions
//! - Infallible write API: handlers do not return errors; a failed
//!   JSON serialization degrades to 500 and is logged

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::Response;

/// Accumulates the response a handler or chain produces.
pub struct ResponseWriter {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl ResponseWriter {
    /// A fresh writer: 200 OK, no headers, empty body.
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    /// Set the response status.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// The status as currently set.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Insert (or replace) a response header.
    pub fn insert_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    /// Append bytes to the body.
    pub fn write(&mut self, bytes: &[u8]) {
        self.body.extend_from_slice(bytes);
    }

    /// Append a string to the body.
    pub fn write_str(&mut self, s: &str) {
        self.body.extend_from_slice(s.as_bytes());
    }

    /// Serialize `value` as the JSON body and set the content type.
    /// Serialization failure degrades to 500 with an empty body.
    pub fn write_json<T: serde::Serialize>(&mut self, value: &T) {
        match serde_json::to_vec(value) {
            Ok(bytes) => {
                self.headers.insert(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("application/json"),
                );
                self.body.extend_from_slice(&bytes);
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize JSON response");
                self.status = StatusCode::INTERNAL_SERVER_ERROR;
            }
        }
    }

    /// The body accumulated so far.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Consume the writer into an axum response.
    pub fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

impl Default for ResponseWriter {
    fn default() -> Self {
        Self::new()
    }
}
