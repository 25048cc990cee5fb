//! Custom error pages.
//!
//! # Responsibilities
//! - Hold application-registered status-code → on-disk page mappings
//! - Render the not-found fallback (and any other error status),
//!   preferring a registered page and reverting to a plain-text
//!   default
//!
//! # Design Decisions
//! - Pages are validated to exist at registration; a missing file
//!   skips the entry with a log line rather than failing later
//! - Page bytes are read per render, off the registry lock

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use axum::body::Body;
use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum::response::Response;

#[derive(Clone)]
struct ErrorPage {
    file: PathBuf,
    headers: Vec<(HeaderName, HeaderValue)>,
}

/// Registry of custom error pages keyed by status code.
pub struct ErrorPages {
    pages: RwLock<HashMap<u16, ErrorPage>>,
}

impl ErrorPages {
    /// Create an empty registry; every status renders its plain-text
    /// default until pages are registered.
    pub fn new() -> Self {
        Self {
            pages: RwLock::new(HashMap::new()),
        }
    }

    /// Register a page for a status code, with optional extra response
    /// headers. The file must exist at registration or the entry is
    /// skipped.
    pub fn add_custom_error_page(
        &self,
        status: StatusCode,
        file: impl Into<PathBuf>,
        headers: &[(HeaderName, HeaderValue)],
    ) {
        let file = file.into();
        if !file.is_file() {
            tracing::warn!(file = %file.display(), status = status.as_u16(), "error page not found, skipping");
            return;
        }
        tracing::debug!(file = %file.display(), status = status.as_u16(), "error page registered");
        let page = ErrorPage {
            file,
            headers: headers.to_vec(),
        };
        self.pages
            .write()
            .expect("error page lock poisoned")
            .insert(status.as_u16(), page);
    }

    /// Render the not-found fallback.
    pub async fn not_found(&self) -> Response {
        self.render(StatusCode::NOT_FOUND, "404 page not found").await
    }

    /// Render `status` with the registered page, or a plain-text
    /// `fallback` body.
    pub async fn render(&self, status: StatusCode, fallback: &str) -> Response {
        let page = self
            .pages
            .read()
            .expect("error page lock poisoned")
            .get(&status.as_u16())
            .cloned();

        if let Some(page) = page {
            match tokio::fs::read(&page.file).await {
                Ok(bytes) => {
                    let mut response = Response::new(Body::from(bytes));
                    *response.status_mut() = status;
                    response.headers_mut().insert(
                        header::CONTENT_TYPE,
                        HeaderValue::from_static("text/html; charset=utf-8"),
                    );
                    for (name, value) in &page.headers {
                        response.headers_mut().insert(name.clone(), value.clone());
                    }
                    return response;
                }
                Err(e) => {
                    tracing::warn!(file = %page.file.display(), error = %e, "failed to read error page");
                }
            }
        }

        let mut response = Response::new(Body::from(fallback.to_string()));
        *response.status_mut() = status;
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        response
    }
}

impl Default for ErrorPages {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn default_not_found_is_plain_text() {
        let pages = ErrorPages::new();
        let response = pages.not_found().await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
    }

    #[tokio::test]
    async fn missing_file_is_skipped_at_registration() {
        let pages = ErrorPages::new();
        pages.add_custom_error_page(StatusCode::NOT_FOUND, "/nonexistent/404.html", &[]);
        let response = pages.not_found().await;
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
    }

    #[tokio::test]
    async fn registered_page_is_served_with_extra_headers() {
        let dir = std::env::temp_dir();
        let file = dir.join("tollgate-404-test.html");
        std::fs::write(&file, "<h1>gone</h1>").unwrap();

        let pages = ErrorPages::new();
        pages.add_custom_error_page(
            StatusCode::NOT_FOUND,
            &file,
            &[(
                HeaderName::from_static("x-custom"),
                HeaderValue::from_static("yes"),
            )],
        );
        let response = pages.not_found().await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()["x-custom"], "yes");
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/html; charset=utf-8"
        );

        let _ = std::fs::remove_file(&file);
    }
}
