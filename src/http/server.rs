//! HTTP server setup and dispatch entry point.
//!
//! # Responsibilities
//! - Create the axum router with the catch-all dispatch handler
//! - Wire up middleware (request ID, trace, timeout, body limit)
//! - Serve static files when a directory is configured
//! - Run incoming paths through the rewrite table, then the engine
//! - Render the not-found fallback for unhandled requests
//! - Graceful shutdown with a bounded drain period

use std::future::IntoFuture;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::http::errors::ErrorPages;
use crate::http::request::{DispatchRequest, MakeUuidRequestId, X_REQUEST_ID};
use crate::http::response::ResponseWriter;
use crate::observability::metrics;
use crate::rewrite::RewriteTable;
use crate::routing::{DispatchOutcome, Router as DispatchRouter};

/// Application state injected into the dispatch handler.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<DispatchRouter>,
    pub rewrites: Arc<RewriteTable>,
    pub error_pages: Arc<ErrorPages>,
    /// Value of the `Server` response header.
    pub server_header: HeaderValue,
    pub url_rewrite: bool,
}

/// HTTP server wrapping the dispatch engine.
pub struct HttpServer {
    router: axum::Router,
    config: AppConfig,
}

impl HttpServer {
    /// Create a server over explicitly constructed registries.
    pub fn new(
        config: AppConfig,
        router: Arc<DispatchRouter>,
        rewrites: Arc<RewriteTable>,
        error_pages: Arc<ErrorPages>,
    ) -> Self {
        let server_header = HeaderValue::from_str(&config.server.name)
            .unwrap_or_else(|_| HeaderValue::from_static("tollgate"));
        let state = AppState {
            router,
            rewrites,
            error_pages,
            server_header,
            url_rewrite: config.dispatch.url_rewrite,
        };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the axum router with all middleware layers. Everything
    /// not claimed by the static mount falls through to the dispatch
    /// handler.
    fn build_router(config: &AppConfig, state: AppState) -> axum::Router {
        let mut app = axum::Router::new()
            .route("/", any(dispatch_entry))
            .fallback(dispatch_entry)
            .with_state(state);

        if let Some(dir) = config.server.static_file_path.as_deref() {
            match static_mount(dir) {
                Some(mount) => {
                    tracing::info!(directory = dir, mount = %mount, "serving static files");
                    app = app.nest_service(&mount, ServeDir::new(dir));
                }
                None => {
                    tracing::warn!(directory = dir, "static file path unusable, skipping");
                }
            }
        }

        app.layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeUuidRequestId))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(config.server.max_body_bytes))
                .layer(TimeoutLayer::new(Duration::from_secs(
                    config.server.request_timeout_secs,
                ))),
        )
    }

    /// Run the server until a ctrl-c or a shutdown signal, then drain
    /// in-flight connections for at most the configured period.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let drain = Duration::from_secs(self.config.server.graceful_shutdown_secs);
        let (drained_tx, drained_rx) = tokio::sync::oneshot::channel::<()>();

        let serve = axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("interrupt received, server shutting down");
                    }
                    _ = shutdown.recv() => {
                        tracing::info!("shutdown signal received, server shutting down");
                    }
                }
                let _ = drained_tx.send(());
            })
            .into_future();
        tokio::pin!(serve);

        tokio::select! {
            result = &mut serve => result?,
            _ = async {
                let _ = drained_rx.await;
                tokio::time::sleep(drain).await;
            } => {
                tracing::warn!(?drain, "drain period elapsed, abandoning in-flight connections");
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

/// Mount point for the static directory: `/<basename>`.
fn static_mount(dir: &str) -> Option<String> {
    if !Path::new(dir).is_dir() {
        return None;
    }
    let base = Path::new(dir).file_name()?.to_str()?;
    Some(format!("/{base}"))
}

/// Catch-all handler: rewrite, match, execute, or fall through to
/// not-found.
async fn dispatch_entry(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let raw_path = request.uri().path().to_string();
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    // Root liveness probe, outside the route tables.
    if raw_path == "/" {
        let mut response = (axum::http::StatusCode::OK, "I am alive!").into_response();
        response
            .headers_mut()
            .insert(header::SERVER, state.server_header.clone());
        return response;
    }

    let path = if state.url_rewrite {
        let rewritten = state.rewrites.resolve(&raw_path);
        if rewritten != raw_path {
            tracing::debug!(request_id = %request_id, from = %raw_path, to = %rewritten, "URL rewritten");
        }
        rewritten
    } else {
        raw_path
    };

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        "dispatching request"
    );

    let req = DispatchRequest::new(method.clone(), path, request.headers().clone());
    let mut writer = ResponseWriter::new();
    let mut response = match state.router.dispatch(&req, &mut writer) {
        DispatchOutcome::Handled => {
            metrics::record_dispatch(method.as_str(), writer.status().as_u16(), "handled", start);
            writer.into_response()
        }
        DispatchOutcome::NotFound => {
            tracing::debug!(request_id = %request_id, method = %method, path = %req.path(), "no route matched");
            metrics::record_dispatch(method.as_str(), 404, "not_found", start);
            state.error_pages.not_found().await
        }
    };
    response
        .headers_mut()
        .insert(header::SERVER, state.server_header.clone());
    response
}
