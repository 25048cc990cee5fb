//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::Arc;

use tollgate::config::AppConfig;
use tollgate::http::{ErrorPages, HttpServer};
use tollgate::lifecycle::Shutdown;
use tollgate::rewrite::RewriteTable;
use tollgate::routing::Router;

/// Start a dispatch server on an ephemeral port. `setup` registers
/// routes, rewrite rules and error pages before the server starts.
/// Returns the bound address and the shutdown handle.
pub async fn start_server<F>(mut config: AppConfig, setup: F) -> (SocketAddr, Shutdown)
where
    F: FnOnce(&Router, &RewriteTable, &ErrorPages),
{
    let router = Arc::new(Router::new());
    let rewrites = Arc::new(RewriteTable::new());
    let error_pages = Arc::new(ErrorPages::new());
    setup(&router, &rewrites, &error_pages);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    config.server.bind_address = addr.to_string();

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    let server = HttpServer::new(config, router, rewrites, error_pages);
    tokio::spawn(async move {
        let _ = server.run(listener, receiver).await;
    });

    (addr, shutdown)
}

/// A client that never goes through a proxy and keeps no pooled
/// connections between tests.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
