//! Tollgate server binary.
//!
//! Loads configuration, initializes tracing and metrics, registers the
//! application's routes and rewrites, and serves until interrupted.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tollgate::config::{load_config, AppConfig};
use tollgate::http::{DispatchRequest, ErrorPages, HttpServer, ResponseWriter};
use tollgate::lifecycle::Shutdown;
use tollgate::observability::metrics;
use tollgate::rewrite::RewriteTable;
use tollgate::routing::Router;

#[derive(Parser, Debug)]
#[command(name = "tollgate", about = "HTTP request-dispatch engine")]
struct Args {
    /// Path to the TOML configuration file; defaults apply when
    /// omitted.
    #[arg(short, long, env = "TOLLGATE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    // RUST_LOG wins over the configured level when set.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(&config.observability.log_level)
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        name = %config.server.name,
        bind_address = %config.server.bind_address,
        url_rewrite = config.dispatch.url_rewrite,
        request_timeout_secs = config.server.request_timeout_secs,
        "configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "failed to parse metrics address"
            ),
        }
    }

    let router = Arc::new(Router::new());
    let rewrites = Arc::new(RewriteTable::new());
    let error_pages = Arc::new(ErrorPages::new());
    register_routes(&router, &rewrites, &error_pages);

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    let addr = listener.local_addr()?;

    tokio::spawn(check_alive(
        format!("http://{addr}/"),
        Duration::from_secs(config.server.check_alive_timeout_secs),
    ));

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, router, rewrites, error_pages);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("shutdown complete");
    Ok(())
}

/// Application wiring point: register routes, chains, rewrite rules
/// and error pages here before the server starts.
///
/// Handlers under all three pattern shapes, chains with rate-limiter
/// links, and rewrite rules all hang off the three registries; see the
/// crate documentation for the full registration API.
fn register_routes(router: &Router, _rewrites: &RewriteTable, _error_pages: &ErrorPages) {
    router.add_handler(
        "/version",
        |_req: &DispatchRequest, w: &mut ResponseWriter| {
            w.write_json(&serde_json::json!({
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
            }));
        },
        &[],
    );
}

/// Probe the root URL once after startup and log whether the server
/// answered.
async fn check_alive(url: String, timeout: Duration) {
    // Give the listener a beat to start accepting.
    tokio::time::sleep(Duration::from_millis(200)).await;
    let client = match reqwest::Client::builder().timeout(timeout).build() {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!(error = %e, "failed to build liveness probe client");
            return;
        }
    };
    match client.get(&url).send().await {
        Ok(response) if response.status().is_success() => {
            tracing::info!("server started up");
        }
        Ok(response) => {
            tracing::warn!(status = %response.status(), "liveness probe got unexpected status");
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to contact server");
        }
    }
}
