//! Pinboard - a small social posts service with token authentication

use anyhow::Result;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;

use config::Config;
use pinboard_api::{AppState, create_router};
use pinboard_auth::TokenService;
use pinboard_db::Database;

/// Pinboard - social posts service
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// Bind address
    #[arg(long, env = "PINBOARD_BIND")]
    bind: Option<String>,

    /// Port
    #[arg(short, long, env = "PINBOARD_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration; missing auth settings abort here
    let config = Config::load(&args.config)?;

    init_logging(&config.logging.level);

    info!("Starting Pinboard v{}", env!("CARGO_PKG_VERSION"));

    // Create the data directory for the SQLite file
    if let Some(parent) = Path::new(&config.database.path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    // Initialize database
    let db_url = format!("sqlite:{}?mode=rwc", config.database.path);
    let db = Database::new(&db_url).await?;

    // Initialize token service; rejects non-HMAC algorithms at startup
    let tokens = Arc::new(TokenService::new(
        &config.auth.secret,
        &config.auth.algorithm,
        config.auth.token_ttl_minutes,
    )?);

    // Install Prometheus metrics recorder
    let metrics_handle = Arc::new(PrometheusBuilder::new().install_recorder()?);

    let state = AppState::new(db, tokens);

    let app = create_router(state, Some(metrics_handle)).layer(TraceLayer::new_for_http());

    // Determine bind address
    let bind_addr = args.bind.unwrap_or(config.server.bind_address);
    let port = args.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", bind_addr, port).parse()?;

    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Initialize logging
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C handler");
    info!("Shutdown signal received");
}
