//! awl-server - anime watchlist service
//!
//! Serves the watchlist HTTP API and reconciles media server shows against
//! the AniList catalog.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use awl_common::config::TomlConfig;
use awl_server::services::{AniListClient, IntervalPacer, PlexClient, RateLimitedCatalog};
use awl_server::{build_app, AppState};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Command-line arguments for awl-server
#[derive(Parser, Debug)]
#[command(name = "awl-server")]
#[command(about = "Anime watchlist service with media server reconciliation")]
#[command(version)]
struct Args {
    /// TOML configuration file (default: <config dir>/awl/config.toml)
    #[arg(short, long, env = "AWL_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// SQLite database file
    #[arg(short, long)]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config =
        TomlConfig::resolve(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(database) = args.database {
        config.database.path = database;
    }

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting awl-server v{}", env!("CARGO_PKG_VERSION"));
    info!("Database: {}", config.database.path.display());

    let db = awl_server::db::init_database(&config.database.path)
        .await
        .context("Failed to initialize database")?;

    let anilist = AniListClient::new(&config.catalog).context("Failed to build catalog client")?;
    let pacer = Arc::new(IntervalPacer::from_millis(
        config.catalog.min_request_interval_ms,
    ));
    let catalog = Arc::new(RateLimitedCatalog::new(Arc::new(anilist), pacer));
    info!(
        "Catalog: {} (min request interval {} ms)",
        config.catalog.base_url, config.catalog.min_request_interval_ms
    );

    if !config.plex.sync_enabled {
        info!("Plex sync disabled");
    }
    let plex = PlexClient::new(config.plex.clone()).context("Failed to build Plex client")?;

    let state = AppState::new(db, catalog, Arc::new(plex));
    let app = build_app(state, &config);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
