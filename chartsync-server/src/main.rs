//! chartsync-server - daily chart to playlist sync service
//!
//! Ingests the daily song chart, resolves entries against the track
//! catalog, and maintains per-day resolved/missed snapshots with a
//! correction workflow for the misses and on-demand playlist publishing.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chartsync_common::config;
use chartsync_server::pipeline::resolver::ResolverLimits;
use chartsync_server::services::auth_client::AuthClient;
use chartsync_server::services::catalog_client::CatalogClient;
use chartsync_server::services::chart_client::ChartClient;
use chartsync_server::{build_router, AppState};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "chartsync-server")]
#[command(about = "Daily chart to playlist sync service")]
#[command(version)]
struct Args {
    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "CHARTSYNC_PORT")]
    port: Option<u16>,

    /// Data folder holding the database
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Path to the TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config =
        config::load_toml_config(args.config.as_deref()).context("Failed to load configuration")?;

    // RUST_LOG wins over the configured level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&toml_config.logging.level)),
        )
        .init();

    info!(
        "Starting chartsync-server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let root_folder = config::resolve_root_folder(args.root_folder.as_deref(), &toml_config);
    let db_path =
        config::prepare_root_folder(&root_folder).context("Failed to prepare data folder")?;
    info!("Database: {}", db_path.display());

    let db = chartsync_common::db::init::init_database(&db_path)
        .await
        .context("Failed to initialize database")?;

    let catalog = CatalogClient::new(&toml_config.catalog_base_url)
        .context("Failed to create catalog client")?;
    let charts =
        ChartClient::new(&toml_config.chart_base_url).context("Failed to create chart client")?;
    let auth = AuthClient::new(&toml_config.auth_base_url).context("Failed to create auth client")?;

    let state = AppState::new(
        db,
        Arc::new(catalog),
        Arc::new(charts),
        Arc::new(auth),
        ResolverLimits::default(),
        toml_config.default_playlist_id.clone(),
    );

    let app = build_router(state);

    let port = args.port.unwrap_or(toml_config.port);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down");
        }
    }
}
