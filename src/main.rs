use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use tunehub_api::config::{AppConfig, StoreBackend};
use tunehub_api::database::DatabaseManager;
use tunehub_api::AppState;

/// TuneHub music catalogue API server
#[derive(Debug, Parser)]
#[command(name = "tunehub-api", version, about)]
struct Args {
    /// Port to listen on (overrides PORT / TUNEHUB_API_PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Store backend: postgres or memory
    #[arg(long)]
    storage: Option<StoreBackend>,

    /// Directory for uploaded media
    #[arg(long)]
    upload_dir: Option<PathBuf>,
}

impl Args {
    fn apply(self, config: &mut AppConfig) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(backend) = self.storage {
            config.storage.backend = backend;
        }
        if let Some(dir) = self.upload_dir {
            config.storage.upload_dir = dir;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, SECURITY_JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("tunehub_api=info,tower_http=info")),
        )
        .init();

    let mut config = AppConfig::from_env();
    Args::parse().apply(&mut config);
    config.validate().context("invalid configuration")?;
    tracing::info!("Starting TuneHub API in {:?} mode", config.environment);

    let store = DatabaseManager::open(&config)
        .await
        .context("failed to open store")?;
    let bind_addr = config.bind_addr();
    let state = AppState::new(config, store).await?;

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("TuneHub API listening on http://{}", bind_addr);

    axum::serve(listener, tunehub_api::app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
