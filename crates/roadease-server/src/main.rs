//! ROAD EASE Server: connects to SurrealDB, applies migrations and
//! seeds the permission catalog, then waits for shutdown.

mod config;

use std::time::Duration;

use roadease_core::error::AppResult;
use roadease_db::DbManager;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;

#[tokio::main]
async fn main() {
    let config = match ServerConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .json()
        .init();

    info!("Starting ROAD EASE server...");

    let timeout = Duration::from_secs(config.startup_timeout_secs);
    let startup = tokio::time::timeout(timeout, start(&config)).await;
    let db = match startup {
        Ok(Ok(db)) => db,
        Ok(Err(e)) => {
            error!(error = %e, "Startup failed");
            std::process::exit(1);
        }
        Err(_) => {
            error!(timeout_secs = config.startup_timeout_secs, "Startup timed out");
            std::process::exit(1);
        }
    };

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }

    drop(db);
    info!("ROAD EASE server stopped.");
}

async fn start(config: &ServerConfig) -> AppResult<DbManager> {
    let db = DbManager::connect(&config.db_config()).await?;
    let permissions = db.prepare().await?;
    info!(permissions, "Server ready");

    Ok(db)
}
