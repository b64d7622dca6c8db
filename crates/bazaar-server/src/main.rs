//! Bazaar Server — application entry point.

use std::sync::Arc;

use anyhow::Context;
use bazaar_auth::AuthService;
use bazaar_db::DbManager;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod routes;
mod state;

use config::{CONFIG_PATH_VAR, DEFAULT_CONFIG_PATH, ServerConfig};
use state::AppState;

const DEFAULT_LOG_FILTER: &str =
    "bazaar_server=info,bazaar_auth=info,bazaar_db=info,tower_http=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .json()
        .init();

    let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
    let config = ServerConfig::load(&path).with_context(|| format!("loading {path}"))?;

    let auth_config = config.auth_config();
    auth_config
        .validate()
        .context("invalid authorization settings")?;
    let addr = config.socket_addr()?;

    tracing::info!(config = %path, "Starting Bazaar server...");

    let db = DbManager::connect(&config.db_config())
        .await
        .context("connecting to SurrealDB")?;
    db.migrate().await.context("running migrations")?;

    let auth = AuthService::new(db.credentials(), auth_config);
    let app = routes::router(Arc::new(AppState::new(auth)));

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Bazaar server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
