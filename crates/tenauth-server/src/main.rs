//! tenauth server: application entry point.

mod config;

use anyhow::Context;
use tenauth_auth::AuthService;
use tenauth_db::DbManager;
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tenauth=info"));
    tracing_subscriber::fmt().with_env_filter(filter).json().init();

    tracing::info!("Starting tenauth server...");

    let config = ServerConfig::from_env()?;

    let db = DbManager::connect(&config.db)
        .await
        .context("opening credential store")?;

    let auth = AuthService::new(db.tenants(), db.users(), db.sessions(), config.auth)
        .context("building auth service")?;

    let tokens = auth.token_service();
    tracing::info!(
        issuer = tokens.issuer(),
        access_token_ttl_secs = tokens.access_lifetime_secs(),
        "tenauth ready"
    );

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;

    tracing::info!("tenauth server stopped.");
    Ok(())
}
