mod auth;
mod config;
mod error;
mod middleware;
mod routes;
mod state;

use anyhow::{Context, Result};
use catalog_api::CatalogApi;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Args;
use crate::state::ServiceState;

pub(crate) const SERVICE_CONTRACT_VERSION: &str = "service.v1";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let api = CatalogApi::new(args.db.clone());
    let migration = api
        .migrate(false)
        .with_context(|| format!("failed to migrate catalog database {}", args.db.display()))?;
    info!(
        db = %args.db.display(),
        schema_version = migration.after_version.unwrap_or(migration.current_version),
        environment = args.environment.as_str(),
        "catalog database ready"
    );

    let state = ServiceState::new(api, args.environment);
    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("failed to bind {}", args.bind))?;
    info!(bind = %args.bind, "catalog service listening");
    axum::serve(listener, routes::app(state)).with_graceful_shutdown(shutdown_signal()).await?;
    info!("catalog service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for shutdown signal");
    }
}
