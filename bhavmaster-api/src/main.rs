//! Facade binary: load config, run the startup window, serve HTTP.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use bhavmaster_api::{config::AppConfig, routes, startup, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bhavmaster_core=info,bhavmaster_api=info".into()),
        )
        .init();

    let config = AppConfig::load_or_default();
    let state = Arc::new(
        AppState::from_config(&config).context("failed to prepare the output store")?,
    );

    // The startup window must finish before the server accepts requests.
    let startup_state = Arc::clone(&state);
    tokio::task::spawn_blocking(move || startup::run_if_configured(&startup_state)).await?;

    let app = routes::router().with_state(Arc::clone(&state));
    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    info!(bind = %config.bind, data_dir = %config.data_dir.display(), "facade listening");
    axum::serve(listener, app).await?;
    Ok(())
}
