//! Ghost Qiniu server
//!
//! Serves the Qiniu storage adapter to a Ghost host over HTTP.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ghost_qiniu_api::{AppState, create_router};
use ghost_qiniu_core::storage::{QiniuConfig, QiniuStorage};
use ghost_qiniu_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ghost_qiniu=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    // Build the storage adapter
    let storage = QiniuStorage::from_config(QiniuConfig::from(config.storage))
        .context("Failed to configure Qiniu storage")?;
    info!(
        bucket = %storage.bucket(),
        domain = %storage.domain(),
        "Qiniu storage configured"
    );

    let state = AppState {
        storage: Arc::new(storage),
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
