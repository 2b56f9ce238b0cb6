// Library Catalog - Web Server
// REST API with Axum

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;

use library_catalog::{
    api::{self, AppState},
    telemetry, AppConfig, Database,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    telemetry::init_tracing(&config.logging.level);

    tracing::info!("Starting Library Catalog server v{}", library_catalog::VERSION);

    let db = Database::from_config(&config.database)
        .with_context(|| format!("Failed to open database {}", config.database.path))?;
    tracing::info!("Database opened: {}", config.database.path);

    let state = AppState { db: Arc::new(db) };
    let app = api::router(state.clone());

    let addr = SocketAddr::new(
        config
            .server
            .host
            .parse()
            .with_context(|| format!("Invalid host address {}", config.server.host))?,
        config.server.port,
    );
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("   API: http://{}/books", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Shutting down server...");
    state.db.shutdown();

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
