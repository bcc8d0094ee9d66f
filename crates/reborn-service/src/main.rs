//! Reborn Service - HTTP API for the reborn marketplace
//!
//! This is the main entry point for the reborn service.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reborn_service::{create_router, AppState, ServiceConfig};
use reborn_store::PgDatabase;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,reborn=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Reborn Service");

    // Load configuration from environment
    let config = ServiceConfig::from_env();

    tracing::info!(
        listen_addr = %config.listen_addr,
        storage_configured = %config.storage_endpoint.is_some(),
        "Service configuration loaded"
    );

    // Connect to PostgreSQL and apply migrations
    let db = PgDatabase::connect(&config.database_url, config.db_max_connections).await?;
    db.migrate().await?;
    tracing::info!("Database connected and migrated");

    // Build app state
    let state = AppState::new(Arc::new(db), config.clone());

    // Create the router
    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    // Start HTTP server
    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
