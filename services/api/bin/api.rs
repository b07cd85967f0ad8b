//! Main Entrypoint for the Lenslet API Service
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment.
//! 2. Initializing logging.
//! 3. Constructing the shared state, router, and middleware.
//! 4. Starting the web server and handling graceful shutdown, which
//!    includes telling every live session to close.

use anyhow::Context;
use lenslet_api::{
    config::Config,
    registry::SessionRegistry,
    router::create_router,
    settings::HttpSettingsClient,
    state::AppState,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

/// Listens for the `Ctrl+C` signal to gracefully shut down the server.
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    info!("Received shutdown signal. Shutting down gracefully...");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .init();
    info!("Configuration loaded. Initializing application state...");

    // --- 3. Initialize Shared Services ---
    let settings = Arc::new(HttpSettingsClient::new(
        config.cloud_host.clone(),
        config.package_name.clone(),
    ));
    let registry = Arc::new(SessionRegistry::new());
    let app_state = Arc::new(AppState {
        config: Arc::new(config.clone()),
        registry: Arc::clone(&registry),
        settings,
    });

    // --- 4. Create Router and Apply Middleware ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(app_state).layer(cors);

    // --- 5. Start Server ---
    info!(
        app = ?config.app,
        package = %config.package_name,
        bind_address = %config.bind_address,
        "Service configured. Starting server..."
    );
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    registry.shutdown_all().await;
    info!("Server has shut down.");
    Ok(())
}
