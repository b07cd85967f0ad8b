//! Axum Router Configuration
//!
//! This module defines the complete HTTP routing for the application,
//! including the cloud-facing endpoints and OpenAPI documentation.

use crate::{
    handlers,
    models::{
        ErrorResponse, HealthResponse, RefreshResponse, SettingsNotifyPayload, StatusResponse,
        WebhookPayload,
    },
    state::AppState,
};

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(handlers::webhook, handlers::settings_changed, handlers::health),
    components(
        schemas(WebhookPayload, SettingsNotifyPayload, StatusResponse, RefreshResponse, HealthResponse, ErrorResponse)
    ),
    tags(
        (name = "Lenslet API", description = "Webhook and settings endpoints for the glasses display apps")
    )
)]
pub struct ApiDoc;

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let api_router = Router::new()
        .route("/webhook", post(handlers::webhook))
        .route("/settings", post(handlers::settings_changed))
        .route("/health", get(handlers::health))
        .with_state(app_state);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_router)
}
