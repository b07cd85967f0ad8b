//! Axum Handlers for the REST API
//!
//! This module contains the logic for the cloud-facing endpoints: the
//! webhook that announces a new session, the settings-change
//! notification, and the health check. It uses `utoipa` doc comments to
//! generate OpenAPI documentation.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{Instrument, error, info};

use crate::{
    models::{
        ErrorResponse, HealthResponse, RefreshResponse, SettingsNotifyPayload, StatusResponse,
        WebhookPayload,
    },
    state::AppState,
    ws::session,
};

pub enum ApiError {
    BadRequest(String),
    InternalServerError(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { message })).into_response()
            }
            ApiError::InternalServerError(err) => {
                error!("Internal Server Error: {:?}", err);
                let message = "An internal server error occurred.".to_string();
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse { message }),
                )
                    .into_response()
            }
        }
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::InternalServerError(err.into())
    }
}

/// Accept a session-open webhook and start the session task.
#[utoipa::path(
    post,
    path = "/webhook",
    request_body = WebhookPayload,
    responses(
        (status = 200, description = "Session accepted", body = StatusResponse),
        (status = 400, description = "Bad request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn webhook(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<WebhookPayload>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.session_id.is_empty() || payload.user_id.is_empty() {
        return Err(ApiError::BadRequest(
            "sessionId and userId must be non-empty".to_string(),
        ));
    }
    info!(session_id = %payload.session_id, user_id = %payload.user_id, "webhook received");

    let (control_rx, generation) = state.registry.open(&payload.session_id, &payload.user_id);
    let task_state = state.as_ref().clone();
    let span = tracing::info_span!(
        "session",
        session_id = %payload.session_id,
        user_id = %payload.user_id,
    );
    tokio::spawn(
        session::run_session(
            task_state,
            payload.session_id,
            payload.user_id,
            generation,
            control_rx,
        )
        .instrument(span),
    );

    Ok((
        StatusCode::OK,
        Json(StatusResponse {
            status: "connecting".to_string(),
        }),
    ))
}

/// Notify running sessions that a user's settings changed.
#[utoipa::path(
    post,
    path = "/settings",
    request_body = SettingsNotifyPayload,
    responses(
        (status = 200, description = "Refresh fanned out", body = RefreshResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn settings_changed(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SettingsNotifyPayload>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let user_id = payload.user_id_for_settings;
    let sessions_refreshed = state.registry.refresh_user(&user_id).await;
    info!(%user_id, sessions_refreshed, "settings refresh fanned out");
    Ok(Json(RefreshResponse {
        status: "settings updated".to_string(),
        sessions_refreshed,
    }))
}

/// Health check.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        app: state.config.package_name.clone(),
    })
}
