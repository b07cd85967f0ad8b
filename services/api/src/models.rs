//! HTTP API Models
//!
//! Request/response payloads for the webhook front door and the
//! administrative endpoints, with `utoipa` schemas for the generated
//! OpenAPI documentation. Field names are camelCase on the wire because
//! that is what the cloud transport sends.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of the cloud's session-open webhook call.
#[derive(Deserialize, ToSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    #[schema(example = "sess-1f2e3d")]
    pub session_id: String,
    #[schema(example = "user@example.com")]
    pub user_id: String,
}

/// Body of the settings-update notification.
#[derive(Deserialize, ToSchema, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SettingsNotifyPayload {
    #[schema(example = "user@example.com")]
    pub user_id_for_settings: String,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct StatusResponse {
    #[schema(example = "connecting")]
    pub status: String,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct RefreshResponse {
    #[schema(example = "settings updated")]
    pub status: String,
    pub sessions_refreshed: usize,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct HealthResponse {
    #[schema(example = "healthy")]
    pub status: String,
    #[schema(example = "com.lenslet.teleprompter")]
    pub app: String,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct ErrorResponse {
    pub message: String,
}
