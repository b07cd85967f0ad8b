//! Cloud WebSocket Protocol
//!
//! Message shapes for the app-side connection to the cloud display
//! transport. Outbound messages carry the session id the cloud issued in
//! its webhook; inbound messages are tagged JSON and anything we do not
//! recognize deserializes to `Unknown` instead of killing the session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How long a game board stays on the glasses without a refresh.
pub const GAME_DISPLAY_DURATION_MS: u64 = 60_000;
/// How long a teleprompter frame stays up; the tick cadence re-sends well
/// before this expires.
pub const PROMPTER_DISPLAY_DURATION_MS: u64 = 10_000;

/// Messages sent from this app to the cloud.
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppMessage {
    ConnectionInit {
        #[serde(rename = "sessionId")]
        session_id: String,
        #[serde(rename = "packageName")]
        package_name: String,
        #[serde(rename = "apiKey")]
        api_key: String,
    },
    SubscriptionUpdate {
        #[serde(rename = "packageName")]
        package_name: String,
        #[serde(rename = "sessionId")]
        session_id: String,
        subscriptions: Vec<Subscription>,
    },
    DisplayRequest {
        #[serde(rename = "packageName")]
        package_name: String,
        #[serde(rename = "sessionId")]
        session_id: String,
        view: ViewType,
        layout: Layout,
        timestamp: DateTime<Utc>,
        #[serde(rename = "durationMs")]
        duration_ms: u64,
        #[serde(rename = "forceDisplay")]
        force_display: bool,
    },
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Subscription {
    Transcription,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ViewType {
    Main,
}

/// Display layouts the glasses can render. Only the full-screen text wall
/// is used here.
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "layout_type", rename_all = "snake_case")]
pub enum Layout {
    TextWall { text: String },
}

/// Messages received from the cloud.
#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CloudMessage {
    ConnectionAck,
    DataStream { data: StreamEvent },
    #[serde(other)]
    Unknown,
}

/// Payload of a `data_stream` message, keyed by stream type.
#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "stream_type", rename_all = "snake_case")]
pub enum StreamEvent {
    Transcription {
        text: String,
        #[serde(rename = "isFinal")]
        is_final: bool,
        #[serde(default)]
        language: Option<String>,
    },
    #[serde(other)]
    Unknown,
}
