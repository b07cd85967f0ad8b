//! Session lifecycle: dials the cloud, authenticates, and hands the
//! socket to the driver for whichever app this instance runs. Whatever
//! way the session ends, the registry entry is closed on the way out.

use anyhow::{Context, Result};
use chrono::Utc;
use futures_util::StreamExt;
use futures_util::stream::{SplitSink, SplitStream};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::config::AppKind;
use crate::registry::{Control, Generation};
use crate::state::AppState;
use crate::ws::protocol::{AppMessage, Layout, ViewType};
use crate::ws::{game, prompter};

pub type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
pub type WsStream = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Top-level task for one session. Logs errors instead of propagating
/// them because nobody awaits this task, and always deregisters the
/// session when the loop ends. The registration generation makes the
/// deregistration a no-op when a reconnect has already replaced this
/// task's handle.
pub async fn run_session(
    state: AppState,
    session_id: String,
    user_id: String,
    generation: Generation,
    control_rx: mpsc::Receiver<Control>,
) {
    if let Err(error) = run(&state, &session_id, &user_id, control_rx).await {
        tracing::error!(%session_id, %user_id, ?error, "session ended with error");
    }
    state.registry.close(&session_id, generation);
}

async fn run(
    state: &AppState,
    session_id: &str,
    user_id: &str,
    control_rx: mpsc::Receiver<Control>,
) -> Result<()> {
    let url = state.config.cloud_ws_url();
    let (socket, _) = connect_async(&url)
        .await
        .with_context(|| format!("failed to connect to {url}"))?;
    let (mut sink, stream) = socket.split();

    send(
        &mut sink,
        &AppMessage::ConnectionInit {
            session_id: session_id.to_string(),
            package_name: state.config.package_name.clone(),
            api_key: state.config.api_key.clone(),
        },
    )
    .await?;

    match state.config.app {
        AppKind::TicTacToe => {
            game::run(state, session_id, user_id, control_rx, sink, stream).await
        }
        AppKind::Teleprompter => {
            prompter::run(state, session_id, user_id, control_rx, sink, stream).await
        }
    }
}

pub(crate) async fn send(sink: &mut WsSink, message: &AppMessage) -> Result<()> {
    use futures_util::SinkExt;
    let json = serde_json::to_string(message).context("failed to encode outbound message")?;
    sink.send(Message::text(json))
        .await
        .context("websocket send failed")?;
    Ok(())
}

/// Pushes a text wall to the glasses. `force_display` is always set so
/// our frames preempt whatever else is on screen.
pub(crate) async fn send_display(
    sink: &mut WsSink,
    state: &AppState,
    session_id: &str,
    text: String,
    duration_ms: u64,
) -> Result<()> {
    send(
        sink,
        &AppMessage::DisplayRequest {
            package_name: state.config.package_name.clone(),
            session_id: session_id.to_string(),
            view: ViewType::Main,
            layout: Layout::TextWall { text },
            timestamp: Utc::now(),
            duration_ms,
            force_display: true,
        },
    )
    .await
}

/// Wall-clock milliseconds. Controllers are shared across sessions, so
/// their timestamps must come from a clock every session agrees on.
pub(crate) fn now_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}
