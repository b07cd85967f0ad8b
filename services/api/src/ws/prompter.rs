//! Teleprompter session driver.
//!
//! A single timer wakes the loop for whatever is scheduled next: the
//! delayed first frame after connect, or the next scroll tick. Refresh
//! requests cancel the pending wake before scheduling the restart, so a
//! settings change never races a tick from the old configuration.

use std::time::Duration;

use anyhow::Result;
use futures_util::StreamExt;
use lenslet_core::prompter::{DEFAULT_SCROLL_INTERVAL_MS, Prompter};
use lenslet_core::scroll::ScrollConfig;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};
use tokio_tungstenite::tungstenite::Message;

use crate::registry::{Control, SharedPrompter};
use crate::settings::{self, PrompterSettings};
use crate::state::AppState;
use crate::ws::protocol::{AppMessage, CloudMessage, PROMPTER_DISPLAY_DURATION_MS};
use crate::ws::session::{self, WsSink, WsStream};

/// Delay between the connection ack and the first frame, so the display
/// is not fighting the cloud's own connect-time UI.
const STARTUP_DELAY_MS: u64 = 1_000;
/// Pause between the settings-updated notice and the restarted scroll.
const RESTART_DELAY_MS: u64 = 1_500;

/// What the next timer wake should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    /// Rewind to the top and begin ticking.
    Start,
    /// Advance one interval and re-render.
    Tick,
}

pub async fn run(
    state: &AppState,
    session_id: &str,
    user_id: &str,
    mut control_rx: mpsc::Receiver<Control>,
    mut sink: WsSink,
    mut stream: WsStream,
) -> Result<()> {
    let mut prompter: Option<SharedPrompter> = None;
    let mut wake: Option<(Instant, Pending)> = None;

    loop {
        let deadline = wake.map(|(at, _)| at);
        tokio::select! {
            message = stream.next() => {
                let Some(message) = message else {
                    tracing::info!(%session_id, "cloud closed the connection");
                    break;
                };
                let Message::Text(text) = message? else {
                    continue;
                };
                let cloud: CloudMessage = match serde_json::from_str(&text) {
                    Ok(cloud) => cloud,
                    Err(error) => {
                        tracing::warn!(%session_id, ?error, "undecodable cloud message");
                        continue;
                    }
                };
                match cloud {
                    CloudMessage::ConnectionAck => {
                        tracing::info!(%session_id, "connection acknowledged");
                        // The prompter consumes no streams, but the cloud
                        // still expects the subscription handshake.
                        session::send(&mut sink, &AppMessage::SubscriptionUpdate {
                            package_name: state.config.package_name.clone(),
                            session_id: session_id.to_string(),
                            subscriptions: Vec::new(),
                        }).await?;

                        let loaded = settings::load_prompter_settings(
                            state.settings.as_ref(), user_id,
                        ).await;
                        let shared = state.registry.get_or_create_prompter(user_id, || {
                            build_prompter(&loaded, session::now_ms())
                        });
                        apply_settings(&shared, &loaded).await;
                        prompter = Some(shared);
                        wake = Some((
                            Instant::now() + Duration::from_millis(STARTUP_DELAY_MS),
                            Pending::Start,
                        ));
                    }
                    CloudMessage::DataStream { .. } | CloudMessage::Unknown => {}
                }
            }
            control = control_rx.recv() => {
                match control {
                    Some(Control::Refresh) => {
                        let Some(shared) = &prompter else { continue };
                        // Cancel the pending wake before rescheduling.
                        wake = None;
                        let loaded = settings::load_prompter_settings(
                            state.settings.as_ref(), user_id,
                        ).await;
                        apply_settings(shared, &loaded).await;
                        tracing::info!(%session_id, wpm = loaded.scroll_wpm,
                            "settings refreshed, restarting teleprompter");
                        session::send_display(
                            &mut sink, state, session_id,
                            "Settings updated. Restarting...".to_string(),
                            PROMPTER_DISPLAY_DURATION_MS,
                        ).await?;
                        wake = Some((
                            Instant::now() + Duration::from_millis(RESTART_DELAY_MS),
                            Pending::Start,
                        ));
                    }
                    Some(Control::Shutdown) | None => {
                        tracing::info!(%session_id, "session shutting down");
                        break;
                    }
                }
            }
            _ = async move {
                match deadline {
                    Some(at) => sleep_until(at).await,
                    None => std::future::pending().await,
                }
            } => {
                let Some((_, pending)) = wake.take() else { continue };
                let Some(shared) = &prompter else { continue };
                let now = session::now_ms();
                let (frame, interval_ms) = {
                    let mut controller = shared.lock().await;
                    let frame = match pending {
                        Pending::Start => {
                            controller.reset(now);
                            controller.frame(now)
                        }
                        Pending::Tick => controller.tick(now),
                    };
                    (frame, controller.refresh_interval_ms())
                };
                session::send_display(
                    &mut sink, state, session_id,
                    frame, PROMPTER_DISPLAY_DURATION_MS,
                ).await?;
                wake = Some((
                    Instant::now() + Duration::from_millis(interval_ms),
                    Pending::Tick,
                ));
            }
        }
    }
    Ok(())
}

fn build_prompter(loaded: &PrompterSettings, now_ms: u64) -> Prompter {
    let config = ScrollConfig::new(
        loaded.scroll_wpm,
        DEFAULT_SCROLL_INTERVAL_MS,
        loaded.number_of_lines,
    );
    Prompter::new(&loaded.custom_text, loaded.line_width, config, now_ms)
}

/// Applies settings in place. Geometry changes rewrap and rewind; the
/// text is replaced last so it is wrapped at the final width.
async fn apply_settings(shared: &SharedPrompter, loaded: &PrompterSettings) {
    let mut controller = shared.lock().await;
    controller.set_line_width(loaded.line_width);
    controller.set_visible_lines(loaded.number_of_lines);
    controller.set_wpm(loaded.scroll_wpm);
    controller.set_text(&loaded.custom_text);
}
