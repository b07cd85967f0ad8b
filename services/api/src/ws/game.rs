//! Tic-tac-toe session driver.
//!
//! Owns the render plan for one socket: a queue of [`Step`]s produced by
//! the shared [`GameSession`]. The loop pops steps, pushes text walls to
//! the glasses, and sleeps the declared hold between renders; an `AiMove`
//! step asks the controller for the follow-up steps when the driver
//! reaches it, so the AI's "thinking" pause is just a hold in the plan.
//! Replacing the queue cancels everything still pending.

use std::collections::VecDeque;
use std::time::Duration;

use anyhow::Result;
use futures_util::StreamExt;
use lenslet_core::game::Step;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};
use tokio_tungstenite::tungstenite::Message;

use crate::registry::{Control, SharedGame};
use crate::settings;
use crate::state::AppState;
use crate::ws::protocol::{
    AppMessage, CloudMessage, GAME_DISPLAY_DURATION_MS, StreamEvent, Subscription,
};
use crate::ws::session::{self, WsSink, WsStream};

/// Pause between the settings-updated notice and the fresh board.
const RESTART_HOLD_MS: u64 = 1_500;

pub async fn run(
    state: &AppState,
    session_id: &str,
    user_id: &str,
    mut control_rx: mpsc::Receiver<Control>,
    mut sink: WsSink,
    mut stream: WsStream,
) -> Result<()> {
    // ThreadRng is not Send, so the task keeps its own seeded generator.
    let mut rng = StdRng::from_os_rng();
    let mut game: Option<SharedGame> = None;
    let mut queue: VecDeque<Step> = VecDeque::new();
    let mut next_step_at: Option<Instant> = None;

    loop {
        let deadline = next_step_at;
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
                        session::send(&mut sink, &AppMessage::SubscriptionUpdate {
                            package_name: state.config.package_name.clone(),
                            session_id: session_id.to_string(),
                            subscriptions: vec![Subscription::Transcription],
                        }).await?;

                        let loaded =
                            settings::load_game_settings(state.settings.as_ref(), user_id).await;
                        let shared = state.registry.get_or_create_game(
                            user_id,
                            loaded.difficulty,
                            &mut rng,
                        );
                        let opening = {
                            let mut controller = shared.lock().await;
                            controller.set_difficulty(loaded.difficulty);
                            controller.opening()
                        };
                        game = Some(shared);
                        replace_queue(&mut queue, opening);
                        next_step_at = pump(
                            &mut sink, state, session_id,
                            game.as_ref(), &mut queue, &mut rng,
                        ).await?;
                    }
                    CloudMessage::DataStream {
                        data: StreamEvent::Transcription { text, is_final, .. },
                    } if is_final => {
                        let Some(shared) = &game else { continue };
                        let plan = shared.lock().await.handle_transcript(&text, &mut rng);
                        if plan.is_empty() {
                            continue;
                        }
                        // A recognized command supersedes whatever was
                        // still scheduled.
                        replace_queue(&mut queue, plan);
                        next_step_at = pump(
                            &mut sink, state, session_id,
                            game.as_ref(), &mut queue, &mut rng,
                        ).await?;
                    }
                    CloudMessage::DataStream { .. } | CloudMessage::Unknown => {}
                }
            }
            control = control_rx.recv() => {
                match control {
                    Some(Control::Refresh) => {
                        let Some(shared) = &game else { continue };
                        let loaded =
                            settings::load_game_settings(state.settings.as_ref(), user_id).await;
                        let restart = {
                            let mut controller = shared.lock().await;
                            controller.set_difficulty(loaded.difficulty);
                            controller.reset(&mut rng)
                        };
                        tracing::info!(%session_id, difficulty = ?loaded.difficulty,
                            "settings refreshed, restarting game");
                        let mut plan = vec![Step::Render {
                            text: "Settings updated. Starting a new game...".to_string(),
                            hold_ms: RESTART_HOLD_MS,
                        }];
                        plan.extend(restart);
                        replace_queue(&mut queue, plan);
                        next_step_at = pump(
                            &mut sink, state, session_id,
                            game.as_ref(), &mut queue, &mut rng,
                        ).await?;
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
                next_step_at = pump(
                    &mut sink, state, session_id,
                    game.as_ref(), &mut queue, &mut rng,
                ).await?;
            }
        }
    }
    Ok(())
}

/// Replaces the pending plan with `plan`. An `AiMove` that was still
/// queued is carried over to the back when the new plan lacks one:
/// advisories arriving during the AI's hold must not cancel its turn.
/// A carried-over step that turns out to be stale (a reset handed the
/// turn to the user) fizzles inside `ai_turn`.
fn replace_queue(queue: &mut VecDeque<Step>, plan: Vec<Step>) {
    let had_ai_move = queue.contains(&Step::AiMove);
    queue.clear();
    queue.extend(plan);
    if had_ai_move && !queue.contains(&Step::AiMove) {
        queue.push_back(Step::AiMove);
    }
}

/// Drives the plan until it runs dry or hits a hold with more work
/// behind it, returning the instant the driver should wake back up.
async fn pump(
    sink: &mut WsSink,
    state: &AppState,
    session_id: &str,
    game: Option<&SharedGame>,
    queue: &mut VecDeque<Step>,
    rng: &mut StdRng,
) -> Result<Option<Instant>> {
    while let Some(step) = queue.pop_front() {
        match step {
            Step::Render { text, hold_ms } => {
                session::send_display(sink, state, session_id, text, GAME_DISPLAY_DURATION_MS)
                    .await?;
                if hold_ms > 0 && !queue.is_empty() {
                    return Ok(Some(Instant::now() + Duration::from_millis(hold_ms)));
                }
            }
            Step::AiMove => {
                let Some(shared) = game else { continue };
                let follow = shared.lock().await.ai_turn(rng);
                // The controller returns an empty plan when this step
                // went stale; otherwise its steps run next.
                for step in follow.into_iter().rev() {
                    queue.push_front(step);
                }
            }
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lenslet_core::board::Mark;
    use lenslet_core::game::GameSession;
    use lenslet_core::search::Difficulty;

    fn rng() -> StdRng {
        use rand::SeedableRng;
        StdRng::seed_from_u64(42)
    }

    /// Drains the queue the way `pump` does, without the socket: renders
    /// are discarded, `AiMove` calls back into the controller.
    fn drain(queue: &mut VecDeque<Step>, session: &mut GameSession, rng: &mut StdRng) {
        while let Some(step) = queue.pop_front() {
            if step == Step::AiMove {
                for follow in session.ai_turn(rng).into_iter().rev() {
                    queue.push_front(follow);
                }
            }
        }
    }

    #[test]
    fn advisory_during_the_ai_hold_keeps_the_pending_ai_move() {
        let mut session = GameSession::with_marks(Mark::X, Difficulty::Impossible);
        let mut r = rng();
        let mut queue: VecDeque<Step> = VecDeque::new();

        replace_queue(&mut queue, session.handle_transcript("5", &mut r));
        assert!(queue.contains(&Step::AiMove));

        // A second digit lands during the 1.5 s hold. It is not the
        // user's turn, so the plan is only an advisory; the scheduled
        // AI move must survive the replacement.
        let plan = session.handle_transcript("3", &mut r);
        assert!(!plan.is_empty());
        assert!(!plan.contains(&Step::AiMove));
        replace_queue(&mut queue, plan);
        assert!(queue.contains(&Step::AiMove));

        drain(&mut queue, &mut session, &mut r);
        // The AI got its turn back and handed play to the user.
        assert_eq!(session.current_turn(), session.user_mark());
        assert_eq!(session.board().empty_cells().count(), 7);
    }

    #[test]
    fn early_transcript_does_not_cancel_the_forced_opening_move() {
        // The AI holds X, so the opening plan ends in its forced move.
        let mut session = GameSession::with_marks(Mark::O, Difficulty::Impossible);
        let mut r = rng();
        let mut queue: VecDeque<Step> = VecDeque::new();
        replace_queue(&mut queue, session.opening());
        assert!(queue.contains(&Step::AiMove));

        // The user speaks before the AI has played.
        replace_queue(&mut queue, session.handle_transcript("7", &mut r));
        assert!(queue.contains(&Step::AiMove));

        drain(&mut queue, &mut session, &mut r);
        assert_eq!(session.current_turn(), session.user_mark());
        assert_eq!(session.board().empty_cells().count(), 8);
    }

    #[test]
    fn carried_over_ai_move_fizzles_after_a_reset_to_the_users_turn() {
        let mut session = GameSession::with_marks(Mark::X, Difficulty::Impossible);
        let mut r = rng();
        let mut queue: VecDeque<Step> = VecDeque::new();
        replace_queue(&mut queue, session.handle_transcript("5", &mut r));

        // Reset until the fresh game opens on the user's turn; the
        // reset plan then carries no AiMove, but the old one is kept.
        let plan = loop {
            let plan = session.handle_transcript("new game", &mut r);
            if session.current_turn() == session.user_mark() {
                break plan;
            }
        };
        replace_queue(&mut queue, plan);
        assert!(queue.contains(&Step::AiMove));

        drain(&mut queue, &mut session, &mut r);
        // The stale step was a no-op: board untouched, still user's turn.
        assert_eq!(session.board().empty_cells().count(), 9);
        assert_eq!(session.current_turn(), session.user_mark());
    }
}
