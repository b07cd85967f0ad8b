//! Session Registry
//!
//! Single authority over which sessions are live and which controller each
//! user owns. Controllers are shared: two sessions for the same user drive
//! the same `GameSession` or `Prompter`, so glasses that reconnect resume
//! mid-state instead of starting over. Session tasks register a control
//! channel here; settings updates fan out through those channels.
//!
//! The interior lock is a std `Mutex` because every critical section is a
//! map lookup or insert. Channel sends happen after the lock is released.

use lenslet_core::game::GameSession;
use lenslet_core::prompter::Prompter;
use lenslet_core::search::Difficulty;
use rand::Rng;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Out-of-band commands delivered to a running session task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Settings changed; re-fetch and re-apply them.
    Refresh,
    /// The service is shutting down; close the session cleanly.
    Shutdown,
}

pub type SharedGame = Arc<tokio::sync::Mutex<GameSession>>;
pub type SharedPrompter = Arc<tokio::sync::Mutex<Prompter>>;

/// The per-user state machine, whichever app this instance runs.
#[derive(Clone)]
enum UserController {
    Game(SharedGame),
    Prompter(SharedPrompter),
}

/// Distinguishes a session's registrations across reconnects: a task
/// holding a stale generation cannot deregister its replacement.
pub type Generation = u64;

struct SessionHandle {
    user_id: String,
    generation: Generation,
    control: mpsc::Sender<Control>,
}

#[derive(Default)]
struct Inner {
    controllers: HashMap<String, UserController>,
    sessions: HashMap<String, SessionHandle>,
    user_sessions: HashMap<String, Vec<String>>,
    next_generation: Generation,
}

/// Tracks live sessions and their per-user controllers.
#[derive(Default)]
pub struct SessionRegistry {
    inner: Mutex<Inner>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a session and hands back the receiving end of its control
    /// channel plus the registration's generation. A reconnect under the
    /// same session id replaces the old handle (closing the previous
    /// channel) and bumps the generation, so the superseded task's
    /// eventual `close` call is recognized as stale.
    pub fn open(&self, session_id: &str, user_id: &str) -> (mpsc::Receiver<Control>, Generation) {
        let (tx, rx) = mpsc::channel(8);
        let mut inner = self.lock();
        inner.next_generation += 1;
        let generation = inner.next_generation;
        inner.sessions.insert(
            session_id.to_string(),
            SessionHandle {
                user_id: user_id.to_string(),
                generation,
                control: tx,
            },
        );
        let ids = inner
            .user_sessions
            .entry(user_id.to_string())
            .or_default();
        if !ids.iter().any(|id| id == session_id) {
            ids.push(session_id.to_string());
        }
        tracing::info!(%session_id, %user_id, "session opened");
        (rx, generation)
    }

    /// Deregisters a session, provided `generation` still matches the
    /// registered handle. A task superseded by a reconnect holds an older
    /// generation and must not evict its replacement. Returns `true` when
    /// this was the user's last session and the controller was dropped.
    pub fn close(&self, session_id: &str, generation: Generation) -> bool {
        let mut inner = self.lock();
        match inner.sessions.get(session_id) {
            Some(handle) if handle.generation == generation => {}
            Some(_) => {
                tracing::info!(%session_id, "stale close ignored, session was replaced");
                return false;
            }
            None => return false,
        }
        let Some(handle) = inner.sessions.remove(session_id) else {
            return false;
        };
        let user_id = handle.user_id;
        let last = match inner.user_sessions.get_mut(&user_id) {
            Some(ids) => {
                ids.retain(|id| id != session_id);
                ids.is_empty()
            }
            None => true,
        };
        if last {
            inner.user_sessions.remove(&user_id);
            inner.controllers.remove(&user_id);
            tracing::info!(%session_id, %user_id, "last session closed, controller dropped");
        } else {
            tracing::info!(%session_id, %user_id, "session closed");
        }
        last
    }

    /// The user's game controller, created on first use.
    pub fn get_or_create_game<R: Rng + ?Sized>(
        &self,
        user_id: &str,
        difficulty: Difficulty,
        rng: &mut R,
    ) -> SharedGame {
        let mut inner = self.lock();
        match inner.controllers.get(user_id) {
            Some(UserController::Game(game)) => Arc::clone(game),
            _ => {
                let game = Arc::new(tokio::sync::Mutex::new(GameSession::new(difficulty, rng)));
                inner
                    .controllers
                    .insert(user_id.to_string(), UserController::Game(Arc::clone(&game)));
                game
            }
        }
    }

    /// The user's prompter controller, created on first use with `build`.
    pub fn get_or_create_prompter(
        &self,
        user_id: &str,
        build: impl FnOnce() -> Prompter,
    ) -> SharedPrompter {
        let mut inner = self.lock();
        match inner.controllers.get(user_id) {
            Some(UserController::Prompter(prompter)) => Arc::clone(prompter),
            _ => {
                let prompter = Arc::new(tokio::sync::Mutex::new(build()));
                inner.controllers.insert(
                    user_id.to_string(),
                    UserController::Prompter(Arc::clone(&prompter)),
                );
                prompter
            }
        }
    }

    /// Sends [`Control::Refresh`] to every live session of `user_id` and
    /// returns how many were reached. Sessions whose channel has closed
    /// are pruned along the way.
    pub async fn refresh_user(&self, user_id: &str) -> usize {
        let senders: Vec<(String, Generation, mpsc::Sender<Control>)> = {
            let inner = self.lock();
            let Some(ids) = inner.user_sessions.get(user_id) else {
                return 0;
            };
            ids.iter()
                .filter_map(|id| {
                    inner
                        .sessions
                        .get(id)
                        .map(|h| (id.clone(), h.generation, h.control.clone()))
                })
                .collect()
        };

        let mut refreshed = 0;
        let mut dead = Vec::new();
        for (session_id, generation, sender) in senders {
            if sender.send(Control::Refresh).await.is_ok() {
                refreshed += 1;
            } else {
                dead.push((session_id, generation));
            }
        }
        for (session_id, generation) in dead {
            tracing::warn!(%session_id, "pruning session with closed control channel");
            self.close(&session_id, generation);
        }
        refreshed
    }

    /// Sends [`Control::Shutdown`] to every live session.
    pub async fn shutdown_all(&self) {
        let senders: Vec<mpsc::Sender<Control>> = {
            let inner = self.lock();
            inner.sessions.values().map(|h| h.control.clone()).collect()
        };
        for sender in senders {
            let _ = sender.send(Control::Shutdown).await;
        }
    }

    pub fn session_count(&self) -> usize {
        self.lock().sessions.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // Held only for map operations; poisoning would mean a panic in
        // one of those, at which point continuing is hopeless anyway.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
