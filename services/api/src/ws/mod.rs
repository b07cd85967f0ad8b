//! Cloud-side WebSocket session plumbing: the wire protocol, the shared
//! session loop, and the per-app drivers.

pub mod game;
pub mod prompter;
pub mod protocol;
pub mod session;
