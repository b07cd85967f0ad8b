//! Lenslet API Library Crate
//!
//! This library contains all the logic for the glasses display service:
//! configuration, the session registry, the settings client, the cloud
//! WebSocket drivers, HTTP handlers, and routing. The `api` binary is a
//! thin wrapper around this library.

pub mod config;
pub mod handlers;
pub mod models;
pub mod registry;
pub mod router;
pub mod settings;
pub mod state;
pub mod ws;
