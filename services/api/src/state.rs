//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds all shared,
//! clonable resources: the session registry, the settings client, and
//! the loaded configuration.

use crate::config::Config;
use crate::registry::SessionRegistry;
use crate::settings::SettingsClient;
use std::sync::Arc;

/// The shared application state, created once at startup and passed to
/// all handlers and session tasks.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: Arc<SessionRegistry>,
    pub settings: Arc<dyn SettingsClient>,
}
