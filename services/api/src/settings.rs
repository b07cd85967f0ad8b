//! User Settings Client
//!
//! Each app's per-user settings live in the cloud's configuration service
//! as a flat key/value list. The client is a trait so session code can be
//! tested against a mock; the HTTP implementation authenticates with the
//! user id, which is how the cloud scopes the lookup. Fetch failures are
//! never fatal: callers fall back to the defaults and keep the session
//! alive.

use anyhow::{Context, Result};
use async_trait::async_trait;
use lenslet_core::{prompter, search::Difficulty};
use serde::Deserialize;

/// One key/value entry from the configuration service. Values arrive as
/// free-form JSON; numeric settings show up both as numbers and as
/// quoted strings depending on the client that wrote them.
#[derive(Debug, Clone, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: serde_json::Value,
}

impl Setting {
    fn as_str(&self) -> Option<&str> {
        self.value.as_str()
    }

    fn as_u64(&self) -> Option<u64> {
        self.value
            .as_u64()
            .or_else(|| self.value.as_str().and_then(|s| s.trim().parse().ok()))
    }
}

/// Defines the contract for fetching a user's settings for this app.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SettingsClient: Send + Sync {
    async fn fetch(&self, user_id: &str) -> Result<Vec<Setting>>;
}

/// Fetches settings from the cloud configuration service over HTTP.
pub struct HttpSettingsClient {
    http: reqwest::Client,
    cloud_host: String,
    package_name: String,
}

impl HttpSettingsClient {
    pub fn new(cloud_host: String, package_name: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            cloud_host,
            package_name,
        }
    }
}

#[derive(Deserialize)]
struct SettingsEnvelope {
    settings: Vec<Setting>,
}

#[async_trait]
impl SettingsClient for HttpSettingsClient {
    async fn fetch(&self, user_id: &str) -> Result<Vec<Setting>> {
        let url = format!(
            "http://{}/appsettings/user/{}",
            self.cloud_host, self.package_name
        );
        let response = self
            .http
            .get(&url)
            .bearer_auth(user_id)
            .send()
            .await
            .context("settings request failed")?
            .error_for_status()
            .context("settings request rejected")?;
        let envelope: SettingsEnvelope = response
            .json()
            .await
            .context("malformed settings payload")?;
        Ok(envelope.settings)
    }
}

/// Settings the game app cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GameSettings {
    pub difficulty: Difficulty,
}

impl GameSettings {
    pub fn from_settings(settings: &[Setting]) -> Self {
        let difficulty = find(settings, "difficulty")
            .and_then(Setting::as_str)
            .map(Difficulty::parse)
            .unwrap_or_default();
        Self { difficulty }
    }
}

/// Settings the teleprompter app cares about. Out-of-range numbers are
/// clamped rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrompterSettings {
    pub line_width: usize,
    pub number_of_lines: usize,
    pub scroll_wpm: u32,
    pub custom_text: String,
}

impl Default for PrompterSettings {
    fn default() -> Self {
        Self {
            line_width: prompter::DEFAULT_LINE_WIDTH,
            number_of_lines: prompter::DEFAULT_VISIBLE_LINES,
            scroll_wpm: prompter::DEFAULT_SCROLL_WPM,
            custom_text: String::new(),
        }
    }
}

impl PrompterSettings {
    pub fn from_settings(settings: &[Setting]) -> Self {
        let defaults = Self::default();
        let line_width = find(settings, "line_width")
            .and_then(Setting::as_u64)
            .map(|w| (w as usize).clamp(20, 60))
            .unwrap_or(defaults.line_width);
        let number_of_lines = find(settings, "number_of_lines")
            .and_then(Setting::as_u64)
            .map(|n| (n as usize).clamp(1, 8))
            .unwrap_or(defaults.number_of_lines);
        let scroll_wpm = find(settings, "scroll_speed")
            .and_then(Setting::as_u64)
            .map(|w| w as u32)
            .unwrap_or(defaults.scroll_wpm);
        let custom_text = find(settings, "custom_text")
            .and_then(Setting::as_str)
            .unwrap_or_default()
            .to_string();
        Self {
            line_width,
            number_of_lines,
            scroll_wpm,
            custom_text,
        }
    }
}

fn find<'a>(settings: &'a [Setting], key: &str) -> Option<&'a Setting> {
    settings.iter().find(|s| s.key == key)
}

/// Fetches the game settings for a user, falling back to defaults when
/// the configuration service is unreachable or returns garbage.
pub async fn load_game_settings(client: &dyn SettingsClient, user_id: &str) -> GameSettings {
    match client.fetch(user_id).await {
        Ok(settings) => GameSettings::from_settings(&settings),
        Err(error) => {
            tracing::warn!(%user_id, ?error, "settings fetch failed, using defaults");
            GameSettings::default()
        }
    }
}

/// Teleprompter counterpart of [`load_game_settings`].
pub async fn load_prompter_settings(client: &dyn SettingsClient, user_id: &str) -> PrompterSettings {
    match client.fetch(user_id).await {
        Ok(settings) => PrompterSettings::from_settings(&settings),
        Err(error) => {
            tracing::warn!(%user_id, ?error, "settings fetch failed, using defaults");
            PrompterSettings::default()
        }
    }
}
