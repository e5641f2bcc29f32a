//! Runtime configuration shared by the console and CLI.
//!
//! Persisted as `trainerdeck.toml`. Every section and key is optional;
//! missing values fall back to the defaults below.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Canonical config file name.
pub const CONFIG_FILE_NAME: &str = "trainerdeck.toml";

/// Environment variable that overrides `[server] url`.
pub const SERVER_URL_ENV: &str = "TRAINERDECK_SERVER_URL";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DeckConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub stream: StreamSettings,
    #[serde(default)]
    pub editor: EditorSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSettings {
    #[serde(default = "default_server_url")]
    pub url: String,
    /// Timeout for command requests. The log stream has none.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            url: default_server_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ServerSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StreamSettings {
    /// Pause after a failed connection or read.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    /// Pause after the backend closes the stream cleanly.
    #[serde(default = "default_reopen_delay_ms")]
    pub reopen_delay_ms: u64,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            reconnect_delay_ms: default_reconnect_delay_ms(),
            reopen_delay_ms: default_reopen_delay_ms(),
        }
    }
}

impl StreamSettings {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn reopen_delay(&self) -> Duration {
        Duration::from_millis(self.reopen_delay_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EditorSettings {
    /// Profile used when a task does not name one.
    #[serde(default = "default_profile")]
    pub default_profile: String,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            default_profile: default_profile(),
        }
    }
}

// ── Serde default functions ─────────────────────────────────────────────

fn default_server_url() -> String {
    "http://127.0.0.1:5000".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_reconnect_delay_ms() -> u64 {
    1_000
}
fn default_reopen_delay_ms() -> u64 {
    2_000
}
fn default_profile() -> String {
    "Qwen-Image".to_string()
}

/// Apply environment overrides. `lookup` is `std::env::var` in production.
/// Returns true when any field was updated.
pub fn apply_env_overrides<F>(config: &mut DeckConfig, lookup: F) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(SERVER_URL_ENV).filter(|url| !url.trim().is_empty()) {
        Some(url) => {
            config.server.url = url.trim().to_string();
            true
        }
        None => false,
    }
}

/// Replace blank values with defaults. Returns true when any field changed.
pub fn apply_fallbacks(config: &mut DeckConfig) -> bool {
    let mut changed = false;
    if config.server.url.trim().is_empty() {
        config.server.url = default_server_url();
        changed = true;
    }
    if config.editor.default_profile.trim().is_empty() {
        config.editor.default_profile = default_profile();
        changed = true;
    }
    changed
}
