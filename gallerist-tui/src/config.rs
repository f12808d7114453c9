use gallerist_core::http::DEFAULT_BASE_URL;
use gallerist_core::{ClientConfig, RetryConfig, PAGE_CAPACITY};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub api: Api,
    #[serde(default)]
    pub tui: Tui,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Api {
    pub base_url: String,
    /// Whole-request timeout in milliseconds
    pub timeout_ms: u64,
    pub connect_timeout_ms: u64,
    /// Extra attempts for a failed page (transport errors, 5xx, 429)
    pub retries: usize,
    /// First retry delay; doubles per attempt
    pub backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for Api {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: 15_000,
            connect_timeout_ms: 5_000,
            retries: 1,
            backoff_ms: 250,
            max_backoff_ms: 2_000,
        }
    }
}

impl Api {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url.clone(),
            timeout: Duration::from_millis(self.timeout_ms),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            retry: RetryConfig::new(self.retries, self.backoff_ms, self.max_backoff_ms),
            page_capacity: PAGE_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tui {
    /// Event poll interval in milliseconds (default: 100)
    pub tick_ms: u64,
    /// Whether to use the alternate screen
    pub alt_screen: bool,
}

impl Default for Tui {
    fn default() -> Self {
        Self {
            tick_ms: 100,
            alt_screen: true,
        }
    }
}

pub fn config_dir() -> PathBuf {
    if let Some(bd) = directories::BaseDirs::new() {
        bd.config_dir().join("gallerist")
    } else {
        PathBuf::from("./.config/gallerist")
    }
}

pub fn state_dir() -> PathBuf {
    // Prefer XDG state dir when available; fall back to config dir
    if let Some(bd) = directories::BaseDirs::new() {
        if let Some(sd) = bd.state_dir() {
            return sd.join("gallerist");
        }
    }
    config_dir()
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.toml")
}

pub fn load_settings(path: Option<&Path>) -> Settings {
    let path = path.map(Path::to_path_buf).unwrap_or_else(settings_path);
    match std::fs::read_to_string(&path) {
        Ok(s) => parse_settings(&s).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "ignoring invalid settings file");
            Settings::default()
        }),
        Err(_) => Settings::default(),
    }
}

pub fn parse_settings(s: &str) -> Result<Settings, toml::de::Error> {
    toml::from_str(s)
}
