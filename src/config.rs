//! Config module.
//! Manages the backend location and debounce timing.
//! Layering: built-in defaults, then an optional JSON file, then the
//! `THRESHOLD_VIEW_SERVER` env var. CLI flags are applied on top by main.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const SERVER_ENV: &str = "THRESHOLD_VIEW_SERVER";

const DEFAULT_SERVER: &str = "http://127.0.0.1:5000";
const DEFAULT_ENDPOINT: &str = "/update_threshold";
const DEFAULT_QUIET_INTERVAL_MS: u64 = 200;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the backend, e.g. `http://127.0.0.1:5000`.
    pub server_url: String,
    /// Path of the regenerate endpoint.
    pub endpoint: String,
    /// Quiet period before a request is sent.
    pub quiet_interval_ms: u64,
    /// Request timeout. `None` waits forever.
    pub request_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            quiet_interval_ms: DEFAULT_QUIET_INTERVAL_MS,
            request_timeout_secs: None,
        }
    }
}

impl Config {
    /// Defaults, overlaid with `path` if given, then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_env(std::env::var(SERVER_ENV).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    fn apply_env(&mut self, server: Option<String>) {
        if let Some(server) = server.filter(|s| !s.trim().is_empty()) {
            self.server_url = server;
        }
    }

    pub fn quiet_interval(&self) -> Duration {
        Duration::from_millis(self.quiet_interval_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Absolute URL for a server-relative path.
    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.server_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn update_url(&self) -> String {
        self.url_for(&self.endpoint)
    }
}
