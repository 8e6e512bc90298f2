// =============================================================================
// Runtime Configuration — remote endpoints, timeouts and local bind address
// =============================================================================
//
// Loaded from `dashboard_config.json` at startup, then overridden by
// environment variables (a `.env` file is honoured). Every field carries
// `#[serde(default)]` so that adding new fields never breaks loading an
// older config file. The file is read-only to this service; overrides live
// in memory for the lifetime of the process.
// =============================================================================

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{info, warn};

use crate::types::ScrapeSource;

/// Default config file name, relative to the working directory.
pub const CONFIG_FILE: &str = "dashboard_config.json";

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_api_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_health_url() -> String {
    "http://127.0.0.1:8000/".to_string()
}

fn default_bind_addr() -> String {
    "0.0.0.0:3001".to_string()
}

fn default_health_interval_secs() -> u64 {
    30
}

fn default_health_timeout_secs() -> u64 {
    5
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_ws_push_interval_ms() -> u64 {
    500
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level configuration for the signal desk.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RuntimeConfig {
    // --- Remote API ----------------------------------------------------------

    /// Base URL of the signal / calendar API (no trailing slash needed).
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Liveness probe URL. May live on a different base than the API.
    #[serde(default = "default_health_url")]
    pub health_url: String,

    /// Per-request timeout for data calls. Generation and scraping run the
    /// whole pipeline server-side before answering, hence the generous value.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Scraper triggered when a scrape request does not name one.
    #[serde(default)]
    pub default_scrape_source: ScrapeSource,

    // --- Health monitor ------------------------------------------------------

    /// Seconds between liveness probes.
    #[serde(default = "default_health_interval_secs")]
    pub health_interval_secs: u64,

    /// Timeout of a single liveness probe.
    #[serde(default = "default_health_timeout_secs")]
    pub health_timeout_secs: u64,

    // --- Local API -----------------------------------------------------------

    /// Address the local REST / WebSocket server binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// How often the WebSocket feed checks for state changes.
    #[serde(default = "default_ws_push_interval_ms")]
    pub ws_push_interval_ms: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            health_url: default_health_url(),
            request_timeout_secs: default_request_timeout_secs(),
            default_scrape_source: ScrapeSource::default(),
            health_interval_secs: default_health_interval_secs(),
            health_timeout_secs: default_health_timeout_secs(),
            bind_addr: default_bind_addr(),
            ws_push_interval_ms: default_ws_push_interval_ms(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config from {}", path.display()))?;

        info!(
            path = %path.display(),
            api_base_url = %config.api_base_url,
            "config loaded"
        );

        Ok(config)
    }

    /// Apply `FXDESK_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup. Blank values are ignored and
    /// unparsable numbers are logged and skipped.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(url) = get("FXDESK_API_URL") {
            self.api_base_url = url;
        }
        if let Some(url) = get("FXDESK_HEALTH_URL") {
            self.health_url = url;
        }
        if let Some(addr) = get("FXDESK_BIND_ADDR") {
            self.bind_addr = addr;
        }
        if let Some(raw) = get("FXDESK_HEALTH_INTERVAL_SECS") {
            match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => self.health_interval_secs = secs,
                _ => warn!(value = %raw, "ignoring invalid FXDESK_HEALTH_INTERVAL_SECS"),
            }
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_secs(self.health_timeout_secs.max(1))
    }

    pub fn health_interval(&self) -> Duration {
        Duration::from_secs(self.health_interval_secs.max(1))
    }

    pub fn ws_push_interval(&self) -> Duration {
        Duration::from_millis(self.ws_push_interval_ms.max(50))
    }
}
