use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Client configuration for the evaluations backend
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    /// Base URL of the backend serving the evaluations API
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Timeout applied to every plain HTTP request, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Maximum silent gap between channel events while a run is tracked
    #[serde(default = "default_event_timeout")]
    pub event_timeout_secs: u64,
    /// Path of the event-stream endpoint, relative to `base_url`
    #[serde(default = "default_events_path")]
    pub events_path: String,
}

fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_event_timeout() -> u64 {
    600
}

fn default_events_path() -> String {
    "/api/evaluations/events".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
            event_timeout_secs: default_event_timeout(),
            events_path: default_events_path(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
    }

    /// Load from a file when one is given, otherwise fall back to defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }
}
