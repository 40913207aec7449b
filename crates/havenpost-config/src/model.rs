//! Typed configuration models.
//!
//! # Design
//! - Pure data carriers used by the loader and the application bootstrap.
//! - Keeps domain types separate from IO/wiring code in `lib.rs`.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level settings document for the daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Torrent-client connection settings.
    pub transmission: TransmissionSettings,
    /// Media-library destination settings.
    pub library: LibrarySettings,
    /// Optional wake-device call issued after a successful run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wake: Option<WakeSettings>,
    /// Seconds between poll-loop runs.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Settings {
    /// Poll interval as a [`Duration`].
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// Connection settings for the Transmission RPC endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransmissionSettings {
    /// RPC endpoint, e.g. `http://localhost:9091/transmission/rpc`.
    pub url: String,
    /// Optional basic-auth username.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Optional basic-auth password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Destination layout for mapped files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibrarySettings {
    /// Root the mapper prefixes onto every destination.
    pub destination_root: PathBuf,
}

/// Home-automation switch to wake once a run has mapped at least one torrent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WakeSettings {
    /// Base URL of the automation endpoint, e.g. `http://htpc.local:8123`.
    pub base_url: String,
    /// Switch entity name, without the `switch.` prefix.
    pub entity: String,
    /// Bearer token for the automation API.
    pub token: String,
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level string (e.g., `info`, `debug`).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Optional output format (`json` or `pretty`); inferred when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: None,
        }
    }
}

const fn default_poll_interval_secs() -> u64 {
    300
}

fn default_log_level() -> String {
    "info".to_string()
}
