#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions, clippy::multiple_crate_versions)]

//! Settings loading and validation for the Havenpost daemon.
//!
//! Layout: `model.rs` (typed sections), `error.rs` (typed failures),
//! loader and validation here. Settings come from a JSON file whose path is
//! supplied by the caller (the binary reads `HAVENPOST_CONFIG`); secrets can
//! be overridden through environment variables so they stay out of the file.

use std::fs;
use std::path::Path;

use tracing::debug;

mod error;
mod model;

pub use error::{ConfigError, ConfigResult};
pub use model::{LibrarySettings, LoggingSettings, Settings, TransmissionSettings, WakeSettings};

/// Environment variable overriding the Transmission basic-auth username.
pub const ENV_TRANSMISSION_USERNAME: &str = "HAVENPOST_TRANSMISSION_USERNAME";
/// Environment variable overriding the Transmission basic-auth password.
pub const ENV_TRANSMISSION_PASSWORD: &str = "HAVENPOST_TRANSMISSION_PASSWORD";
/// Environment variable overriding the wake-device bearer token.
pub const ENV_WAKE_TOKEN: &str = "HAVENPOST_WAKE_TOKEN";

/// Load settings from a JSON file, apply environment overrides, and validate.
///
/// # Errors
///
/// Returns an error when the file cannot be read or parsed, or when a field
/// fails validation.
pub fn load_settings(path: &Path) -> ConfigResult<Settings> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::io("read_settings", path.to_path_buf(), source))?;
    let mut settings: Settings = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    apply_env_overrides(&mut settings);
    validate(&settings)?;
    debug!(path = %path.display(), "settings loaded");
    Ok(settings)
}

fn apply_env_overrides(settings: &mut Settings) {
    if let Ok(username) = std::env::var(ENV_TRANSMISSION_USERNAME) {
        settings.transmission.username = Some(username);
    }
    if let Ok(password) = std::env::var(ENV_TRANSMISSION_PASSWORD) {
        settings.transmission.password = Some(password);
    }
    if let (Ok(token), Some(wake)) = (std::env::var(ENV_WAKE_TOKEN), settings.wake.as_mut()) {
        wake.token = token;
    }
}

/// Validate a settings document.
///
/// # Errors
///
/// Returns an [`ConfigError::InvalidField`] describing the first offending
/// field.
pub fn validate(settings: &Settings) -> ConfigResult<()> {
    if !settings.transmission.url.starts_with("http://")
        && !settings.transmission.url.starts_with("https://")
    {
        return Err(ConfigError::invalid_field(
            "transmission",
            "url",
            Some(settings.transmission.url.clone()),
            "must be an http(s) URL",
        ));
    }
    if settings.library.destination_root.as_os_str().is_empty() {
        return Err(ConfigError::invalid_field(
            "library",
            "destination_root",
            None,
            "must not be empty",
        ));
    }
    if settings.poll_interval_secs == 0 {
        return Err(ConfigError::invalid_field(
            "poll_interval_secs",
            "poll_interval_secs",
            Some(settings.poll_interval_secs.to_string()),
            "must be positive",
        ));
    }
    if let Some(wake) = &settings.wake {
        if !wake.base_url.starts_with("http://") && !wake.base_url.starts_with("https://") {
            return Err(ConfigError::invalid_field(
                "wake",
                "base_url",
                Some(wake.base_url.clone()),
                "must be an http(s) URL",
            ));
        }
        if wake.entity.is_empty() {
            return Err(ConfigError::invalid_field(
                "wake",
                "entity",
                None,
                "must not be empty",
            ));
        }
        if wake.token.is_empty() {
            return Err(ConfigError::invalid_field(
                "wake",
                "token",
                None,
                "must not be empty",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn sample_document() -> serde_json::Value {
        serde_json::json!({
            "transmission": {
                "url": "http://localhost:9091/transmission/rpc"
            },
            "library": {
                "destination_root": "/mnt/media/movies"
            },
            "wake": {
                "base_url": "http://htpc.local:8123",
                "entity": "media_station",
                "token": "secret"
            }
        })
    }

    fn write_settings(value: &serde_json::Value) -> Result<NamedTempFile> {
        let mut file = NamedTempFile::new()?;
        file.write_all(value.to_string().as_bytes())?;
        Ok(file)
    }

    #[test]
    fn loads_and_applies_defaults() -> Result<()> {
        let file = write_settings(&sample_document())?;
        let settings = load_settings(file.path())?;

        assert_eq!(settings.poll_interval_secs, 300);
        assert_eq!(settings.logging.level, "info");
        assert_eq!(
            settings.wake.as_ref().map(|wake| wake.entity.as_str()),
            Some("media_station")
        );
        Ok(())
    }

    #[test]
    fn rejects_non_http_transmission_url() -> Result<()> {
        let mut document = sample_document();
        document["transmission"]["url"] = serde_json::json!("localhost:9091");
        let file = write_settings(&document)?;

        let error = load_settings(file.path()).expect_err("expected validation failure");
        match error {
            ConfigError::InvalidField { section, field, .. } => {
                assert_eq!(section, "transmission");
                assert_eq!(field, "url");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn rejects_zero_poll_interval() -> Result<()> {
        let mut document = sample_document();
        document["poll_interval_secs"] = serde_json::json!(0);
        let file = write_settings(&document)?;

        assert!(load_settings(file.path()).is_err());
        Ok(())
    }

    #[test]
    fn missing_file_surfaces_io_error() {
        let error = load_settings(Path::new("/nonexistent/havenpost.json"))
            .expect_err("expected io failure");
        match error {
            ConfigError::Io { operation, .. } => assert_eq!(operation, "read_settings"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
