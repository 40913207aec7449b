//! Application-level error surface.
//!
//! # Design
//! - Wraps the typed errors of the lower crates, tagging each with the
//!   operation that failed.
//! - Display messages stay constant; context lives in structured fields.

use thiserror::Error;

use havenpost_config::ConfigError;
use havenpost_fsops::FsOpsError;
use havenpost_torrent_core::TorrentError;

/// Convenient result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Errors surfaced by the daemon's wiring and poll loop.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable was not set.
    #[error("required environment variable is not set")]
    MissingEnv {
        /// Variable name.
        name: &'static str,
    },

    /// Configuration loading or validation failed.
    #[error("configuration operation failed")]
    Config {
        /// Operation that failed.
        operation: &'static str,
        /// Underlying configuration failure.
        #[source]
        source: ConfigError,
    },

    /// Telemetry initialisation failed.
    #[error("telemetry operation failed")]
    Telemetry {
        /// Operation that failed.
        operation: &'static str,
        /// Rendered cause of the failure.
        detail: String,
    },

    /// A torrent-client call failed.
    #[error("torrent operation failed")]
    Torrent {
        /// Operation that failed.
        operation: &'static str,
        /// Underlying client failure.
        #[source]
        source: TorrentError,
    },

    /// A filesystem post-processing step failed.
    #[error("filesystem operation failed")]
    FsOps {
        /// Operation that failed.
        operation: &'static str,
        /// Underlying filesystem failure.
        #[source]
        source: FsOpsError,
    },

    /// An outbound HTTP request could not be delivered.
    #[error("http request failed")]
    Http {
        /// Operation that failed.
        operation: &'static str,
        /// Request URL.
        url: String,
        /// Underlying transport failure.
        #[source]
        source: reqwest::Error,
    },

    /// An outbound HTTP request returned a non-success status.
    #[error("http request returned an error status")]
    HttpStatus {
        /// Operation that failed.
        operation: &'static str,
        /// Request URL.
        url: String,
        /// Status code returned by the remote host.
        status: u16,
    },
}

impl AppError {
    pub(crate) const fn config(operation: &'static str, source: ConfigError) -> Self {
        Self::Config { operation, source }
    }

    pub(crate) fn telemetry(operation: &'static str, source: impl std::fmt::Display) -> Self {
        Self::Telemetry {
            operation,
            detail: source.to_string(),
        }
    }

    pub(crate) const fn torrent(operation: &'static str, source: TorrentError) -> Self {
        Self::Torrent { operation, source }
    }

    pub(crate) const fn fsops(operation: &'static str, source: FsOpsError) -> Self {
        Self::FsOps { operation, source }
    }

    pub(crate) const fn http(operation: &'static str, url: String, source: reqwest::Error) -> Self {
        Self::Http {
            operation,
            url,
            source,
        }
    }

    pub(crate) const fn http_status(operation: &'static str, url: String, status: u16) -> Self {
        Self::HttpStatus {
            operation,
            url,
            status,
        }
    }
}
