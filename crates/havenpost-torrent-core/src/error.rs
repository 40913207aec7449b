//! Error types for torrent-client operations.

use std::error::Error;

use thiserror::Error;

/// Primary error type for torrent-client operations.
#[derive(Debug, Error)]
pub enum TorrentError {
    /// Operation failed in the underlying client.
    #[error("torrent operation failed")]
    OperationFailed {
        /// Operation identifier.
        operation: &'static str,
        /// Torrent identifier when available.
        torrent_id: Option<i64>,
        /// Underlying failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// Torrent was not found.
    #[error("torrent not found")]
    NotFound {
        /// Missing torrent identifier.
        torrent_id: i64,
    },
}

impl TorrentError {
    /// Wrap an arbitrary client failure with its operation identifier.
    pub fn operation_failed(
        operation: &'static str,
        torrent_id: Option<i64>,
        source: impl Error + Send + Sync + 'static,
    ) -> Self {
        Self::OperationFailed {
            operation,
            torrent_id,
            source: Box::new(source),
        }
    }
}

/// Convenience alias for torrent operation results.
pub type TorrentResult<T> = Result<T, TorrentError>;
