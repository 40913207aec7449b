//! Client-agnostic torrent interfaces and DTOs.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

mod error;

pub use error::{TorrentError, TorrentResult};

/// Immutable snapshot of a single file inside a torrent, taken at processing
/// time. Identity is the pair of download directory and relative name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadFile {
    /// The torrent client's storage root for the owning torrent.
    pub download_dir: PathBuf,
    /// Path of the file relative to `download_dir`.
    pub relative_name: PathBuf,
    /// File size reported by the client.
    pub size_bytes: u64,
}

impl DownloadFile {
    /// Absolute location of the file on the local filesystem.
    #[must_use]
    pub fn absolute_path(&self) -> PathBuf {
        self.download_dir.join(&self.relative_name)
    }
}

/// Point-in-time view of a torrent as reported by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TorrentSnapshot {
    /// Client-assigned torrent identifier.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Storage root for this torrent's files.
    pub download_dir: PathBuf,
    /// Download progress in percent (0–100).
    pub percent_done: f64,
    /// Bytes still to download, as reported by the client.
    pub left_until_done: u64,
    /// Files belonging to the torrent, in client order.
    pub files: Vec<DownloadFile>,
}

impl TorrentSnapshot {
    /// Whether the torrent is eligible for file mapping.
    #[must_use]
    pub fn is_ready_to_map(&self) -> bool {
        self.percent_done >= 100.0
    }

    /// Whether the torrent is eligible for removal from the client.
    ///
    /// Evaluated independently of [`Self::is_ready_to_map`]; the two may
    /// diverge and the orchestrator reconciles them.
    #[must_use]
    pub const fn is_ready_to_remove(&self) -> bool {
        self.left_until_done == 0
    }

    /// The download directory as a borrowed path.
    #[must_use]
    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }
}

/// Boundary to the torrent client consumed by the orchestrator.
#[async_trait]
pub trait TorrentClient: Send + Sync {
    /// List all torrents known to the client, including their file lists.
    async fn list_torrents(&self) -> TorrentResult<Vec<TorrentSnapshot>>;

    /// Remove a torrent from the client without touching local data.
    async fn remove_torrent(&self, id: i64) -> TorrentResult<()>;
}
