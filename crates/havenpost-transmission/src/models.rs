//! Wire models for the Transmission RPC protocol.

use std::path::PathBuf;

use serde::Deserialize;

use havenpost_torrent_core::{DownloadFile, TorrentSnapshot};

/// Fields requested from `torrent-get`.
pub(crate) const TORRENT_FIELDS: [&str; 6] = [
    "id",
    "name",
    "downloadDir",
    "percentDone",
    "leftUntilDone",
    "files",
];

/// Generic RPC envelope: `result` is `"success"` on the happy path.
#[derive(Debug, Deserialize)]
pub(crate) struct RpcResponse<T> {
    pub(crate) result: String,
    pub(crate) arguments: Option<T>,
}

/// Arguments of a `torrent-get` response.
#[derive(Debug, Deserialize)]
pub(crate) struct TorrentGetArguments {
    pub(crate) torrents: Vec<TorrentFields>,
}

/// One torrent as reported by Transmission.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TorrentFields {
    pub(crate) id: i64,
    pub(crate) name: String,
    pub(crate) download_dir: PathBuf,
    /// Fraction in `0..=1`; Transmission reports progress normalised.
    pub(crate) percent_done: f64,
    pub(crate) left_until_done: u64,
    #[serde(default)]
    pub(crate) files: Vec<FileFields>,
}

/// One file entry within a torrent.
#[derive(Debug, Deserialize)]
pub(crate) struct FileFields {
    pub(crate) name: PathBuf,
    pub(crate) length: u64,
}

impl TorrentFields {
    /// Convert the wire representation into the client-agnostic snapshot,
    /// rescaling progress to percent.
    pub(crate) fn into_snapshot(self) -> TorrentSnapshot {
        let download_dir = self.download_dir;
        let files = self
            .files
            .into_iter()
            .map(|file| DownloadFile {
                download_dir: download_dir.clone(),
                relative_name: file.name,
                size_bytes: file.length,
            })
            .collect();
        TorrentSnapshot {
            id: self.id,
            name: self.name,
            download_dir,
            percent_done: self.percent_done * 100.0,
            left_until_done: self.left_until_done,
            files,
        }
    }
}
