//! Test fixtures for download trees and torrent snapshots.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;

use havenpost_torrent_core::{DownloadFile, TorrentSnapshot};

/// Create `path` (and its parents) with the given contents.
///
/// # Errors
///
/// Returns an error when the directories or the file cannot be created.
pub fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    File::create(path)?.write_all(contents)?;
    Ok(())
}

/// Create an empty file at `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns an error when the directories or the file cannot be created.
pub fn touch(path: &Path) -> Result<()> {
    write_file(path, b"")
}

/// Build a [`DownloadFile`] rooted at `download_dir`.
#[must_use]
pub fn download_file(download_dir: &Path, name: &str, size_bytes: u64) -> DownloadFile {
    DownloadFile {
        download_dir: download_dir.to_path_buf(),
        relative_name: PathBuf::from(name),
        size_bytes,
    }
}

/// Build a completed-and-removable torrent snapshot over `files`.
#[must_use]
pub fn completed_torrent(id: i64, name: &str, files: Vec<DownloadFile>) -> TorrentSnapshot {
    let download_dir = files
        .first()
        .map_or_else(|| PathBuf::from("/downloads"), |f| f.download_dir.clone());
    TorrentSnapshot {
        id,
        name: name.to_string(),
        download_dir,
        percent_done: 100.0,
        left_until_done: 0,
        files,
    }
}

/// Build an in-progress torrent snapshot that is neither mappable nor
/// removable.
#[must_use]
pub fn incomplete_torrent(id: i64, name: &str, files: Vec<DownloadFile>) -> TorrentSnapshot {
    let mut snapshot = completed_torrent(id, name, files);
    snapshot.percent_done = 50.0;
    snapshot.left_until_done = 1_000;
    snapshot
}

/// Materialise each snapshot file on disk so transfer and pruning have real
/// sources to work with.
///
/// # Errors
///
/// Returns an error when any file cannot be created.
pub fn materialise(snapshot: &TorrentSnapshot) -> Result<()> {
    for file in &snapshot.files {
        let path = file.absolute_path();
        write_file(&path, &vec![0u8; usize::try_from(file.size_bytes)?])?;
    }
    Ok(())
}
