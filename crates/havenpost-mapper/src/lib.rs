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

//! File-mapping and subtitle-sidecar resolution for completed downloads.
//!
//! Pure in-memory computation over a pre-fetched snapshot of file metadata:
//! no filesystem access, no error paths. The orchestrator feeds the produced
//! [`MappingRule`]s to the transfer channel.

use std::cmp::Reverse;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use havenpost_torrent_core::DownloadFile;

mod classify;
mod rank;

pub use classify::{FileKind, classify, extension};
pub use rank::{RANK_ENGLISH, RANK_ENGLISH_SDH, RANK_OTHER, rank};

/// A single copy instruction produced by the mapper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRule {
    /// Storage root of the source file's torrent.
    pub source_download_dir: PathBuf,
    /// Source path relative to `source_download_dir`.
    pub source_relative_name: PathBuf,
    /// Destination path, already prefixed with the caller's destination root.
    pub destination: PathBuf,
}

impl MappingRule {
    /// Absolute location of the source file.
    #[must_use]
    pub fn source_path(&self) -> PathBuf {
        self.source_download_dir.join(&self.source_relative_name)
    }
}

/// Map a single-video download (plus subtitles) into a media-library layout.
///
/// Deterministic total order over the output:
/// 1. the main video (largest by size, first-listed wins exact ties),
///    forwarded verbatim; omitted entirely when no file classifies as video;
/// 2. every subtitle, forwarded verbatim and unconditionally;
/// 3. sidecar rules placing subtitles next to the main video, unless one is
///    already co-located with it: a VobSub pair anywhere in the set wins over
///    ranked selection, otherwise the single best-ranked subtitle is chosen.
///
/// Every destination is prefixed with `destination_root` as a literal string
/// (no normalisation, no separator inserted); callers supply the trailing
/// separator.
#[must_use]
pub fn map_single_video_download_with_subs(
    files: &[DownloadFile],
    destination_root: &Path,
) -> Vec<MappingRule> {
    let main_video = select_main_video(files);
    let subtitles: Vec<&DownloadFile> = files
        .iter()
        .filter(|file| kind_of(file) == FileKind::Subtitle)
        .collect();

    let mut rules = Vec::new();
    if let Some(video) = main_video {
        rules.push(forward_verbatim(video));
    }
    for subtitle in &subtitles {
        rules.push(forward_verbatim(subtitle));
    }
    if let Some(video) = main_video {
        rules.extend(sidecar_rules(video, &subtitles));
    }

    for rule in &mut rules {
        rule.destination = prefix_destination(destination_root, &rule.destination);
    }
    rules
}

/// The largest video in `files`, or `None` when nothing classifies as video.
///
/// The descending size sort is stable, so the first-listed file wins exact
/// size ties.
#[must_use]
pub fn select_main_video(files: &[DownloadFile]) -> Option<&DownloadFile> {
    let mut videos: Vec<&DownloadFile> = files
        .iter()
        .filter(|file| kind_of(file) == FileKind::Video)
        .collect();
    videos.sort_by_key(|video| Reverse(video.size_bytes));
    videos.first().copied()
}

fn kind_of(file: &DownloadFile) -> FileKind {
    file.relative_name
        .to_str()
        .map_or(FileKind::Other, classify)
}

fn forward_verbatim(file: &DownloadFile) -> MappingRule {
    MappingRule {
        source_download_dir: file.download_dir.clone(),
        source_relative_name: file.relative_name.clone(),
        destination: file.relative_name.clone(),
    }
}

/// Sidecar rules for subtitles that should sit next to the main video.
fn sidecar_rules(main_video: &DownloadFile, subtitles: &[&DownloadFile]) -> Vec<MappingRule> {
    let video_dir = parent_dir(&main_video.relative_name);

    let already_colocated = subtitles
        .iter()
        .any(|subtitle| parent_dir(&subtitle.relative_name) == video_dir);
    if already_colocated {
        return Vec::new();
    }

    if has_vobsub_pair(subtitles) {
        return subtitles
            .iter()
            .filter(|subtitle| {
                let ext = extension_of(subtitle);
                ext == "idx" || ext == "sub"
            })
            .map(|subtitle| sidecar_rule(subtitle, video_dir))
            .collect();
    }

    let mut ranked: Vec<&DownloadFile> = subtitles.to_vec();
    ranked.sort_by_key(|subtitle| Reverse(rank(&subtitle.relative_name)));
    ranked
        .first()
        .map(|best| sidecar_rule(best, video_dir))
        .into_iter()
        .collect()
}

/// Whether the subtitle set contains at least one `.idx` and one `.sub` file,
/// anywhere; the two halves of the pair need not share a directory.
fn has_vobsub_pair(subtitles: &[&DownloadFile]) -> bool {
    let mut has_idx = false;
    let mut has_sub = false;
    for subtitle in subtitles {
        match extension_of(subtitle) {
            "idx" => has_idx = true,
            "sub" => has_sub = true,
            _ => {}
        }
    }
    has_idx && has_sub
}

fn sidecar_rule(subtitle: &DownloadFile, video_dir: &Path) -> MappingRule {
    let basename = subtitle
        .relative_name
        .file_name()
        .map(Path::new)
        .unwrap_or_else(|| subtitle.relative_name.as_path());
    MappingRule {
        source_download_dir: subtitle.download_dir.clone(),
        source_relative_name: subtitle.relative_name.clone(),
        destination: video_dir.join(basename),
    }
}

fn extension_of<'a>(file: &'a DownloadFile) -> &'a str {
    file.relative_name.to_str().map_or("", extension)
}

fn parent_dir(path: &Path) -> &Path {
    path.parent().unwrap_or_else(|| Path::new(""))
}

/// Literal prefix concatenation: `root` is not normalised and no separator is
/// inserted between it and `destination`.
fn prefix_destination(root: &Path, destination: &Path) -> PathBuf {
    let mut joined = OsString::from(root.as_os_str());
    joined.push(destination.as_os_str());
    PathBuf::from(joined)
}
