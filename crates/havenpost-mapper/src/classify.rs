//! Extension-based file classification.

/// Extensions recognised as video containers.
const VIDEO_EXTENSIONS: [&str; 3] = ["avi", "mkv", "mp4"];

/// Extensions recognised as subtitle files.
const SUBTITLE_EXTENSIONS: [&str; 7] = ["sub", "idx", "srt", "smi", "ssa", "ass", "vtt"];

/// Coarse classification of a file by its name alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// A video container.
    Video,
    /// A subtitle file.
    Subtitle,
    /// Anything else.
    Other,
}

/// The substring after the last `.` in `name`.
///
/// A name without a dot yields the whole name, so a file called `video` has
/// extension `video`. That file classifies as [`FileKind::Other`], which is
/// the intended degradation for malformed names.
#[must_use]
pub fn extension(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// Classify a file name as video, subtitle, or other.
///
/// Matching is case-sensitive against the lowercase extension lists; no
/// normalisation is performed beyond taking the substring after the last dot.
#[must_use]
pub fn classify(name: &str) -> FileKind {
    let ext = extension(name);
    if VIDEO_EXTENSIONS.contains(&ext) {
        FileKind::Video
    } else if SUBTITLE_EXTENSIONS.contains(&ext) {
        FileKind::Subtitle
    } else {
        FileKind::Other
    }
}
