//! Filename-heuristic subtitle ranking.
//!
//! Ranking never inspects file contents; it is a pure heuristic over the
//! final path segment of the subtitle name.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

/// Preferred rank: English, not hearing-impaired.
pub const RANK_ENGLISH: u8 = 100;
/// English hearing-impaired variant, deprioritised.
pub const RANK_ENGLISH_SDH: u8 = 90;
/// Assumed non-English or unlabeled.
pub const RANK_OTHER: u8 = 80;

static ENGLISH_WORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(english|eng|en)\b").expect("english word pattern"));
static SDH_WORDS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bsdh\b").expect("sdh word pattern"));

/// Whether `haystack` starts with one of the pattern's words.
///
/// The match must begin at the start of the string: `movie.en.srt` is not
/// treated as English even though it contains the `en` word. Relaxing this
/// to a substring search changes which files existing libraries treat as
/// sidecars.
fn starts_with_word(pattern: &Regex, haystack: &str) -> bool {
    pattern.find(haystack).is_some_and(|found| found.start() == 0)
}

/// Score a subtitle filename by language/SDH heuristics.
///
/// Returns one of [`RANK_ENGLISH`], [`RANK_ENGLISH_SDH`], [`RANK_OTHER`].
#[must_use]
pub fn rank(name: &Path) -> u8 {
    let base = name
        .file_name()
        .and_then(|base| base.to_str())
        .unwrap_or_default();
    if starts_with_word(&ENGLISH_WORDS, base) {
        if starts_with_word(&SDH_WORDS, base) {
            RANK_ENGLISH_SDH
        } else {
            RANK_ENGLISH
        }
    } else {
        RANK_OTHER
    }
}
