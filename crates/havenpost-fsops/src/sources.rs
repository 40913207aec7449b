//! Deletion of local originals after a successful transfer.

use std::fs;
use std::io;
use std::path::PathBuf;

use tracing::debug;

use havenpost_mapper::MappingRule;

use crate::error::{FsOpsError, FsOpsResult};

/// Delete the distinct source files referenced by `rules`.
///
/// A file may back several rules (a subtitle is forwarded verbatim and again
/// as a sidecar), so sources are deduplicated before deletion. Files that
/// are already gone are tolerated. Returns the distinct source paths, which
/// feed the pruner regardless of whether each file still existed.
///
/// # Errors
///
/// Returns an error when a file exists but cannot be removed.
pub fn delete_source_files(rules: &[MappingRule]) -> FsOpsResult<Vec<PathBuf>> {
    let mut sources: Vec<PathBuf> = Vec::new();
    for rule in rules {
        let source = rule.source_path();
        if !sources.contains(&source) {
            sources.push(source);
        }
    }

    for source in &sources {
        match fs::remove_file(source) {
            Ok(()) => debug!(path = %source.display(), "deleted source file"),
            Err(error) if error.kind() == io::ErrorKind::NotFound => {}
            Err(error) => return Err(FsOpsError::io("delete_source", source.clone(), error)),
        }
    }
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs::File;
    use std::path::Path;
    use tempfile::TempDir;

    fn rule(root: &Path, name: &str) -> MappingRule {
        MappingRule {
            source_download_dir: root.to_path_buf(),
            source_relative_name: PathBuf::from(name),
            destination: PathBuf::from("movies/").join(name),
        }
    }

    #[test]
    fn deletes_each_distinct_source_once() -> Result<()> {
        let temp = TempDir::new()?;
        let root = temp.path();
        fs::create_dir_all(root.join("subs"))?;
        File::create(root.join("movie.mkv"))?;
        File::create(root.join("subs/english.srt"))?;

        // The subtitle backs two rules: its verbatim forward and a sidecar.
        let rules = [
            rule(root, "movie.mkv"),
            rule(root, "subs/english.srt"),
            rule(root, "subs/english.srt"),
        ];
        let deleted = delete_source_files(&rules)?;

        assert_eq!(deleted.len(), 2);
        assert!(!root.join("movie.mkv").exists());
        assert!(!root.join("subs/english.srt").exists());
        Ok(())
    }

    #[test]
    fn missing_sources_are_tolerated() -> Result<()> {
        let temp = TempDir::new()?;
        let rules = [rule(temp.path(), "ghost.mkv")];

        let deleted = delete_source_files(&rules)?;

        assert_eq!(deleted, vec![temp.path().join("ghost.mkv")]);
        Ok(())
    }
}
