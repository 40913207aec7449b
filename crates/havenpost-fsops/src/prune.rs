//! Bottom-up removal of directories emptied by source deletion.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Outcome of a pruning pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneReport {
    /// Directories removed during this pass.
    pub removed: u64,
    /// Ancestor chains abandoned because of a filesystem failure.
    pub failed: u64,
}

impl PruneReport {
    /// Whether every ancestor chain was walked without failure.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Remove every directory left empty by deleting `deleted_files`, walking
/// upward from each file's parent toward `root`.
///
/// Each chain stops at the first non-empty directory or at `root` itself;
/// `root` is never removed, even when empty. A directory that is already
/// gone counts as success and the walk continues upward, which also makes
/// the pass idempotent. Any other filesystem failure abandons that chain
/// only and is tallied in the report; unrelated chains still run.
#[must_use]
pub fn prune_empty_directories(root: &Path, deleted_files: &[PathBuf]) -> PruneReport {
    let mut report = PruneReport::default();
    for parent in distinct_parents(deleted_files) {
        prune_branch(root, parent, &mut report);
    }
    report
}

/// Distinct parent directories of the deleted files, in first-seen order.
fn distinct_parents(deleted_files: &[PathBuf]) -> Vec<&Path> {
    let mut parents: Vec<&Path> = Vec::new();
    for file in deleted_files {
        if let Some(parent) = file.parent() {
            if !parents.contains(&parent) {
                parents.push(parent);
            }
        }
    }
    parents
}

/// Walk one ancestor chain from `start` toward `root`, removing empty
/// directories. The walk is inherently sequential: each level's emptiness
/// depends on the previous level's removal.
fn prune_branch(root: &Path, start: &Path, report: &mut PruneReport) {
    let mut current = start;
    while current != root && current.starts_with(root) {
        match remove_if_empty(current) {
            Ok(Removal::Removed) => {
                debug!(path = %current.display(), "removed empty directory");
                report.removed += 1;
            }
            Ok(Removal::AlreadyGone) => {}
            Ok(Removal::NotEmpty) => break,
            Err(error) => {
                warn!(
                    path = %current.display(),
                    error = %error,
                    "abandoning prune chain"
                );
                report.failed += 1;
                break;
            }
        }
        let Some(parent) = current.parent() else {
            break;
        };
        current = parent;
    }
}

enum Removal {
    Removed,
    AlreadyGone,
    NotEmpty,
}

fn remove_if_empty(dir: &Path) -> io::Result<Removal> {
    let mut entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Removal::AlreadyGone),
        Err(error) => return Err(error),
    };
    if entries.next().is_some() {
        return Ok(Removal::NotEmpty);
    }
    match fs::remove_dir(dir) {
        Ok(()) => Ok(Removal::Removed),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(Removal::AlreadyGone),
        Err(error) => Err(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs::File;
    use tempfile::TempDir;

    fn touch(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        File::create(path)?;
        Ok(())
    }

    #[test]
    fn removes_emptied_chain_up_to_root() -> Result<()> {
        let temp = TempDir::new()?;
        let root = temp.path();
        let file = root.join("a/b/c/file1");
        touch(&file)?;
        fs::remove_file(&file)?;

        let report = prune_empty_directories(root, &[file]);

        assert_eq!(report.removed, 3);
        assert!(report.is_clean());
        assert!(!root.join("a").exists());
        assert!(root.exists());
        Ok(())
    }

    #[test]
    fn unrelated_sibling_halts_the_walk() -> Result<()> {
        let temp = TempDir::new()?;
        let root = temp.path();
        let file = root.join("a/b/file1");
        touch(&file)?;
        touch(&root.join("a/external"))?;
        fs::remove_file(&file)?;

        let report = prune_empty_directories(root, &[file]);

        assert_eq!(report.removed, 1);
        assert!(!root.join("a/b").exists());
        assert!(root.join("a").exists());
        assert!(root.join("a/external").exists());
        Ok(())
    }

    #[test]
    fn shared_ancestors_are_handled_once() -> Result<()> {
        let temp = TempDir::new()?;
        let root = temp.path();
        let first = root.join("a/b/file1");
        let second = root.join("a/b/file2");
        touch(&first)?;
        touch(&second)?;
        fs::remove_file(&first)?;
        fs::remove_file(&second)?;

        let report = prune_empty_directories(root, &[first, second]);

        assert_eq!(report.removed, 2);
        assert!(!root.join("a").exists());
        Ok(())
    }

    #[test]
    fn second_pass_is_a_no_op() -> Result<()> {
        let temp = TempDir::new()?;
        let root = temp.path();
        let file = root.join("a/b/file1");
        touch(&file)?;
        fs::remove_file(&file)?;

        let deleted = vec![file];
        let first = prune_empty_directories(root, &deleted);
        let second = prune_empty_directories(root, &deleted);

        assert_eq!(first.removed, 2);
        assert_eq!(second, PruneReport::default());
        Ok(())
    }

    #[test]
    fn file_directly_under_root_prunes_nothing() -> Result<()> {
        let temp = TempDir::new()?;
        let root = temp.path();
        let file = root.join("file1");
        touch(&file)?;
        fs::remove_file(&file)?;

        let report = prune_empty_directories(root, &[file]);

        assert_eq!(report, PruneReport::default());
        assert!(root.exists());
        Ok(())
    }

    #[test]
    fn paths_outside_the_root_are_ignored() -> Result<()> {
        let temp = TempDir::new()?;
        let elsewhere = TempDir::new()?;
        let file = elsewhere.path().join("a/file1");
        touch(&file)?;
        fs::remove_file(&file)?;

        let report = prune_empty_directories(temp.path(), &[file]);

        assert_eq!(report, PruneReport::default());
        assert!(elsewhere.path().join("a").exists());
        Ok(())
    }

    #[test]
    fn disjoint_chains_both_prune() -> Result<()> {
        let temp = TempDir::new()?;
        let root = temp.path();
        let first = root.join("a/file1");
        let second = root.join("b/c/file2");
        touch(&first)?;
        touch(&second)?;
        fs::remove_file(&first)?;
        fs::remove_file(&second)?;

        let report = prune_empty_directories(root, &[first, second]);

        assert_eq!(report.removed, 3);
        assert!(!root.join("a").exists());
        assert!(!root.join("b").exists());
        Ok(())
    }
}
