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
    clippy::cargo,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions, clippy::multiple_crate_versions)]

//! Filesystem post-processing for completed torrents.
//!
//! Three concerns live here, each invoked by the orchestrator in sequence
//! after the mapper has produced its rules: shipping rules through a
//! [`TransferChannel`], deleting the local originals, and pruning the
//! directories the deletions emptied. Pruning is idempotent and safe to
//! re-run after a partial pass; all state is re-derived from the filesystem.

mod error;
mod prune;
mod sources;
mod transfer;

pub use error::{FsOpsError, FsOpsResult};
pub use prune::{PruneReport, prune_empty_directories};
pub use sources::delete_source_files;
pub use transfer::{LibraryChannel, ShipOutcome, TransferChannel};
