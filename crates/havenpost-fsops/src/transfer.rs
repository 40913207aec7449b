//! The shipping seam between the mapper and the media library.

use std::fs;

use async_trait::async_trait;
use tracing::debug;

use havenpost_mapper::MappingRule;

use crate::error::{FsOpsError, FsOpsResult};

/// Result of shipping a single mapping rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShipOutcome {
    /// The source file was copied to its destination.
    Delivered,
    /// The source file no longer exists; nothing was created.
    SkippedMissing,
}

/// Transport for mapping rules. Remote transports (SSH, mounted shares on
/// other hosts) implement this trait outside the workspace; the orchestrator
/// only sees the seam.
#[async_trait]
pub trait TransferChannel: Send + Sync {
    /// Copy one rule's source to its destination, creating destination parent
    /// directories as needed. A missing source is a non-fatal skip.
    async fn ship(&self, rule: &MappingRule) -> FsOpsResult<ShipOutcome>;
}

/// Channel that copies into a library root mounted on the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LibraryChannel;

impl LibraryChannel {
    /// Construct the channel.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TransferChannel for LibraryChannel {
    async fn ship(&self, rule: &MappingRule) -> FsOpsResult<ShipOutcome> {
        let source = rule.source_path();
        if !source.is_file() {
            debug!(source = %source.display(), "source missing; skipping transfer");
            return Ok(ShipOutcome::SkippedMissing);
        }

        if let Some(parent) = rule.destination.parent() {
            fs::create_dir_all(parent)
                .map_err(|error| FsOpsError::io("create_destination_parent", parent, error))?;
        }
        fs::copy(&source, &rule.destination)
            .map_err(|error| FsOpsError::io("copy_file", &rule.destination, error))?;
        debug!(
            source = %source.display(),
            destination = %rule.destination.display(),
            "shipped file"
        );
        Ok(ShipOutcome::Delivered)
    }
}
