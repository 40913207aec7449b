//! Fake collaborators for orchestrator tests.

use std::sync::Mutex;

use async_trait::async_trait;

use havenpost_fsops::{FsOpsResult, ShipOutcome, TransferChannel};
use havenpost_mapper::MappingRule;
use havenpost_torrent_core::{TorrentClient, TorrentResult, TorrentSnapshot};

/// Scripted torrent client backed by an in-memory snapshot list.
#[derive(Debug, Default)]
pub struct FakeTorrentClient {
    snapshots: Mutex<Vec<TorrentSnapshot>>,
    removed: Mutex<Vec<i64>>,
}

impl FakeTorrentClient {
    /// Construct a client that will report the given torrents.
    #[must_use]
    pub fn with_torrents(snapshots: Vec<TorrentSnapshot>) -> Self {
        Self {
            snapshots: Mutex::new(snapshots),
            removed: Mutex::new(Vec::new()),
        }
    }

    /// Identifiers removed so far, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex has been poisoned.
    #[must_use]
    pub fn removed_ids(&self) -> Vec<i64> {
        self.removed.lock().expect("removed mutex poisoned").clone()
    }
}

#[async_trait]
impl TorrentClient for FakeTorrentClient {
    async fn list_torrents(&self) -> TorrentResult<Vec<TorrentSnapshot>> {
        Ok(self
            .snapshots
            .lock()
            .expect("snapshot mutex poisoned")
            .clone())
    }

    async fn remove_torrent(&self, id: i64) -> TorrentResult<()> {
        self.removed.lock().expect("removed mutex poisoned").push(id);
        self.snapshots
            .lock()
            .expect("snapshot mutex poisoned")
            .retain(|snapshot| snapshot.id != id);
        Ok(())
    }
}

/// Transfer channel that records every shipped rule.
///
/// Shipping succeeds unconditionally; tests that need real skip-on-missing
/// behaviour use `LibraryChannel` over a temp directory instead.
#[derive(Debug, Default)]
pub struct RecordingChannel {
    shipped: Mutex<Vec<MappingRule>>,
}

impl RecordingChannel {
    /// Construct an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rules shipped so far, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex has been poisoned.
    #[must_use]
    pub fn shipped(&self) -> Vec<MappingRule> {
        self.shipped.lock().expect("shipped mutex poisoned").clone()
    }
}

#[async_trait]
impl TransferChannel for RecordingChannel {
    async fn ship(&self, rule: &MappingRule) -> FsOpsResult<ShipOutcome> {
        self.shipped
            .lock()
            .expect("shipped mutex poisoned")
            .push(rule.clone());
        Ok(ShipOutcome::Delivered)
    }
}
