//! Poll-pass orchestration: map, ship, delete, prune, remove, wake.
//!
//! One [`PostProcessor::run_once`] call handles every torrent the client
//! reports. Failures are isolated per torrent so one broken download never
//! blocks the rest of the queue.

use std::ffi::OsString;
use std::path::{MAIN_SEPARATOR_STR, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use havenpost_events::{Event, EventBus};
use havenpost_fsops::{ShipOutcome, TransferChannel, delete_source_files, prune_empty_directories};
use havenpost_mapper::{FileKind, MappingRule, classify, map_single_video_download_with_subs};
use havenpost_telemetry::Metrics;
use havenpost_torrent_core::{TorrentClient, TorrentSnapshot};

use crate::error::{AppError, AppResult};
use crate::wake::WakeSwitch;

/// Counters describing one poll pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Torrents mapped and shipped into the library.
    pub mapped: usize,
    /// Torrents removed from the client.
    pub removed: usize,
    /// Torrents that failed either stage.
    pub failed: usize,
    /// Whether the wake request was delivered.
    pub woke: bool,
}

/// Drives the post-processing pipeline over a torrent client and a transfer
/// channel.
pub struct PostProcessor {
    client: Arc<dyn TorrentClient>,
    channel: Arc<dyn TransferChannel>,
    events: EventBus,
    metrics: Metrics,
    destination_root: PathBuf,
    wake: Option<WakeSwitch>,
}

impl PostProcessor {
    /// Assemble the pipeline over its collaborators.
    #[must_use]
    pub const fn new(
        client: Arc<dyn TorrentClient>,
        channel: Arc<dyn TransferChannel>,
        events: EventBus,
        metrics: Metrics,
        destination_root: PathBuf,
        wake: Option<WakeSwitch>,
    ) -> Self {
        Self {
            client,
            channel,
            events,
            metrics,
            destination_root,
            wake,
        }
    }

    /// Execute one poll pass over the client's current torrent list.
    ///
    /// Mapping and removal eligibility are evaluated independently; a torrent
    /// can be mapped on one pass and removed on a later one. A failure inside
    /// one torrent is recorded and the pass continues with the next.
    ///
    /// # Errors
    ///
    /// Returns an error only when the torrent list itself cannot be fetched.
    pub async fn run_once(&self) -> AppResult<RunSummary> {
        self.metrics.inc_run();
        let torrents = self
            .client
            .list_torrents()
            .await
            .map_err(|source| AppError::torrent("list_torrents", source))?;

        let pending = torrents
            .iter()
            .filter(|torrent| torrent.is_ready_to_map())
            .count();
        self.metrics
            .set_pending_torrents(i64::try_from(pending).unwrap_or(i64::MAX));

        let mut summary = RunSummary::default();
        for torrent in torrents.iter().filter(|torrent| torrent.is_ready_to_map()) {
            match self.process_torrent(torrent).await {
                Ok(()) => {
                    summary.mapped += 1;
                    self.metrics.inc_torrent("mapped");
                }
                Err(error) => {
                    warn!(torrent = %torrent.name, %error, "post-processing failed");
                    self.events.publish(Event::TorrentFailed {
                        torrent_id: torrent.id,
                        message: error.to_string(),
                    });
                    self.metrics.inc_torrent("failed");
                    summary.failed += 1;
                }
            }
        }

        for torrent in torrents
            .iter()
            .filter(|torrent| torrent.is_ready_to_remove())
        {
            match self.client.remove_torrent(torrent.id).await {
                Ok(()) => {
                    self.events.publish(Event::TorrentRemoved {
                        torrent_id: torrent.id,
                        name: torrent.name.clone(),
                    });
                    self.metrics.inc_torrent("removed");
                    summary.removed += 1;
                }
                Err(error) => {
                    warn!(torrent = %torrent.name, %error, "removal failed");
                    self.metrics.inc_torrent("failed");
                    summary.failed += 1;
                }
            }
        }

        if summary.mapped > 0
            && let Some(wake) = &self.wake
        {
            self.events.publish(Event::DeviceWakeRequested {
                entity: wake.entity().to_string(),
            });
            match wake.turn_on().await {
                Ok(()) => {
                    self.metrics.inc_wake("ok");
                    summary.woke = true;
                }
                Err(error) => {
                    warn!(%error, "wake request failed");
                    self.metrics.inc_wake("error");
                }
            }
        }

        Ok(summary)
    }

    async fn process_torrent(&self, torrent: &TorrentSnapshot) -> AppResult<()> {
        self.events.publish(Event::TorrentCompleted {
            torrent_id: torrent.id,
            name: torrent.name.clone(),
        });

        let root = self.destination_prefix();
        let rules = map_single_video_download_with_subs(&torrent.files, &root);
        self.events.publish(Event::MappingPlanned {
            torrent_id: torrent.id,
            rule_count: rules.len(),
        });
        for rule in &rules {
            self.metrics.inc_mapper_rule(rule_kind(rule));
        }
        if rules.is_empty() {
            info!(torrent = %torrent.name, "no mappable files");
            return Ok(());
        }

        for rule in &rules {
            let outcome = self
                .channel
                .ship(rule)
                .await
                .map_err(|source| AppError::fsops("ship_file", source))?;
            match outcome {
                ShipOutcome::Delivered => {
                    self.metrics.inc_transfer("delivered");
                    self.events.publish(Event::FileShipped {
                        torrent_id: torrent.id,
                        destination: rule.destination.display().to_string(),
                    });
                }
                ShipOutcome::SkippedMissing => {
                    self.metrics.inc_transfer("skipped");
                    self.events.publish(Event::FileSkipped {
                        torrent_id: torrent.id,
                        source: rule.source_path().display().to_string(),
                    });
                }
            }
        }

        let deleted = delete_source_files(&rules)
            .map_err(|source| AppError::fsops("delete_sources", source))?;
        self.events.publish(Event::SourcesDeleted {
            torrent_id: torrent.id,
            deleted: u64::try_from(deleted.len()).unwrap_or(u64::MAX),
        });

        let report = prune_empty_directories(&torrent.download_dir, &deleted);
        self.metrics.observe_prune(report.removed, report.failed);
        self.events.publish(Event::DirectoriesPruned {
            torrent_id: torrent.id,
            removed: report.removed,
            failed: report.failed,
        });
        Ok(())
    }

    /// The configured library root with a guaranteed trailing separator, since
    /// the mapper prefixes destinations by literal concatenation.
    fn destination_prefix(&self) -> PathBuf {
        let mut root: OsString = self.destination_root.clone().into_os_string();
        if !root.to_string_lossy().ends_with(MAIN_SEPARATOR_STR) {
            root.push(MAIN_SEPARATOR_STR);
        }
        PathBuf::from(root)
    }
}

fn rule_kind(rule: &MappingRule) -> &'static str {
    let kind = rule
        .source_relative_name
        .to_str()
        .map_or(FileKind::Other, classify);
    match kind {
        FileKind::Video => "video",
        FileKind::Subtitle => "subtitle",
        FileKind::Other => "other",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use httpmock::prelude::*;
    use std::path::Path;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::time::timeout;

    use async_trait::async_trait;
    use havenpost_fsops::{FsOpsError, FsOpsResult, LibraryChannel};
    use havenpost_test_support::fixtures::{
        completed_torrent, download_file, incomplete_torrent, materialise,
    };
    use havenpost_test_support::mocks::{FakeTorrentClient, RecordingChannel};

    fn build_processor(
        client: Arc<dyn TorrentClient>,
        channel: Arc<dyn TransferChannel>,
        root: &Path,
        wake: Option<WakeSwitch>,
    ) -> Result<(PostProcessor, EventBus)> {
        let events = EventBus::new();
        let metrics = Metrics::new()?;
        let processor = PostProcessor::new(
            client,
            channel,
            events.clone(),
            metrics,
            root.to_path_buf(),
            wake,
        );
        Ok((processor, events))
    }

    async fn collect_kinds(events: &EventBus) -> Vec<&'static str> {
        let mut stream = events.subscribe(Some(0));
        let mut kinds = Vec::new();
        while let Ok(Some(envelope)) = timeout(Duration::from_millis(50), stream.next()).await {
            kinds.push(envelope.event.kind());
        }
        kinds
    }

    /// Channel that fails for sources under any download dir ending in "bad".
    #[derive(Debug, Default)]
    struct FlakyChannel;

    #[async_trait]
    impl TransferChannel for FlakyChannel {
        async fn ship(&self, rule: &MappingRule) -> FsOpsResult<ShipOutcome> {
            if rule.source_download_dir.ends_with("bad") {
                return Err(FsOpsError::Io {
                    operation: "copy_file",
                    path: rule.source_path(),
                    source: std::io::Error::other("disk full"),
                });
            }
            Ok(ShipOutcome::Delivered)
        }
    }

    #[tokio::test]
    async fn ships_deletes_prunes_and_removes() -> Result<()> {
        let downloads = TempDir::new()?;
        let library = TempDir::new()?;
        let torrent_dir = downloads.path().join("movie");
        let snapshot = completed_torrent(
            1,
            "movie",
            vec![
                download_file(&torrent_dir, "movie.mkv", 2_000),
                download_file(&torrent_dir, "subs/english.srt", 10),
            ],
        );
        materialise(&snapshot)?;

        let client = Arc::new(FakeTorrentClient::with_torrents(vec![snapshot]));
        let (processor, events) = build_processor(
            client.clone(),
            Arc::new(LibraryChannel::new()),
            library.path(),
            None,
        )?;

        let summary = processor.run_once().await?;
        assert_eq!(summary.mapped, 1);
        assert_eq!(summary.removed, 1);
        assert_eq!(summary.failed, 0);

        assert!(library.path().join("movie.mkv").is_file());
        assert!(library.path().join("subs/english.srt").is_file());
        assert!(library.path().join("english.srt").is_file());

        assert!(!torrent_dir.join("movie.mkv").exists());
        assert!(!torrent_dir.join("subs").exists());
        assert!(torrent_dir.exists());
        assert_eq!(client.removed_ids(), vec![1]);

        let kinds = collect_kinds(&events).await;
        for expected in [
            "torrent_completed",
            "mapping_planned",
            "file_shipped",
            "sources_deleted",
            "directories_pruned",
            "torrent_removed",
        ] {
            assert!(kinds.contains(&expected), "missing event {expected}");
        }
        Ok(())
    }

    #[tokio::test]
    async fn incomplete_torrents_are_left_alone() -> Result<()> {
        let downloads = TempDir::new()?;
        let library = TempDir::new()?;
        let snapshot = incomplete_torrent(
            5,
            "fresh",
            vec![download_file(downloads.path(), "fresh.mkv", 100)],
        );

        let client = Arc::new(FakeTorrentClient::with_torrents(vec![snapshot]));
        let channel = Arc::new(RecordingChannel::new());
        let (processor, _events) =
            build_processor(client.clone(), channel.clone(), library.path(), None)?;

        let summary = processor.run_once().await?;
        assert_eq!(summary, RunSummary::default());
        assert!(channel.shipped().is_empty());
        assert!(client.removed_ids().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn mapping_and_removal_eligibility_diverge() -> Result<()> {
        let downloads = TempDir::new()?;
        let library = TempDir::new()?;

        // Finished downloading but still seeding: mappable, not removable.
        let mut seeding = completed_torrent(
            1,
            "seeding",
            vec![download_file(&downloads.path().join("seeding"), "movie.mkv", 100)],
        );
        seeding.left_until_done = 5;

        // Nothing left to fetch but progress below threshold: removable only.
        let mut stalled = completed_torrent(
            2,
            "stalled",
            vec![download_file(&downloads.path().join("stalled"), "other.mkv", 10)],
        );
        stalled.percent_done = 98.0;

        let client = Arc::new(FakeTorrentClient::with_torrents(vec![seeding, stalled]));
        let channel = Arc::new(RecordingChannel::new());
        let (processor, _events) =
            build_processor(client.clone(), channel.clone(), library.path(), None)?;

        let summary = processor.run_once().await?;
        assert_eq!(summary.mapped, 1);
        assert_eq!(summary.removed, 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(client.removed_ids(), vec![2]);

        let shipped = channel.shipped();
        assert_eq!(shipped.len(), 1);
        assert_eq!(
            shipped[0].source_relative_name,
            PathBuf::from("movie.mkv")
        );
        Ok(())
    }

    #[tokio::test]
    async fn missing_sources_are_skipped_not_fatal() -> Result<()> {
        let downloads = TempDir::new()?;
        let library = TempDir::new()?;
        // Snapshot deliberately not materialised on disk.
        let snapshot = completed_torrent(
            3,
            "ghost",
            vec![download_file(downloads.path(), "ghost.mkv", 100)],
        );

        let client = Arc::new(FakeTorrentClient::with_torrents(vec![snapshot]));
        let (processor, events) = build_processor(
            client,
            Arc::new(LibraryChannel::new()),
            library.path(),
            None,
        )?;

        let summary = processor.run_once().await?;
        assert_eq!(summary.mapped, 1);
        assert!(!library.path().join("ghost.mkv").exists());

        let kinds = collect_kinds(&events).await;
        assert!(kinds.contains(&"file_skipped"));
        assert!(!kinds.contains(&"file_shipped"));
        Ok(())
    }

    #[tokio::test]
    async fn one_broken_torrent_does_not_block_the_rest() -> Result<()> {
        let downloads = TempDir::new()?;
        let library = TempDir::new()?;
        let good = completed_torrent(
            1,
            "good",
            vec![download_file(&downloads.path().join("good"), "movie.mkv", 100)],
        );
        let bad = completed_torrent(
            2,
            "bad",
            vec![download_file(&downloads.path().join("bad"), "movie.mkv", 100)],
        );

        let client = Arc::new(FakeTorrentClient::with_torrents(vec![bad, good]));
        let (processor, events) =
            build_processor(client.clone(), Arc::new(FlakyChannel), library.path(), None)?;

        let summary = processor.run_once().await?;
        assert_eq!(summary.mapped, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.removed, 2);

        let kinds = collect_kinds(&events).await;
        assert!(kinds.contains(&"torrent_failed"));
        Ok(())
    }

    #[tokio::test]
    async fn wake_fires_once_per_pass_with_mapped_torrents() -> Result<()> {
        let downloads = TempDir::new()?;
        let library = TempDir::new()?;
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/services/switch/turn_on")
                .header("authorization", "Bearer secret")
                .json_body(serde_json::json!({"entity_id": "switch.media_station"}));
            then.status(200).json_body(serde_json::json!([]));
        });

        let torrents = vec![
            completed_torrent(
                1,
                "first",
                vec![download_file(&downloads.path().join("first"), "a.mkv", 10)],
            ),
            completed_torrent(
                2,
                "second",
                vec![download_file(&downloads.path().join("second"), "b.mkv", 10)],
            ),
        ];
        let client = Arc::new(FakeTorrentClient::with_torrents(torrents));
        let wake = WakeSwitch::new(server.base_url(), "media_station", "secret");
        let (processor, events) = build_processor(
            client,
            Arc::new(RecordingChannel::new()),
            library.path(),
            Some(wake),
        )?;

        let summary = processor.run_once().await?;
        assert_eq!(summary.mapped, 2);
        assert!(summary.woke);
        mock.assert();

        let kinds = collect_kinds(&events).await;
        assert_eq!(
            kinds
                .iter()
                .filter(|kind| **kind == "device_wake_requested")
                .count(),
            1
        );
        Ok(())
    }

    #[tokio::test]
    async fn wake_is_skipped_when_nothing_was_mapped() -> Result<()> {
        let downloads = TempDir::new()?;
        let library = TempDir::new()?;
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST).path("/api/services/switch/turn_on");
            then.status(200).json_body(serde_json::json!([]));
        });

        let snapshot = incomplete_torrent(
            9,
            "fresh",
            vec![download_file(downloads.path(), "fresh.mkv", 100)],
        );
        let client = Arc::new(FakeTorrentClient::with_torrents(vec![snapshot]));
        let wake = WakeSwitch::new(server.base_url(), "media_station", "secret");
        let (processor, _events) = build_processor(
            client,
            Arc::new(RecordingChannel::new()),
            library.path(),
            Some(wake),
        )?;

        let summary = processor.run_once().await?;
        assert!(!summary.woke);
        mock.assert_calls(0);
        Ok(())
    }
}
