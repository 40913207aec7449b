//! Prometheus-backed metrics registry and snapshot helpers.
//!
//! # Design
//! - Encapsulates collector registration to keep the public API small.
//! - Exposes the counters relevant to the post-processing pipeline.

use anyhow::{Context, Result};
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use serde::Serialize;

/// Prometheus-backed metrics registry shared across pipeline stages.
#[derive(Clone)]
pub struct Metrics {
    inner: std::sync::Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    events_emitted_total: IntCounterVec,
    mapper_rules_total: IntCounterVec,
    transfer_files_total: IntCounterVec,
    prune_directories_total: IntCounterVec,
    torrents_processed_total: IntCounterVec,
    wake_requests_total: IntCounterVec,
    runs_total: IntCounter,
    pending_torrents: IntGauge,
}

/// Snapshot of selected gauges and counters for health reporting.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    /// Number of torrents awaiting processing at the latest poll.
    pub pending_torrents: i64,
    /// Total number of poll-loop runs executed.
    pub runs_total: u64,
}

impl Metrics {
    /// Construct a new metrics registry with the standard collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the Prometheus collectors cannot be
    /// registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let events_emitted_total = IntCounterVec::new(
            Opts::new("events_emitted_total", "Domain events emitted by type"),
            &["type"],
        )?;
        let mapper_rules_total = IntCounterVec::new(
            Opts::new("mapper_rules_total", "Mapping rules produced by kind"),
            &["kind"],
        )?;
        let transfer_files_total = IntCounterVec::new(
            Opts::new(
                "transfer_files_total",
                "Files handed to the transfer channel by outcome",
            ),
            &["status"],
        )?;
        let prune_directories_total = IntCounterVec::new(
            Opts::new(
                "prune_directories_total",
                "Empty directories visited by the pruner by outcome",
            ),
            &["status"],
        )?;
        let torrents_processed_total = IntCounterVec::new(
            Opts::new(
                "torrents_processed_total",
                "Torrents handled by the orchestrator by outcome",
            ),
            &["outcome"],
        )?;
        let wake_requests_total = IntCounterVec::new(
            Opts::new("wake_requests_total", "Wake-device HTTP calls by outcome"),
            &["status"],
        )?;
        let runs_total =
            IntCounter::with_opts(Opts::new("runs_total", "Poll-loop runs executed"))?;
        let pending_torrents = IntGauge::with_opts(Opts::new(
            "pending_torrents",
            "Torrents awaiting processing at the latest poll",
        ))?;

        registry.register(Box::new(events_emitted_total.clone()))?;
        registry.register(Box::new(mapper_rules_total.clone()))?;
        registry.register(Box::new(transfer_files_total.clone()))?;
        registry.register(Box::new(prune_directories_total.clone()))?;
        registry.register(Box::new(torrents_processed_total.clone()))?;
        registry.register(Box::new(wake_requests_total.clone()))?;
        registry.register(Box::new(runs_total.clone()))?;
        registry.register(Box::new(pending_torrents.clone()))?;

        Ok(Self {
            inner: std::sync::Arc::new(MetricsInner {
                registry,
                events_emitted_total,
                mapper_rules_total,
                transfer_files_total,
                prune_directories_total,
                torrents_processed_total,
                wake_requests_total,
                runs_total,
                pending_torrents,
            }),
        })
    }

    /// Increment the emitted event counter for the specific event type.
    pub fn inc_event(&self, event_type: &str) {
        self.inner
            .events_emitted_total
            .with_label_values(&[event_type])
            .inc();
    }

    /// Increment the mapping rule counter for the given rule kind.
    pub fn inc_mapper_rule(&self, kind: &str) {
        self.inner
            .mapper_rules_total
            .with_label_values(&[kind])
            .inc();
    }

    /// Increment the transfer counter for the given shipping outcome.
    pub fn inc_transfer(&self, status: &str) {
        self.inner
            .transfer_files_total
            .with_label_values(&[status])
            .inc();
    }

    /// Record the outcome counts of one pruning pass.
    pub fn observe_prune(&self, removed: u64, failed: u64) {
        self.inner
            .prune_directories_total
            .with_label_values(&["removed"])
            .inc_by(removed);
        self.inner
            .prune_directories_total
            .with_label_values(&["failed"])
            .inc_by(failed);
    }

    /// Increment the per-torrent outcome counter.
    pub fn inc_torrent(&self, outcome: &str) {
        self.inner
            .torrents_processed_total
            .with_label_values(&[outcome])
            .inc();
    }

    /// Increment the wake-device request counter.
    pub fn inc_wake(&self, status: &str) {
        self.inner
            .wake_requests_total
            .with_label_values(&[status])
            .inc();
    }

    /// Increment the poll-loop run counter.
    pub fn inc_run(&self) {
        self.inner.runs_total.inc();
    }

    /// Set the pending torrent gauge.
    pub fn set_pending_torrents(&self, count: i64) {
        self.inner.pending_torrents.set(count);
    }

    /// Render the metrics registry using the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics cannot be encoded or if the encoded
    /// buffer is not valid UTF-8.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .context("failed to encode Prometheus metrics")?;
        String::from_utf8(buffer).context("metrics output was not valid UTF-8")
    }

    /// Take a point-in-time snapshot of the most relevant gauges and counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            pending_torrents: self.inner.pending_torrents.get(),
            runs_total: self.inner.runs_total.get(),
        }
    }
}
