//! Daemon bootstrap: settings, telemetry, collaborators, and the poll loop.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info};

use havenpost_config::{Settings, load_settings};
use havenpost_events::{Event, EventBus};
use havenpost_fsops::LibraryChannel;
use havenpost_telemetry::{LogFormat, LoggingConfig, Metrics, build_sha, init_logging};
use havenpost_transmission::{Credentials, TransmissionClient};

use crate::error::{AppError, AppResult};
use crate::orchestrator::PostProcessor;
use crate::wake::WakeSwitch;

/// Environment variable naming the settings file.
pub const ENV_CONFIG: &str = "HAVENPOST_CONFIG";

/// Entry point for the daemon binary: load settings, install telemetry, and
/// run the poll loop until the process is stopped.
///
/// # Errors
///
/// Returns an error when settings cannot be loaded or telemetry cannot be
/// installed. Failures inside individual poll passes are logged and retried
/// on the next tick instead.
pub async fn run_app() -> AppResult<()> {
    let path = std::env::var(ENV_CONFIG).map_err(|_| AppError::MissingEnv { name: ENV_CONFIG })?;
    let settings = load_settings(Path::new(&path))
        .map_err(|source| AppError::config("load_settings", source))?;

    let format = settings
        .logging
        .format
        .as_deref()
        .map_or_else(LogFormat::infer, LogFormat::from_name);
    init_logging(&LoggingConfig {
        level: &settings.logging.level,
        format,
        build_sha: build_sha(),
    })
    .map_err(|source| AppError::telemetry("init_logging", source))?;
    info!(build_sha = build_sha(), "starting havenpost");

    let metrics = Metrics::new().map_err(|source| AppError::telemetry("metrics_registry", source))?;
    let events = EventBus::new();
    let _event_pump = spawn_event_pump(&events, metrics.clone());

    let processor = build_processor(&settings, events.clone(), metrics);
    run_poll_loop(&processor, &events, settings.poll_interval()).await;
    Ok(())
}

fn build_processor(settings: &Settings, events: EventBus, metrics: Metrics) -> PostProcessor {
    let credentials = match (
        &settings.transmission.username,
        &settings.transmission.password,
    ) {
        (Some(username), Some(password)) => Some(Credentials {
            username: username.clone(),
            password: password.clone(),
        }),
        _ => None,
    };
    let client = Arc::new(TransmissionClient::new(
        settings.transmission.url.clone(),
        credentials,
    ));
    let wake = settings
        .wake
        .as_ref()
        .map(|wake| WakeSwitch::new(wake.base_url.clone(), wake.entity.clone(), wake.token.clone()));

    PostProcessor::new(
        client,
        Arc::new(LibraryChannel::new()),
        events,
        metrics,
        settings.library.destination_root.clone(),
        wake,
    )
}

/// Mirror every published event into the metrics registry and debug log.
fn spawn_event_pump(events: &EventBus, metrics: Metrics) -> tokio::task::JoinHandle<()> {
    let mut stream = events.subscribe(None);
    tokio::spawn(async move {
        while let Some(envelope) = stream.next().await {
            metrics.inc_event(envelope.event.kind());
            debug!(kind = envelope.event.kind(), id = envelope.id, "event emitted");
        }
    })
}

async fn run_poll_loop(processor: &PostProcessor, events: &EventBus, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        match processor.run_once().await {
            Ok(summary) => info!(
                mapped = summary.mapped,
                removed = summary.removed,
                failed = summary.failed,
                woke = summary.woke,
                "poll pass finished"
            ),
            Err(error) => {
                error!(%error, "poll pass failed");
                events.publish(Event::HealthChanged {
                    degraded: vec!["transmission".to_string()],
                });
            }
        }
    }
}
