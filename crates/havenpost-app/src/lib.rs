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

//! Havenpost daemon wiring.
//!
//! Polls a Transmission daemon for finished torrents, maps their files into a
//! media library, cleans up the download area, and optionally wakes the
//! playback device. `bootstrap` assembles the collaborators; `orchestrator`
//! drives one poll pass at a time.

mod bootstrap;
mod error;
mod orchestrator;
mod wake;

pub use bootstrap::{ENV_CONFIG, run_app};
pub use error::{AppError, AppResult};
pub use orchestrator::{PostProcessor, RunSummary};
pub use wake::WakeSwitch;
