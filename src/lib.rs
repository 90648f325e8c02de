// src/lib.rs
// Public library surface for the server, the CLI and integration tests.

pub mod aggregate;
pub mod api;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod label;
pub mod logging;
pub mod metrics;
pub mod playback;
pub mod rank;
pub mod record;
pub mod render;
pub mod source;
pub mod timeline;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::config::DashboardConfig;
pub use crate::dashboard::Dashboard;
pub use crate::label::LabelFormatter;
pub use crate::playback::{PlaybackScheduler, PlaybackSession, PlaybackState};
pub use crate::record::{FieldMap, Record};
pub use crate::render::{Frame, FrameEntry, Renderer, Theme};
pub use crate::timeline::{build_timeline, BucketPolicy, Timeline};

use crate::source::{spawn_fetch, HttpSource, RecordSource};

/// Kick off the initial fetch for every dashboard that has a `data_url`.
/// Dashboards without one wait for records posted through the API.
pub fn spawn_initial_fetches(state: &AppState) -> Vec<tokio::task::JoinHandle<()>> {
    state
        .handles()
        .filter_map(|h| {
            let source = HttpSource::for_dashboard(&h.config)?;
            tracing::info!(target: "source", dashboard = %h.config.name, url = %source.name(), "fetching race data");
            Some(spawn_fetch(Box::new(source), h.dashboard.clone()))
        })
        .collect()
}
