//! # Dashboard
//! Per-chart context: one config, the current theme, the loaded payload and
//! one playback scheduler. Everything a race chart needs between data
//! arrival and teardown lives here, so two dashboards never share state.
//!
//! Flow mirrors the chart pages: data arrives → `load` → `run`; a theme
//! switch restarts the race from the first bucket; a fetch failure shows an
//! error placeholder and never starts playback.

use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::DashboardConfig;
use crate::error::{LoadError, TimelineError};
use crate::playback::{PlaybackScheduler, PlaybackState, SharedRenderer};
use crate::record::Record;
use crate::render::Theme;
use crate::timeline::build_timeline;

pub const FETCH_FAILED_MESSAGE: &str = "Failed to load data";

pub struct Dashboard {
    cfg: DashboardConfig,
    theme: Theme,
    /// `None` until the first payload arrives.
    records: Option<Vec<Record>>,
    scheduler: PlaybackScheduler,
}

impl Dashboard {
    pub fn new(cfg: DashboardConfig, theme: Theme, renderer: SharedRenderer) -> Self {
        let scheduler = PlaybackScheduler::new(cfg.playback_cfg(), renderer);
        Self {
            cfg,
            theme,
            records: None,
            scheduler,
        }
    }

    pub fn name(&self) -> &str {
        &self.cfg.name
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn state(&self) -> PlaybackState {
        self.scheduler.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.scheduler.subscribe()
    }

    /// Store a payload and (re)start playback over it.
    pub async fn load(&mut self, records: Vec<Record>) -> Result<PlaybackState, TimelineError> {
        info!(target: "dashboard", dashboard = %self.cfg.name, records = records.len(), "payload loaded");
        self.records = Some(records);
        self.run().await?;
        Ok(self.state())
    }

    /// Decode an upstream JSON payload with this dashboard's field names and load it.
    /// A payload that does not decode is treated like a failed fetch.
    pub async fn load_json(&mut self, body: &serde_json::Value) -> Result<PlaybackState, LoadError> {
        match self.cfg.field_map().decode_value(body) {
            Ok(records) => Ok(self.load(records).await?),
            Err(e) => {
                self.fail(&e.to_string()).await;
                Err(e.into())
            }
        }
    }

    /// Restart the race for the current payload and theme.
    ///
    /// A bad bucket key (or an over-long span) under the gap-filled policy
    /// shows an error placeholder; playback stays `Idle`.
    pub async fn run(&mut self) -> Result<(), TimelineError> {
        self.scheduler.cancel().await;
        let theme = self.theme;
        self.scheduler.with_renderer(|r| r.initialize(theme));

        let Some(records) = self.records.as_deref() else {
            return Ok(());
        };
        match build_timeline(records, self.cfg.bucket_policy, self.cfg.max_span_hours) {
            Ok(timeline) => {
                self.scheduler.start(timeline, records).await;
                Ok(())
            }
            Err(e) => {
                warn!(target: "dashboard", dashboard = %self.cfg.name, error = %e, "timeline rejected");
                let msg = format!("Data error: {e}");
                self.scheduler.with_renderer(|r| r.render_error(&msg));
                Err(e)
            }
        }
    }

    /// Switch theme. Re-theming restarts playback from the first bucket.
    pub async fn set_theme(&mut self, theme: Theme) -> Result<(), TimelineError> {
        info!(target: "dashboard", dashboard = %self.cfg.name, %theme, "theme changed");
        self.theme = theme;
        self.run().await
    }

    /// The upstream fetch failed: drop any payload and show the error placeholder.
    pub async fn fail(&mut self, reason: &str) {
        warn!(target: "dashboard", dashboard = %self.cfg.name, reason, "data fetch failed");
        self.records = None;
        self.scheduler.cancel().await;
        let theme = self.theme;
        self.scheduler.with_renderer(|r| {
            r.initialize(theme);
            r.render_error(FETCH_FAILED_MESSAGE);
        });
    }

    /// Tear the chart down: stop playback and dispose the renderer.
    pub async fn shutdown(&mut self) {
        self.scheduler.cancel().await;
        self.scheduler.with_renderer(|r| r.dispose());
    }
}
