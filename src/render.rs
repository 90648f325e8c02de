//! # Renderer contract
//! The playback engine hands ranked frames to a [`Renderer`]; it never reads
//! anything back. Two renderers live in this crate:
//! - [`TracingRenderer`] logs every frame (terminal playback in `race_cli`).
//! - [`SnapshotRenderer`] keeps only the most recent frame behind a shared
//!   handle, which the HTTP API serves to the dashboard pages.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl FromStr for Theme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            other => anyhow::bail!("unknown theme '{other}' (expected dark|light)"),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameEntry {
    pub label: String,
    pub value: u64,
}

/// Ranked snapshot produced by one tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub bucket_key: String,
    /// 0-based tick index within the session.
    pub index: usize,
    /// Number of buckets in the session's timeline.
    pub total: usize,
    pub entries: Vec<FrameEntry>,
}

pub trait Renderer: Send + 'static {
    fn initialize(&mut self, theme: Theme);
    fn render_frame(&mut self, frame: &Frame);
    /// Explicit "no data" state; distinct from a finished race.
    fn render_empty(&mut self, message: &str);
    /// Data-error placeholder (failed fetch, malformed payload).
    fn render_error(&mut self, message: &str);
    fn dispose(&mut self);
}

/// Logs frames through `tracing`.
#[derive(Debug, Default)]
pub struct TracingRenderer {
    name: String,
}

impl TracingRenderer {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Renderer for TracingRenderer {
    fn initialize(&mut self, theme: Theme) {
        debug!(target: "render", dashboard = %self.name, %theme, "initialize");
    }

    fn render_frame(&mut self, frame: &Frame) {
        let rows: Vec<String> = frame
            .entries
            .iter()
            .map(|e| format!("{}={}", e.label, e.value))
            .collect();
        info!(
            target: "render",
            dashboard = %self.name,
            bucket = %frame.bucket_key,
            tick = frame.index + 1,
            of = frame.total,
            "{}",
            rows.join(", ")
        );
    }

    fn render_empty(&mut self, message: &str) {
        info!(target: "render", dashboard = %self.name, "{message}");
    }

    fn render_error(&mut self, message: &str) {
        warn!(target: "render", dashboard = %self.name, "{message}");
    }

    fn dispose(&mut self) {
        debug!(target: "render", dashboard = %self.name, "dispose");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceholderKind {
    Empty,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placeholder {
    pub kind: PlaceholderKind,
    pub message: String,
}

/// What a [`SnapshotRenderer`] currently shows.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Snapshot {
    pub theme: Option<Theme>,
    pub frame: Option<Frame>,
    pub placeholder: Option<Placeholder>,
    pub frames_rendered: u64,
    pub disposed: bool,
}

/// Retains the latest frame; clones share the same snapshot.
#[derive(Debug, Clone, Default)]
pub struct SnapshotRenderer {
    inner: Arc<RwLock<Snapshot>>,
}

impl SnapshotRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.inner.read().expect("snapshot rwlock poisoned").clone()
    }

    fn update(&self, f: impl FnOnce(&mut Snapshot)) {
        let mut s = self.inner.write().expect("snapshot rwlock poisoned");
        f(&mut s);
    }
}

impl Renderer for SnapshotRenderer {
    fn initialize(&mut self, theme: Theme) {
        self.update(|s| {
            *s = Snapshot {
                theme: Some(theme),
                ..Snapshot::default()
            }
        });
    }

    fn render_frame(&mut self, frame: &Frame) {
        self.update(|s| {
            s.frame = Some(frame.clone());
            s.placeholder = None;
            s.frames_rendered += 1;
        });
    }

    fn render_empty(&mut self, message: &str) {
        self.update(|s| {
            s.frame = None;
            s.placeholder = Some(Placeholder {
                kind: PlaceholderKind::Empty,
                message: message.to_string(),
            });
        });
    }

    fn render_error(&mut self, message: &str) {
        self.update(|s| {
            s.frame = None;
            s.placeholder = Some(Placeholder {
                kind: PlaceholderKind::Error,
                message: message.to_string(),
            });
        });
    }

    fn dispose(&mut self) {
        self.update(|s| s.disposed = true);
    }
}
