//! # Playback
//! Drives a ranked timeline forward one bucket per tick.
//!
//! [`PlaybackSession`] is the pure part: timeline, cumulative totals and a
//! cursor. Each call to `next()` applies exactly one bucket and yields the
//! ranked [`Frame`] for it.
//!
//! [`PlaybackScheduler`] owns at most one live session task. The task renders
//! the first frame immediately, then sleeps the fixed delay between ticks.
//! Tick bodies are synchronous, so an abort can only land on the sleep
//! between two ticks. `start` always cancels the previous session first.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::aggregate::{Aggregator, CumulativeState};
use crate::label::LabelFormatter;
use crate::rank::top_n;
use crate::record::Record;
use crate::render::{Frame, FrameEntry, Renderer};
use crate::timeline::Timeline;

/// Renderer shared between a scheduler and its session task.
pub type SharedRenderer = Arc<Mutex<dyn Renderer>>;

pub fn shared_renderer<R: Renderer>(r: R) -> SharedRenderer {
    Arc::new(Mutex::new(r))
}

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "playback_sessions_started_total",
            "Playback sessions started with a non-empty timeline."
        );
        describe_counter!(
            "playback_sessions_cancelled_total",
            "Sessions cancelled before reaching the final bucket."
        );
        describe_counter!("playback_ticks_total", "Frames computed and rendered.");
        describe_counter!(
            "playback_empty_total",
            "Starts that hit an empty timeline (no data)."
        );
        describe_gauge!("playback_cursor", "Buckets consumed by the current session.");
    });
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PlaybackState {
    /// Never started, or cancelled.
    Idle,
    /// Started with an empty timeline. Terminal.
    NoData,
    Running { cursor: usize, len: usize },
    Finished { frames: usize },
}

impl PlaybackState {
    pub fn is_finished(&self) -> bool {
        matches!(self, PlaybackState::Finished { .. })
    }

    /// True once the session can no longer change on its own.
    pub fn is_settled(&self) -> bool {
        !matches!(self, PlaybackState::Running { .. })
    }
}

#[derive(Debug, Clone)]
pub struct PlaybackCfg {
    /// Dashboard name, used as a log field and metric label.
    pub name: String,
    pub top_n: usize,
    pub tick_delay: Duration,
    pub labels: LabelFormatter,
    /// Shown by the renderer when the timeline is empty.
    pub empty_message: String,
}

/// A single run over one dataset.
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    timeline: Timeline,
    aggregator: Aggregator,
    cursor: usize,
    top_n: usize,
    labels: LabelFormatter,
}

impl PlaybackSession {
    pub fn new(timeline: Timeline, records: &[Record], top_n: usize, labels: LabelFormatter) -> Self {
        Self {
            timeline,
            aggregator: Aggregator::new(records),
            cursor: 0,
            top_n,
            labels,
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.timeline.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timeline.is_empty()
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.timeline.len()
    }

    pub fn totals(&self) -> &CumulativeState {
        self.aggregator.totals()
    }
}

impl Iterator for PlaybackSession {
    type Item = Frame;

    /// One tick: apply the bucket under the cursor, rank, label, advance.
    fn next(&mut self) -> Option<Frame> {
        let bucket = self.timeline.get(self.cursor)?.to_string();
        let applied = self.aggregator.apply_bucket(&bucket);
        let entries = top_n(self.aggregator.totals(), self.top_n)
            .into_iter()
            .map(|(key, value)| FrameEntry {
                label: self.labels.format(&key),
                value,
            })
            .collect();
        let frame = Frame {
            bucket_key: bucket,
            index: self.cursor,
            total: self.timeline.len(),
            entries,
        };
        self.cursor += 1;
        debug!(
            target: "playback",
            bucket = %frame.bucket_key,
            applied,
            shown = frame.entries.len(),
            "tick"
        );
        Some(frame)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.timeline.len().saturating_sub(self.cursor);
        (left, Some(left))
    }
}

/// Timer-driven playback for one chart. At most one session task is live.
pub struct PlaybackScheduler {
    cfg: PlaybackCfg,
    renderer: SharedRenderer,
    task: Option<JoinHandle<()>>,
    state: Arc<watch::Sender<PlaybackState>>,
}

impl PlaybackScheduler {
    pub fn new(cfg: PlaybackCfg, renderer: SharedRenderer) -> Self {
        ensure_metrics_described();
        let (tx, _rx) = watch::channel(PlaybackState::Idle);
        Self {
            cfg,
            renderer,
            task: None,
            state: Arc::new(tx),
        }
    }

    pub fn state(&self) -> PlaybackState {
        *self.state.borrow()
    }

    /// Watch state transitions (tests and the API wait on this).
    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.state.subscribe()
    }

    /// Run `f` against the renderer outside of a tick.
    pub fn with_renderer<T>(&self, f: impl FnOnce(&mut dyn Renderer) -> T) -> T {
        let mut guard = self.renderer.lock().expect("renderer mutex poisoned");
        f(&mut *guard)
    }

    /// Start a new session over `timeline`. Any previous session is cancelled
    /// first and can no longer reach the renderer once this returns.
    pub async fn start(&mut self, timeline: Timeline, records: &[Record]) {
        if matches!(self.state(), PlaybackState::Running { .. }) {
            warn!(target: "playback", dashboard = %self.cfg.name, "start while running; previous session superseded");
        }
        self.cancel().await;

        if timeline.is_empty() {
            counter!("playback_empty_total", "dashboard" => self.cfg.name.clone()).increment(1);
            self.with_renderer(|r| r.render_empty(&self.cfg.empty_message));
            self.state.send_replace(PlaybackState::NoData);
            info!(target: "playback", dashboard = %self.cfg.name, "no data; playback not started");
            return;
        }

        let len = timeline.len();
        let session = PlaybackSession::new(timeline, records, self.cfg.top_n, self.cfg.labels);
        counter!("playback_sessions_started_total", "dashboard" => self.cfg.name.clone())
            .increment(1);
        self.state
            .send_replace(PlaybackState::Running { cursor: 0, len });
        info!(
            target: "playback",
            dashboard = %self.cfg.name,
            buckets = len,
            delay_ms = self.cfg.tick_delay.as_millis() as u64,
            "session started"
        );

        self.task = Some(tokio::spawn(run_session(
            session,
            self.cfg.name.clone(),
            self.cfg.tick_delay,
            Arc::clone(&self.renderer),
            Arc::clone(&self.state),
        )));
    }

    /// Stop the current session, if any, and return to `Idle`. Totals and
    /// cursor of the old session are dropped with its task.
    pub async fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            let was_live = !task.is_finished();
            task.abort();
            // Cancelled (or already done); either way the task is gone after this.
            let _ = task.await;
            if was_live {
                counter!("playback_sessions_cancelled_total", "dashboard" => self.cfg.name.clone())
                    .increment(1);
                debug!(target: "playback", dashboard = %self.cfg.name, "session cancelled");
            }
        }
        self.state.send_replace(PlaybackState::Idle);
    }
}

impl Drop for PlaybackScheduler {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn run_session(
    mut session: PlaybackSession,
    name: String,
    delay: Duration,
    renderer: SharedRenderer,
    state: Arc<watch::Sender<PlaybackState>>,
) {
    let len = session.len();
    while let Some(frame) = session.next() {
        renderer
            .lock()
            .expect("renderer mutex poisoned")
            .render_frame(&frame);
        counter!("playback_ticks_total", "dashboard" => name.clone()).increment(1);
        gauge!("playback_cursor", "dashboard" => name.clone()).set(session.cursor() as f64);

        if session.is_finished() {
            break;
        }
        state.send_replace(PlaybackState::Running {
            cursor: session.cursor(),
            len,
        });
        tokio::time::sleep(delay).await;
    }
    state.send_replace(PlaybackState::Finished {
        frames: session.cursor(),
    });
    info!(target: "playback", dashboard = %name, frames = session.cursor(), "session finished");
}
