//! # HTTP API
//! One handle per configured dashboard, addressed by name:
//! - `GET /health`, `GET /dashboards`
//! - `GET /dashboards/{name}/frame|snapshot|state` read the snapshot renderer
//!   and the state channel without taking the dashboard lock
//! - `POST /dashboards/{name}/records` and `POST /dashboards/{name}/theme`
//!   restart playback
//!
//! Unknown names are 404, payloads that cannot be played are 422.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::sync::{watch, Mutex};
use tower_http::cors::CorsLayer;

use crate::config::DashboardConfig;
use crate::dashboard::Dashboard;
use crate::error::LoadError;
use crate::playback::{shared_renderer, PlaybackState};
use crate::render::{Frame, Snapshot, SnapshotRenderer, Theme};
use crate::timeline::BucketPolicy;

/// Everything the API needs to reach one dashboard without holding its lock
/// for reads.
#[derive(Clone)]
pub struct DashboardHandle {
    pub config: Arc<DashboardConfig>,
    pub dashboard: Arc<Mutex<Dashboard>>,
    pub snapshot: SnapshotRenderer,
    pub state: watch::Receiver<PlaybackState>,
}

impl DashboardHandle {
    pub fn new(cfg: DashboardConfig, theme: Theme) -> Self {
        let snapshot = SnapshotRenderer::new();
        let dashboard = Dashboard::new(cfg.clone(), theme, shared_renderer(snapshot.clone()));
        let state = dashboard.subscribe();
        Self {
            config: Arc::new(cfg),
            dashboard: Arc::new(Mutex::new(dashboard)),
            snapshot,
            state,
        }
    }

    pub fn state(&self) -> PlaybackState {
        *self.state.borrow()
    }
}

#[derive(Clone, Default)]
pub struct AppState {
    dashboards: Arc<BTreeMap<String, DashboardHandle>>,
}

impl AppState {
    pub fn from_configs(configs: &[DashboardConfig], theme: Theme) -> Self {
        let dashboards = configs
            .iter()
            .map(|c| (c.name.clone(), DashboardHandle::new(c.clone(), theme)))
            .collect();
        Self {
            dashboards: Arc::new(dashboards),
        }
    }

    pub fn get(&self, name: &str) -> Option<&DashboardHandle> {
        self.dashboards.get(name)
    }

    pub fn handles(&self) -> impl Iterator<Item = &DashboardHandle> {
        self.dashboards.values()
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/dashboards", get(list_dashboards))
        .route("/dashboards/{name}/frame", get(latest_frame))
        .route("/dashboards/{name}/snapshot", get(latest_snapshot))
        .route("/dashboards/{name}/state", get(playback_state))
        .route("/dashboards/{name}/records", post(load_records))
        .route("/dashboards/{name}/theme", post(change_theme))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// JSON error body with a status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn not_found(name: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: format!("unknown dashboard '{name}'"),
        }
    }
}

impl From<LoadError> for ApiError {
    fn from(e: LoadError) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

fn handle<'a>(state: &'a AppState, name: &str) -> Result<&'a DashboardHandle, ApiError> {
    state.get(name).ok_or_else(|| ApiError::not_found(name))
}

#[derive(serde::Serialize)]
struct DashboardInfo {
    name: String,
    bucket_policy: BucketPolicy,
    top_n: usize,
    tick_delay_ms: u64,
    theme: Option<Theme>,
    playback: PlaybackState,
}

async fn list_dashboards(State(state): State<AppState>) -> Json<Vec<DashboardInfo>> {
    let out = state
        .handles()
        .map(|h| DashboardInfo {
            name: h.config.name.clone(),
            bucket_policy: h.config.bucket_policy,
            top_n: h.config.top_n,
            tick_delay_ms: h.config.tick_delay_ms,
            theme: h.snapshot.snapshot().theme,
            playback: h.state(),
        })
        .collect();
    Json(out)
}

async fn latest_frame(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Option<Frame>>, ApiError> {
    let h = handle(&state, &name)?;
    Ok(Json(h.snapshot.snapshot().frame))
}

async fn latest_snapshot(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Snapshot>, ApiError> {
    let h = handle(&state, &name)?;
    Ok(Json(h.snapshot.snapshot()))
}

async fn playback_state(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<PlaybackState>, ApiError> {
    let h = handle(&state, &name)?;
    Ok(Json(h.state()))
}

async fn load_records(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<PlaybackState>, ApiError> {
    let h = handle(&state, &name)?;
    let mut d = h.dashboard.lock().await;
    let st = d.load_json(&body).await?;
    tracing::info!(target: "api", dashboard = %name, state = ?st, "records posted");
    Ok(Json(st))
}

#[derive(serde::Deserialize)]
struct ThemeReq {
    theme: Theme,
}

async fn change_theme(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<ThemeReq>,
) -> Result<Json<PlaybackState>, ApiError> {
    let h = handle(&state, &name)?;
    let mut d = h.dashboard.lock().await;
    d.set_theme(req.theme)
        .await
        .map_err(|e| ApiError::from(LoadError::from(e)))?;
    Ok(Json(d.state()))
}
