//! Race Playback Service: Binary Entrypoint
//! Boots the Axum HTTP server: one playback dashboard per configured race,
//! initial data fetch in the background, Prometheus metrics on `/metrics`.

use anyhow::Context;
use shuttle_axum::ShuttleAxum;

use race_playback::config::load_dashboards_default;
use race_playback::metrics::Metrics;
use race_playback::{api, logging, spawn_initial_fetches, AppState, Theme};

/// Initial chart theme from `RACE_THEME` (dark|light); dark when unset or invalid.
fn initial_theme() -> Theme {
    match std::env::var("RACE_THEME") {
        Ok(v) => v.parse().unwrap_or_else(|e| {
            tracing::warn!("{e}; falling back to dark");
            Theme::Dark
        }),
        Err(_) => Theme::Dark,
    }
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    logging::init_tracing();

    let configs = load_dashboards_default().context("loading dashboards config")?;
    let metrics = Metrics::init(configs.len())?;

    let state = AppState::from_configs(&configs, initial_theme());
    let fetches = spawn_initial_fetches(&state);
    tracing::info!(
        dashboards = configs.len(),
        fetching = fetches.len(),
        "race playback service ready"
    );

    let router = api::create_router(state).merge(metrics.router());
    Ok(router.into())
}
