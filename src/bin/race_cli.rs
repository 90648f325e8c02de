//! Play a race from a JSON file in the terminal (frames go to the log).
//!
//! ```text
//! race_cli --dashboard country-race --file fixtures/country.json --delay-ms 50
//! ```

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::path::PathBuf;

use race_playback::config::{load_dashboards_default, DashboardConfig};
use race_playback::playback::shared_renderer;
use race_playback::render::TracingRenderer;
use race_playback::source::{FileSource, RecordSource};
use race_playback::{logging, Dashboard, PlaybackState, Theme};

#[derive(Parser, Debug)]
#[command(name = "race_cli")]
#[command(about = "Replay hourly race data as ranked frames")]
struct Args {
    /// Dashboard name from the config (or a built-in preset)
    #[arg(short, long, default_value = "ip-race")]
    dashboard: String,

    /// JSON array of records
    #[arg(short, long)]
    file: PathBuf,

    /// Override the configured tick delay
    #[arg(long)]
    delay_ms: Option<u64>,

    #[arg(long, default_value = "dark")]
    theme: Theme,
}

fn resolve(name: &str) -> Result<DashboardConfig> {
    let configured = load_dashboards_default()?;
    configured
        .into_iter()
        .find(|c| c.name == name)
        .or_else(|| DashboardConfig::preset(name))
        .ok_or_else(|| anyhow!("unknown dashboard '{name}'"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    logging::init_tracing();
    let args = Args::parse();

    let mut cfg = resolve(&args.dashboard)?;
    if let Some(ms) = args.delay_ms {
        cfg.tick_delay_ms = ms;
    }
    cfg.validate()?;

    let source = FileSource::new(&args.file, cfg.field_map());
    let records = source.fetch().await.context("loading records")?;

    let renderer = shared_renderer(TracingRenderer::new(cfg.name.clone()));
    let mut dashboard = Dashboard::new(cfg, args.theme, renderer);
    let mut rx = dashboard.subscribe();
    dashboard.load(records).await?;

    let last = *rx
        .wait_for(PlaybackState::is_settled)
        .await
        .context("playback state channel closed")?;
    dashboard.shutdown().await;

    match last {
        PlaybackState::Finished { frames } => println!("race finished after {frames} frames"),
        PlaybackState::NoData => println!("no data"),
        other => println!("stopped: {other:?}"),
    }
    Ok(())
}
