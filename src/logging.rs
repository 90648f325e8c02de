//! Tracing setup shared by the binaries.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Our events use short targets (`playback`, `render`, ...) rather than module
/// paths, so each one is listed.
pub const DEFAULT_FILTER: &str =
    "race_playback=info,playback=info,dashboard=info,render=info,source=info,api=info,timeline=info,config=info,warn";

/// Install a global subscriber. `RUST_LOG` overrides the default filter;
/// `RACE_LOG_JSON=1` switches to JSON lines. A subscriber that is already
/// installed (e.g. by the Shuttle runtime) is left alone.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let json = std::env::var("RACE_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    let res = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
