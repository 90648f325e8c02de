// src/config/dashboards.rs
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::label::LabelFormatter;
use crate::playback::PlaybackCfg;
use crate::record::FieldMap;
use crate::timeline::{BucketPolicy, DEFAULT_MAX_SPAN_HOURS};

pub const ENV_CONFIG_PATH: &str = "RACE_CONFIG_PATH";
pub const DEFAULT_TOML_PATH: &str = "config/dashboards.toml";
pub const DEFAULT_JSON_PATH: &str = "config/dashboards.json";

fn default_top_n() -> usize {
    10
}
fn default_tick_delay_ms() -> u64 {
    1000
}
fn default_bucket_field() -> String {
    "hour".to_string()
}
fn default_count_field() -> String {
    "count".to_string()
}
fn default_max_span_hours() -> u32 {
    DEFAULT_MAX_SPAN_HOURS
}
fn default_fetch_timeout_secs() -> u64 {
    10
}
fn default_empty_message() -> String {
    "No data available yet".to_string()
}

/// Settings for one race chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardConfig {
    pub name: String,
    #[serde(default)]
    pub bucket_policy: BucketPolicy,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "default_tick_delay_ms")]
    pub tick_delay_ms: u64,
    #[serde(default = "default_bucket_field")]
    pub bucket_field: String,
    pub key_field: String,
    #[serde(default = "default_count_field")]
    pub count_field: String,
    #[serde(default)]
    pub labels: LabelFormatter,
    /// Upper bound on a gap-filled timeline, in hours.
    #[serde(default = "default_max_span_hours")]
    pub max_span_hours: u32,
    /// Upstream JSON endpoint; `None` means records are pushed via the API.
    #[serde(default)]
    pub data_url: Option<String>,
    /// Per-request timeout for `data_url`; there is a single attempt.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_empty_message")]
    pub empty_message: String,
}

impl DashboardConfig {
    /// Sessions per source IP, gap-filled hourly, fast cadence.
    pub fn ip_race() -> Self {
        Self {
            name: "ip-race".into(),
            bucket_policy: BucketPolicy::Contiguous,
            top_n: 10,
            tick_delay_ms: 500,
            bucket_field: default_bucket_field(),
            key_field: "ip".into(),
            count_field: default_count_field(),
            labels: LabelFormatter::Identity,
            max_span_hours: default_max_span_hours(),
            data_url: None,
            fetch_timeout_secs: default_fetch_timeout_secs(),
            empty_message: "No session data available yet".into(),
        }
    }

    /// Sessions per country, present hours only, slow cadence, flag labels.
    pub fn country_race() -> Self {
        Self {
            name: "country-race".into(),
            bucket_policy: BucketPolicy::Sparse,
            top_n: 10,
            tick_delay_ms: 2000,
            bucket_field: default_bucket_field(),
            key_field: "country_code".into(),
            count_field: default_count_field(),
            labels: LabelFormatter::CountryFlag,
            max_span_hours: default_max_span_hours(),
            data_url: None,
            fetch_timeout_secs: default_fetch_timeout_secs(),
            empty_message: "No country data available yet".into(),
        }
    }

    /// Built-in presets matching the two shipped dashboards.
    pub fn presets() -> Vec<Self> {
        vec![Self::ip_race(), Self::country_race()]
    }

    pub fn preset(name: &str) -> Option<Self> {
        Self::presets().into_iter().find(|c| c.name == name)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("dashboard name must not be empty");
        }
        if self.top_n == 0 {
            bail!("dashboard '{}': top_n must be > 0", self.name);
        }
        if self.tick_delay_ms == 0 {
            bail!("dashboard '{}': tick_delay_ms must be > 0", self.name);
        }
        if self.max_span_hours == 0 {
            bail!("dashboard '{}': max_span_hours must be > 0", self.name);
        }
        if self.fetch_timeout_secs == 0 {
            bail!("dashboard '{}': fetch_timeout_secs must be > 0", self.name);
        }
        for (what, v) in [
            ("bucket_field", &self.bucket_field),
            ("key_field", &self.key_field),
            ("count_field", &self.count_field),
        ] {
            if v.trim().is_empty() {
                bail!("dashboard '{}': {what} must not be empty", self.name);
            }
        }
        Ok(())
    }

    pub fn field_map(&self) -> FieldMap {
        FieldMap::new(&self.bucket_field, &self.key_field, &self.count_field)
    }

    pub fn playback_cfg(&self) -> PlaybackCfg {
        PlaybackCfg {
            name: self.name.clone(),
            top_n: self.top_n,
            tick_delay: Duration::from_millis(self.tick_delay_ms),
            labels: self.labels,
            empty_message: self.empty_message.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
struct DashboardsFile {
    dashboards: Vec<DashboardConfig>,
}

/// Load dashboards from an explicit path. Supports TOML or JSON formats.
pub fn load_dashboards_from(path: &Path) -> Result<Vec<DashboardConfig>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading dashboards from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let parsed = parse_dashboards(&content, ext.as_str())
        .with_context(|| format!("parsing {}", path.display()))?;
    check_all(parsed)
}

/// Load dashboards using env var + fallbacks:
/// 1) $RACE_CONFIG_PATH
/// 2) config/dashboards.toml
/// 3) config/dashboards.json
/// 4) built-in presets
pub fn load_dashboards_default() -> Result<Vec<DashboardConfig>> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_dashboards_from(&pb);
        } else {
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from(DEFAULT_TOML_PATH);
    if toml_p.exists() {
        return load_dashboards_from(&toml_p);
    }
    let json_p = PathBuf::from(DEFAULT_JSON_PATH);
    if json_p.exists() {
        return load_dashboards_from(&json_p);
    }
    tracing::debug!(target: "config", "no dashboards config found; using presets");
    Ok(DashboardConfig::presets())
}

fn parse_dashboards(s: &str, hint_ext: &str) -> Result<Vec<DashboardConfig>> {
    if hint_ext == "json" {
        let v: DashboardsFile = serde_json::from_str(s)?;
        return Ok(v.dashboards);
    }
    if hint_ext == "toml" {
        let v: DashboardsFile = toml::from_str(s)?;
        return Ok(v.dashboards);
    }
    // No usable hint: JSON first, then TOML.
    if let Ok(v) = serde_json::from_str::<DashboardsFile>(s) {
        return Ok(v.dashboards);
    }
    let v: DashboardsFile = toml::from_str(s).map_err(|e| anyhow!("unsupported dashboards format: {e}"))?;
    Ok(v.dashboards)
}

fn check_all(items: Vec<DashboardConfig>) -> Result<Vec<DashboardConfig>> {
    if items.is_empty() {
        bail!("no dashboards configured");
    }
    let mut seen = HashSet::new();
    for d in &items {
        d.validate()?;
        if !seen.insert(d.name.as_str()) {
            bail!("duplicate dashboard name '{}'", d.name);
        }
    }
    Ok(items)
}
