// src/source.rs
//! Upstream record sources. The playback core does no I/O; these feed it.
//! One attempt per fetch: failures are reported to the dashboard, which
//! shows the error placeholder.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::config::DashboardConfig;
use crate::dashboard::Dashboard;
use crate::record::{FieldMap, Record};

#[async_trait::async_trait]
pub trait RecordSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<Record>>;
    fn name(&self) -> String;
}

/// GET a JSON array from an HTTP endpoint.
#[derive(Clone)]
pub struct HttpSource {
    url: String,
    fields: FieldMap,
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpSource {
    pub fn new(url: impl Into<String>, fields: FieldMap) -> Self {
        Self {
            url: url.into(),
            fields,
            client: reqwest::Client::new(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    /// Source for a dashboard's `data_url`, if it has one.
    pub fn for_dashboard(cfg: &DashboardConfig) -> Option<Self> {
        let url = cfg.data_url.clone()?;
        Some(Self::new(url, cfg.field_map()).with_timeout(cfg.fetch_timeout_secs))
    }
}

#[async_trait::async_trait]
impl RecordSource for HttpSource {
    async fn fetch(&self) -> Result<Vec<Record>> {
        let resp = self
            .client
            .get(&self.url)
            .timeout(self.timeout)
            .send()
            .await
            .with_context(|| format!("GET {}", self.url))?
            .error_for_status()
            .with_context(|| format!("GET {}", self.url))?;
        let body = resp.text().await.context("read response body")?;
        let records = self
            .fields
            .decode_str(&body)
            .with_context(|| format!("decode payload from {}", self.url))?;
        Ok(records)
    }

    fn name(&self) -> String {
        self.url.clone()
    }
}

/// Read a JSON array from disk (CLI playback, fixtures).
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    fields: FieldMap,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>, fields: FieldMap) -> Self {
        Self {
            path: path.into(),
            fields,
        }
    }
}

#[async_trait::async_trait]
impl RecordSource for FileSource {
    async fn fetch(&self) -> Result<Vec<Record>> {
        let body = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("reading {}", self.path.display()))?;
        let records = self
            .fields
            .decode_str(&body)
            .with_context(|| format!("decode {}", self.path.display()))?;
        Ok(records)
    }

    fn name(&self) -> String {
        self.path.display().to_string()
    }
}

/// Fetch once and hand the result to the dashboard: success loads and starts
/// playback, failure shows the error placeholder.
pub async fn fetch_into(source: &dyn RecordSource, dashboard: &Mutex<Dashboard>) {
    match source.fetch().await {
        Ok(records) => {
            let mut d = dashboard.lock().await;
            if let Err(e) = d.load(records).await {
                tracing::warn!(target: "source", source = %source.name(), error = %e, "payload rejected");
            }
        }
        Err(e) => {
            tracing::warn!(target: "source", source = %source.name(), error = ?e, "fetch failed");
            dashboard.lock().await.fail(&format!("{e:#}")).await;
        }
    }
}

/// Background variant of [`fetch_into`] used by the server at boot.
pub fn spawn_fetch(source: Box<dyn RecordSource>, dashboard: Arc<Mutex<Dashboard>>) -> JoinHandle<()> {
    tokio::spawn(async move { fetch_into(source.as_ref(), &dashboard).await })
}
