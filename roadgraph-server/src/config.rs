//! Server configuration from a TOML file with command line overrides.

use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use roadgraph_core::GraphBuildConfig;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub store: StoreConfig,
    pub build: GraphBuildConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding the CSV exports of the spatial store
    pub data_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub listen: SocketAddr,
    pub request_timeout_secs: u64,
    pub max_concurrent_requests: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 8080)),
            request_timeout_secs: 30,
            max_concurrent_requests: 64,
        }
    }
}

impl HttpConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Values given on the command line; each replaces its file counterpart
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub data_dir: Option<PathBuf>,
    pub snapshot: Option<PathBuf>,
    pub workers: Option<usize>,
    pub listen: Option<SocketAddr>,
}

impl ServerConfig {
    /// Reads `path`, or returns the defaults when no file is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    #[must_use]
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(data_dir) = overrides.data_dir {
            self.store.data_dir = data_dir;
        }
        if let Some(snapshot) = overrides.snapshot {
            self.build.snapshot_path = snapshot;
        }
        if let Some(workers) = overrides.workers {
            self.build.workers = workers;
        }
        if let Some(listen) = overrides.listen {
            self.http.listen = listen;
        }
        self
    }
}
