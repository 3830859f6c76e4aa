use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{Error, geometry::DEFAULT_ON_LINE_TOLERANCE};

/// Settings of one graph build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphBuildConfig {
    /// Where the finished graph is written
    pub snapshot_path: PathBuf,
    /// Cache of gathered intersection and place facts, reused on restart
    pub raw_facts_path: PathBuf,
    /// Rows requested from the spatial store per page
    pub page_size: usize,
    /// Geometry workers; defaults to the available parallelism
    pub workers: usize,
    /// Milliseconds between dispatcher progress reports
    pub poll_interval: u64,
    pub on_line_tolerance: f64,
}

impl Default for GraphBuildConfig {
    fn default() -> Self {
        Self {
            snapshot_path: PathBuf::from("road_graph.json"),
            raw_facts_path: PathBuf::from("raw_road_facts.json"),
            page_size: 100_000,
            workers: std::thread::available_parallelism().map_or(1, usize::from),
            poll_interval: 10_000,
            on_line_tolerance: DEFAULT_ON_LINE_TOLERANCE,
        }
    }
}

impl GraphBuildConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.page_size == 0 {
            return Err(Error::InvalidData("page_size must be positive".to_string()));
        }
        if self.workers == 0 {
            return Err(Error::InvalidData("workers must be positive".to_string()));
        }
        if self.poll_interval == 0 {
            return Err(Error::InvalidData("poll_interval must be positive".to_string()));
        }
        if self.snapshot_path == self.raw_facts_path {
            return Err(Error::InvalidData(format!(
                "snapshot_path and raw_facts_path both point at {}",
                self.snapshot_path.display()
            )));
        }
        if !(self.on_line_tolerance.is_finite() && self.on_line_tolerance >= 0.0) {
            return Err(Error::InvalidData(format!(
                "on_line_tolerance must be a non-negative number, got {}",
                self.on_line_tolerance
            )));
        }
        for path in [&self.snapshot_path, &self.raw_facts_path] {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
                && !parent.exists()
            {
                return Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("Directory not found: {}", parent.display()),
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_fills_defaults() {
        let config: GraphBuildConfig =
            serde_json::from_str(r#"{"page_size": 10, "workers": 3}"#).unwrap();
        assert_eq!(config.page_size, 10);
        assert_eq!(config.workers, 3);
        assert_eq!(config.poll_interval(), Duration::from_secs(10));
        assert_eq!(config.on_line_tolerance, DEFAULT_ON_LINE_TOLERANCE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_workers_and_missing_directories() {
        let config = GraphBuildConfig {
            workers: 0,
            ..GraphBuildConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidData(_))));

        let config = GraphBuildConfig {
            snapshot_path: PathBuf::from("/definitely/not/here/graph.json"),
            ..GraphBuildConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::Io(_))));
    }

    #[test]
    fn rejects_zero_poll_interval() {
        let config = GraphBuildConfig {
            poll_interval: 0,
            ..GraphBuildConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidData(_))));
    }

    #[test]
    fn snapshot_must_not_overwrite_fact_cache() {
        let config = GraphBuildConfig {
            snapshot_path: PathBuf::from("same.json"),
            raw_facts_path: PathBuf::from("same.json"),
            ..GraphBuildConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidData(_))));
    }
}
