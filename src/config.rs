use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::analysis::ExploreConfig;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct AnalysisConfig {
    /// Upper bound on visited markings; unbounded when absent.
    #[serde(default)]
    pub state_limit: Option<usize>,
    /// Wall-clock budget for exploration in milliseconds.
    #[serde(default)]
    pub time_limit_ms: Option<u64>,
    /// Keep empty places when rendering markings in reports.
    #[serde(default = "default_include_zero_tokens")]
    pub include_zero_tokens: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            state_limit: None,
            time_limit_ms: None,
            include_zero_tokens: default_include_zero_tokens(),
        }
    }
}

impl AnalysisConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("config file {:?} not found, using defaults", path);
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn explore_config(&self) -> ExploreConfig {
        ExploreConfig {
            state_limit: self.state_limit,
            time_limit: self.time_limit_ms.map(Duration::from_millis),
        }
    }
}

fn default_include_zero_tokens() -> bool {
    true
}
