//! Configuration loading for the stepgen binary.
//!
//! Reads a TOML file with `[source]` and `[driver]` tables. Every field has a
//! default, so an absent file or table means defaults.

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub driver: DriverConfig,
}

/// Shape of the simulated paginated source.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SourceConfig {
    #[serde(default = "default_total_items")]
    pub total_items: usize,

    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Per-page fetch latency in milliseconds, applied round-robin.
    #[serde(default)]
    pub latency_ms: Vec<u64>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            total_items: default_total_items(),
            page_size: default_page_size(),
            latency_ms: Vec::new(),
        }
    }
}

impl SourceConfig {
    pub fn latency(&self) -> Vec<Duration> {
        self.latency_ms.iter().copied().map(Duration::from_millis).collect()
    }
}

fn default_total_items() -> usize {
    10
}

fn default_page_size() -> usize {
    3
}

#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq)]
pub struct DriverConfig {
    /// Stop after this many values (the rest is cleaned up, not consumed).
    pub limit: Option<usize>,

    /// Abandon and force-return the generator when one step takes longer.
    pub step_timeout_ms: Option<u64>,
}

impl DriverConfig {
    pub fn step_timeout(&self) -> Option<Duration> {
        self.step_timeout_ms.map(Duration::from_millis)
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.source.page_size == 0 {
            bail!("source.page_size must be at least 1");
        }
        if self.driver.step_timeout_ms == Some(0) {
            bail!("driver.step_timeout_ms must be positive");
        }
        Ok(())
    }
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).context("invalid stepgen configuration")?;
    config.validate()?;
    Ok(config)
}

/// Load configuration from `path`, or defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    parse_config(&content).with_context(|| format!("in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_tables_missing() {
        let config = parse_config("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.source.total_items, 10);
        assert_eq!(config.source.page_size, 3);
        assert!(config.driver.limit.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let config = parse_config(
            r#"
[source]
total_items = 25
page_size = 5
latency_ms = [30, 5]

[driver]
limit = 12
step_timeout_ms = 500
"#,
        )
        .unwrap();
        assert_eq!(config.source.total_items, 25);
        assert_eq!(
            config.source.latency(),
            vec![Duration::from_millis(30), Duration::from_millis(5)]
        );
        assert_eq!(config.driver.limit, Some(12));
        assert_eq!(config.driver.step_timeout(), Some(Duration::from_millis(500)));
    }

    #[test]
    fn test_rejects_zero_page_size() {
        let err = parse_config("[source]\npage_size = 0\n").unwrap_err();
        assert!(err.to_string().contains("page_size"));
    }

    #[test]
    fn test_load_without_path_is_default() {
        assert_eq!(load_config(None).unwrap(), Config::default());
    }
}
