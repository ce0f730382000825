//! Exporter configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::prometheus::SerializerConfig;

/// Configuration for the export pipeline, loadable from a TOML file.
///
/// All fields have defaults so an empty file (or no file at all) yields a
/// working exporter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExporterConfig {
    /// Prepended to every exported metric name as `<prefix>_`.
    pub prefix: Option<String>,
    /// Append record timestamps (milliseconds) to value lines.
    pub append_timestamp: bool,
    /// Seconds between collection cycles.
    pub interval_secs: u64,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            prefix: None,
            append_timestamp: true,
            interval_secs: 60,
        }
    }
}

impl ExporterConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ExporterConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn serializer_config(&self) -> SerializerConfig {
        SerializerConfig {
            prefix: self.prefix.clone(),
            append_timestamp: self.append_timestamp,
        }
    }
}
