use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::NodeRendering;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid panel config: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Tunables of the profile panel. Missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    /// Quiet period after the last focus-query edit before re-highlighting.
    pub debounce_ms: u64,
    /// Space above the flamegraph body reserved for the panel heading.
    pub header_height: f64,
    /// Height of one flamegraph row.
    pub node_height: f64,
    /// Callsites narrower than this many pixels are folded into `[merged]`
    /// nodes. Zero disables merging.
    pub merge_min_pixels: f64,
    pub rendering: NodeRendering,
}

impl PanelConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 20,
            header_height: 30.0,
            node_height: 20.0,
            merge_min_pixels: 0.0,
            rendering: NodeRendering::self_and_total(),
        }
    }
}
