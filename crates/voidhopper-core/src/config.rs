//! Hopper configuration.
//!
//! Every field has a default, so a config file only needs the settings it
//! changes. A missing file means "all defaults".

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Default persistence file name
pub const DEFAULT_DATA_FILE: &str = "vacuum-hoppers.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HopperConfig {
    /// Half-size of the cubic scan box around the node centre
    pub vacuum_radius: f64,
    /// Per-node cap on units routed in a single pass
    pub transfer_rate: u32,
    /// Maximum link endpoints per node
    pub max_links: usize,
    /// Host ticks between passes
    pub tick_interval: u32,
    /// Host ticks before the first pass
    pub initial_delay: u32,
    /// Units with a longer remaining pickup delay are left for players
    pub pickup_grace_ticks: u32,
    /// Speed of the pull applied to units nothing accepted
    pub pull_strength: f64,
    /// No pull inside this distance of the node centre
    pub pull_min_distance: f64,
    /// Registry file
    pub data_file: PathBuf,
}

impl Default for HopperConfig {
    fn default() -> Self {
        Self {
            vacuum_radius: 8.0,
            transfer_rate: 64,
            max_links: 8,
            tick_interval: 8,
            initial_delay: 20,
            pickup_grace_ticks: 40,
            pull_strength: 0.3,
            pull_min_distance: 1.5,
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
        }
    }
}

impl HopperConfig {
    /// Load from a JSON file; a missing file yields defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(config.validate())
    }

    /// Clamp values that would stall or invert the simulation
    pub fn validate(mut self) -> Self {
        if self.tick_interval == 0 {
            log::warn!("tick_interval 0 is invalid, using 1");
            self.tick_interval = 1;
        }
        if !self.vacuum_radius.is_finite() || self.vacuum_radius < 0.0 {
            log::warn!("vacuum_radius {} is invalid, using 0", self.vacuum_radius);
            self.vacuum_radius = 0.0;
        }
        if !self.pull_strength.is_finite() || self.pull_strength < 0.0 {
            self.pull_strength = 0.0;
        }
        if !self.pull_min_distance.is_finite() || self.pull_min_distance < 0.0 {
            self.pull_min_distance = 0.0;
        }
        self
    }
}
