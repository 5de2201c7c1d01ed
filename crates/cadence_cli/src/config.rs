//! Cadence configuration file handling
//!
//! `cadence.toml` holds the settings for the real-time runner:
//!
//! ```toml
//! [clock]
//! target_fps = 60
//! ```

use anyhow::{Context, Result};
use cadence_animation::ClockConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct CadenceConfig {
    #[serde(default)]
    pub clock: ClockConfig,
}

impl CadenceConfig {
    /// Load from `path`, or use defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;

        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: CadenceConfig = toml::from_str(content).context("Failed to parse TOML")?;
        config.clock.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}
