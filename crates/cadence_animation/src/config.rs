//! Frame clock configuration
//!
//! ```toml
//! [clock]
//! target_fps = 60
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CadenceError, Result};

/// Configuration for clocks that pace ticks themselves
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Ticks delivered per second
    pub target_fps: u32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self { target_fps: 120 }
    }
}

impl ClockConfig {
    pub fn new(target_fps: u32) -> Result<Self> {
        let config = Self { target_fps };
        config.validate()?;
        Ok(config)
    }

    /// Parse a `ClockConfig` from a TOML document containing its fields at the top level
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: ClockConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.target_fps == 0 {
            return Err(CadenceError::InvalidTargetFps(self.target_fps));
        }
        Ok(())
    }

    /// Wall-clock time between two ticks
    pub fn frame_interval(&self) -> Duration {
        Duration::from_micros(1_000_000 / u64::from(self.target_fps.max(1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_120fps() {
        let config = ClockConfig::default();
        assert_eq!(config.target_fps, 120);
        assert_eq!(config.frame_interval(), Duration::from_micros(8333));
    }

    #[test]
    fn test_from_toml() {
        let config = ClockConfig::from_toml_str("target_fps = 60").unwrap();
        assert_eq!(config.target_fps, 60);

        // Missing fields fall back to defaults
        let config = ClockConfig::from_toml_str("").unwrap();
        assert_eq!(config, ClockConfig::default());
    }

    #[test]
    fn test_zero_fps_rejected() {
        assert!(matches!(
            ClockConfig::from_toml_str("target_fps = 0"),
            Err(CadenceError::InvalidTargetFps(0))
        ));
        assert!(ClockConfig::new(0).is_err());
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            ClockConfig::from_toml_str("target_fps = \"fast\""),
            Err(CadenceError::Config(_))
        ));
    }
}
