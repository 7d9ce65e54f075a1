//! Control unit configuration file.
//!
//! One TOML file: a `[cycle]` section for loop pacing and a `[drive]`
//! table holding every [`DriveConfig`] section. Missing sections take
//! defaults.
//!
//! ```toml
//! [cycle]
//! rate_hz = 1000
//! status_interval = 500
//!
//! [drive.limits]
//! max_current = 1.5
//! ```

use std::path::Path;

use quad_common::config::{ConfigError, ConfigLoader, DriveConfig};
use serde::{Deserialize, Serialize};

/// Loop pacing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CycleConfig {
    /// Tick rate [Hz].
    pub rate_hz: u32,
    /// Ticks between JSON status lines (0 = never).
    pub status_interval: u64,
    /// IMU filter rate passed to `setup_imu` [Hz].
    pub imu_filter_frequency: u32,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            rate_hz: 500,
            status_interval: 500,
            imu_filter_frequency: 500,
        }
    }
}

impl CycleConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rate_hz == 0 || self.rate_hz > 10_000 {
            return Err(ConfigError::ValidationError(format!(
                "cycle.rate_hz must be in 1..=10000, got {}",
                self.rate_hz
            )));
        }
        Ok(())
    }
}

/// Complete control unit configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default, deny_unknown_fields)]
pub struct ControlUnitConfig {
    pub cycle: CycleConfig,
    pub drive: DriveConfig,
}

impl ControlUnitConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.cycle.validate()?;
        self.drive.validate()
    }
}

/// Load and validate the configuration at `path`.
pub fn load_config(path: &Path) -> Result<ControlUnitConfig, ConfigError> {
    let config = ControlUnitConfig::load(path)?;
    config.validate()?;
    Ok(config)
}

/// Parse and validate a configuration held in memory.
pub fn load_config_from_str(content: &str) -> Result<ControlUnitConfig, ConfigError> {
    let config: ControlUnitConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    config.validate()?;
    Ok(config)
}
