//! Configuration loading traits and types.
//!
//! `DriveConfig` holds every constant the drive core consumes: safety
//! limits, wiring signs, homing calibration, leg geometry and initial gains.
//! All fields default to the reference robot, so an empty TOML file is a
//! valid configuration.
//!
//! # TOML Example
//!
//! ```toml
//! [limits]
//! fault_current = 10.0
//! current_limit = 2.0
//!
//! [homing]
//! start_tolerance = 0.15
//! transition_duration_ms = 5000
//!
//! [legs]
//! upper_link_length = 0.08
//! lower_link_length = 0.11
//! ```

use std::f32::consts::PI;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::actuator::{ActuatorIndex, ActuatorPositionVector, JointKind};
use crate::consts::NUM_ACTUATORS;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Trait for loading configuration from TOML files.
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

// ─── Sections ───────────────────────────────────────────────────────

/// Current and motion safety thresholds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    /// Hard current gate [A]; commands beyond it latch `Error`.
    pub fault_current: f32,
    /// Calibrated position fault threshold [rad].
    pub fault_position: f32,
    /// Calibrated velocity fault threshold [rad/s].
    pub fault_velocity: f32,
    /// Saturation bound used while homing [A].
    pub current_limit: f32,
    /// Saturation bound at startup [A]. Zero keeps the drive limp until set.
    pub max_current: f32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            fault_current: 10.0,
            fault_position: PI,
            fault_velocity: 7.0,
            current_limit: 2.0,
            max_current: 0.0,
        }
    }
}

/// Fixed wiring signs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ActuatorConfig {
    /// Per-actuator direction multiplier (±1).
    pub direction_multipliers: [f32; NUM_ACTUATORS],
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            direction_multipliers: [
                -1.0, -1.0, 1.0, -1.0, 1.0, -1.0, -1.0, -1.0, 1.0, -1.0, 1.0, -1.0,
            ],
        }
    }
}

/// One value per joint kind, expanded to all four legs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct JointTriple {
    pub abduction: f32,
    pub hip: f32,
    pub knee: f32,
}

impl JointTriple {
    #[inline]
    pub const fn for_joint(&self, joint: JointKind) -> f32 {
        match joint {
            JointKind::Abduction => self.abduction,
            JointKind::Hip => self.hip,
            JointKind::Knee => self.knee,
        }
    }

    /// Per-actuator vector with `offset` added to every entry.
    pub fn expand(&self, offset: f32) -> ActuatorPositionVector {
        let mut out = [0.0; NUM_ACTUATORS];
        for i in ActuatorIndex::all() {
            out[i.as_usize()] = self.for_joint(i.joint()) + offset;
        }
        out
    }
}

/// Homing calibration constants.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct HomingConfig {
    /// Sign each actuator travels to find its hard stop (±1).
    pub directions: [f32; NUM_ACTUATORS],
    /// Gear backlash added to every hard-stop and initial angle [rad].
    pub backlash: f32,
    /// Joint angle at the hard stop, before backlash [rad].
    pub zero_command: JointTriple,
    /// Pose reached after homing, before backlash [rad].
    pub initial_position: JointTriple,
    /// Largest raw start position accepted [rad].
    pub start_tolerance: f32,
    /// Length of the post-homing blend [ms].
    pub transition_duration_ms: u64,
}

impl Default for HomingConfig {
    fn default() -> Self {
        Self {
            directions: [
                -1.0, 1.0, -1.0, 1.0, 1.0, -1.0, -1.0, 1.0, -1.0, 1.0, 1.0, -1.0,
            ],
            backlash: 2.0 / 80.0,
            zero_command: JointTriple {
                abduction: 0.0,
                hip: (90.0 - 30.0) * PI / 180.0,
                knee: (180.0 - 30.0) * PI / 180.0,
            },
            initial_position: JointTriple {
                abduction: 45.0 * PI / 180.0,
                hip: 90.0 * PI / 180.0,
                knee: (180.0 - 15.0) * PI / 180.0,
            },
            start_tolerance: 0.15,
            transition_duration_ms: 5000,
        }
    }
}

impl HomingConfig {
    /// Backlash-compensated hard-stop angle per actuator.
    pub fn zero_position_commands(&self) -> ActuatorPositionVector {
        self.zero_command.expand(self.backlash)
    }

    /// Backlash-compensated initial pose per actuator.
    pub fn initial_positions(&self) -> ActuatorPositionVector {
        self.initial_position.expand(self.backlash)
    }
}

/// Link geometry shared by all legs [m].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LegParameters {
    /// Lateral offset from abduction axis to the leg plane.
    pub abduction_offset: f32,
    /// Hip-to-knee length.
    pub upper_link_length: f32,
    /// Knee-to-foot length.
    pub lower_link_length: f32,
}

impl Default for LegParameters {
    fn default() -> Self {
        Self {
            abduction_offset: 0.03,
            upper_link_length: 0.08,
            lower_link_length: 0.11,
        }
    }
}

/// Hip placement relative to the body center [m].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct HipLayoutParameters {
    pub x_offset: f32,
    pub y_offset: f32,
    pub z_offset: f32,
}

impl Default for HipLayoutParameters {
    fn default() -> Self {
        Self {
            x_offset: 0.1,
            y_offset: 0.04,
            z_offset: 0.0,
        }
    }
}

/// Gains applied at startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default, deny_unknown_fields)]
pub struct GainsConfig {
    /// Joint PD proportional gain [A/rad].
    pub position_kp: f32,
    /// Joint PD derivative gain [A·s/rad].
    pub position_kd: f32,
    /// Cartesian proportional gain, row-major [N/m].
    pub cartesian_kp: [[f32; 3]; 3],
    /// Cartesian derivative gain, row-major [N·s/m].
    pub cartesian_kd: [[f32; 3]; 3],
}

/// Cartesian controller extras.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CartesianConfig {
    /// Knee angle above which a restoring torque is added [rad].
    pub knee_soft_limit: f32,
}

impl Default for CartesianConfig {
    fn default() -> Self {
        Self {
            knee_soft_limit: -PI / 6.0,
        }
    }
}

// ─── Top-Level Config ───────────────────────────────────────────────

/// Complete drive configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default, deny_unknown_fields)]
pub struct DriveConfig {
    pub limits: LimitsConfig,
    pub actuators: ActuatorConfig,
    pub homing: HomingConfig,
    pub legs: LegParameters,
    pub hips: HipLayoutParameters,
    pub gains: GainsConfig,
    pub cartesian: CartesianConfig,
}

impl DriveConfig {
    /// Load from TOML and validate.
    pub fn load_validated(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate parameter bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let l = &self.limits;
        for (name, value) in [
            ("fault_current", l.fault_current),
            ("fault_position", l.fault_position),
            ("fault_velocity", l.fault_velocity),
            ("current_limit", l.current_limit),
        ] {
            if !(value > 0.0) {
                return Err(invalid(format!("limits.{name} must be > 0, got {value}")));
            }
        }
        if l.max_current < 0.0 {
            return Err(invalid(format!(
                "limits.max_current must be >= 0, got {}",
                l.max_current
            )));
        }
        if l.current_limit > l.fault_current {
            return Err(invalid(format!(
                "limits.current_limit {} exceeds fault_current {}",
                l.current_limit, l.fault_current
            )));
        }

        check_signs("actuators.direction_multipliers", &self.actuators.direction_multipliers)?;
        check_signs("homing.directions", &self.homing.directions)?;

        if !(self.homing.start_tolerance > 0.0) {
            return Err(invalid(format!(
                "homing.start_tolerance must be > 0, got {}",
                self.homing.start_tolerance
            )));
        }
        if self.homing.transition_duration_ms == 0 {
            return Err(invalid("homing.transition_duration_ms must be > 0".to_string()));
        }
        if !(self.legs.upper_link_length > 0.0) || !(self.legs.lower_link_length > 0.0) {
            return Err(invalid(format!(
                "leg link lengths must be > 0, got upper={} lower={}",
                self.legs.upper_link_length, self.legs.lower_link_length
            )));
        }
        Ok(())
    }
}

fn check_signs(field: &str, values: &[f32; NUM_ACTUATORS]) -> Result<(), ConfigError> {
    match values.iter().position(|v| *v != 1.0 && *v != -1.0) {
        Some(i) => Err(invalid(format!(
            "{field}[{i}] must be 1 or -1, got {}",
            values[i]
        ))),
        None => Ok(()),
    }
}

fn invalid(msg: String) -> ConfigError {
    ConfigError::ValidationError(msg)
}
