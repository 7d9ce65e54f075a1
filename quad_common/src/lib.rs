//! Quadruped drive common library.
//!
//! Shared constants, types, collaborator traits and configuration loading
//! for all workspace crates.
//!
//! # Module Structure
//!
//! - [`consts`] - Actuator counts, telemetry sizes, fixed-point scale
//! - [`actuator`] - `ActuatorIndex`, per-actuator vectors, axis groups
//! - [`mode`] - `ControlMode` enum
//! - [`error`] - Fault and bus error types
//! - [`bus`] - Actuator bus and orientation sensor collaborator traits
//! - [`telemetry`] - Flat debug snapshot layout and `DriveStatus`
//! - [`config`] - TOML configuration (`DriveConfig`, `ConfigLoader`)

pub mod actuator;
pub mod bus;
pub mod config;
pub mod consts;
pub mod error;
pub mod mode;
pub mod telemetry;

pub mod prelude {
    //! Common re-exports.
    pub use crate::actuator::{
        ActuatorActivations, ActuatorCurrentVector, ActuatorIndex, ActuatorPositionVector,
        ActuatorVelocityVector, AxisGroup, JointKind,
    };
    pub use crate::bus::{ActuatorBus, ActuatorTelemetry, BusId, Orientation, OrientationSensor, Subgroup};
    pub use crate::config::{ConfigError, ConfigLoader, DriveConfig};
    pub use crate::consts::*;
    pub use crate::error::{BusError, DriveFault};
    pub use crate::mode::ControlMode;
    pub use crate::telemetry::DriveStatus;
}
