//! Fault and bus error types.
//!
//! Every `DriveFault` forces the control mode to `Error`; none are retried.

use thiserror::Error;

use crate::bus::{BusId, Subgroup};

/// Failure reported by an actuator bus collaborator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BusError {
    /// Torque frame rejected by the transport.
    #[error("{bus:?} bus rejected torque frame for {subgroup:?}: {reason}")]
    CommandRejected {
        bus: BusId,
        subgroup: Subgroup,
        reason: String,
    },
}

/// Safety fault detected by the drive core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DriveFault {
    /// Calibrated position beyond `fault_position`.
    #[error("actuator[{index}] hit fault position: |{position}| > {limit}")]
    PositionFault { index: u8, position: f32, limit: f32 },

    /// Calibrated velocity beyond `fault_velocity`.
    #[error("actuator[{index}] hit fault velocity: |{velocity}| > {limit}")]
    VelocityFault { index: u8, velocity: f32, limit: f32 },

    /// Clamped current command beyond `fault_current`.
    #[error("requested current too large: actuator[{index}] |{current}| > {limit}")]
    CurrentFault { index: u8, current: f32, limit: f32 },

    /// Homing started too far from the expected zero.
    #[error("initial position is not zero: actuator[{index}] |{position}| > {tolerance}")]
    HomingPositionWarning {
        index: u8,
        position: f32,
        tolerance: f32,
    },

    /// Actuator index outside `0..=11`.
    #[error("invalid actuator index {0}, must be 0<=i<=11")]
    InvalidActuatorIndex(u8),

    /// Torque dispatch failed on a bus.
    #[error("bus fault: {0}")]
    Bus(#[from] BusError),
}
