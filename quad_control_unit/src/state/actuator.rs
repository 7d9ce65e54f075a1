//! Actuator state model.
//!
//! Converts raw bus telemetry into the calibrated joint frame:
//!
//! ```text
//! position = (raw − zero[i]) · direction[i]
//! velocity =  raw_vel        · direction[i]
//! current  =  raw_current    · direction[i]
//! ```
//!
//! Holds zero offsets, wiring signs, homed flags and the active mask.

use quad_common::actuator::{ActuatorActivations, ActuatorIndex, ActuatorPositionVector, AxisGroup};
use quad_common::bus::ActuatorTelemetry;
use quad_common::consts::NUM_ACTUATORS;

/// Telemetry of one actuator in the calibrated joint frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CalibratedTelemetry {
    pub position: f32,
    pub velocity: f32,
    pub current: f32,
}

/// Calibration state of all actuators.
#[derive(Debug, Clone)]
pub struct ActuatorStateModel {
    zero: ActuatorPositionVector,
    direction: [f32; NUM_ACTUATORS],
    homed: [bool; NUM_ACTUATORS],
    active: ActuatorActivations,
}

impl ActuatorStateModel {
    /// Zero offsets at 0, nothing homed, nothing active.
    pub fn new(direction: [f32; NUM_ACTUATORS]) -> Self {
        Self {
            zero: [0.0; NUM_ACTUATORS],
            direction,
            homed: [false; NUM_ACTUATORS],
            active: [false; NUM_ACTUATORS],
        }
    }

    #[inline]
    pub fn calibrated_position(&self, index: ActuatorIndex, raw: f32) -> f32 {
        let i = index.as_usize();
        (raw - self.zero[i]) * self.direction[i]
    }

    #[inline]
    pub fn calibrate(&self, index: ActuatorIndex, raw: &ActuatorTelemetry) -> CalibratedTelemetry {
        let dir = self.direction[index.as_usize()];
        CalibratedTelemetry {
            position: self.calibrated_position(index, raw.position),
            velocity: raw.velocity * dir,
            current: raw.current * dir,
        }
    }

    #[inline]
    pub fn directions(&self) -> &[f32; NUM_ACTUATORS] {
        &self.direction
    }

    #[inline]
    pub fn zero_positions(&self) -> &ActuatorPositionVector {
        &self.zero
    }

    /// Overwrite all zero offsets.
    pub fn set_zero(&mut self, zero: ActuatorPositionVector) {
        self.zero = zero;
    }

    #[inline]
    pub fn active_mask(&self) -> &ActuatorActivations {
        &self.active
    }

    /// Overwrite the whole active mask.
    pub fn set_active_mask(&mut self, mask: ActuatorActivations) {
        self.active = mask;
    }

    pub fn clear_homed(&mut self) {
        self.homed = [false; NUM_ACTUATORS];
    }

    pub fn mark_all_homed(&mut self) {
        self.homed = [true; NUM_ACTUATORS];
    }

    /// True iff every member of `group` is homed.
    pub fn is_homed(&self, group: AxisGroup) -> bool {
        group.actuators().all(|i| self.homed[i.as_usize()])
    }
}
