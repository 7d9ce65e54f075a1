//! Collaborator contracts consumed by the drive core.
//!
//! This module defines:
//! - `ActuatorBus` trait - Interface for the two actuator buses
//! - `ActuatorTelemetry` struct - Cached per-motor feedback
//! - `Subgroup` enum - Torque frame addressing
//! - `OrientationSensor` trait - Body orientation source
//!
//! # Timing Contracts
//!
//! | Operation          | RT Constraint              |
//! |--------------------|----------------------------|
//! | `poll()`           | bounded, once per tick     |
//! | `get()`            | cached read, no I/O        |
//! | `command_torques()`| bounded, no retries        |

use serde::{Deserialize, Serialize};

use crate::consts::ACTUATORS_PER_SUBGROUP;
use crate::error::BusError;

/// Physical bus identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BusId {
    /// Actuators 0-5 (front legs).
    Front,
    /// Actuators 6-11 (rear legs).
    Rear,
}

/// Address block targeted by one torque frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subgroup {
    /// Motor IDs 0-3 on the bus.
    IdZeroToThree,
    /// Motor IDs 4-7 on the bus (only 4 and 5 are populated).
    IdFourToSeven,
}

impl Subgroup {
    /// First bus-local motor index addressed by this subgroup.
    #[inline]
    pub const fn first_local(self) -> usize {
        match self {
            Self::IdZeroToThree => 0,
            Self::IdFourToSeven => ACTUATORS_PER_SUBGROUP,
        }
    }
}

/// Latest feedback of one motor as reported by its controller.
///
/// Values are in the motor's own frame (no zero offset or direction sign).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ActuatorTelemetry {
    /// Output shaft position [rad].
    pub position: f32,
    /// Output shaft velocity [rad/s].
    pub velocity: f32,
    /// Measured current [A].
    pub current: f32,
    /// Electrical input power [W].
    pub electrical_power: f32,
    /// Mechanical output power [W].
    pub mechanical_power: f32,
}

/// One actuator bus carrying six motor controllers.
///
/// Implementations cache telemetry in `poll()`; `get()` must not block.
pub trait ActuatorBus {
    /// Refresh cached telemetry. Call once per tick before reads.
    fn poll(&mut self);

    /// Cached telemetry for bus-local motor `local_index` (0..=5).
    ///
    /// Out-of-range indices return zeroed telemetry.
    fn get(&self, local_index: usize) -> ActuatorTelemetry;

    /// Send up to four signed milli-amp commands to `subgroup`.
    fn command_torques(
        &mut self,
        torques: [i32; ACTUATORS_PER_SUBGROUP],
        subgroup: Subgroup,
    ) -> Result<(), BusError>;
}

/// Latest orientation sample [rad, rad/s].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Orientation {
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
    pub yaw_rate: f32,
    pub pitch_rate: f32,
    pub roll_rate: f32,
}

/// Body orientation source.
pub trait OrientationSensor {
    /// Configure the fusion filter rate [Hz].
    fn setup(&mut self, filter_frequency: u32);

    /// Read and fuse the next sample.
    fn update(&mut self);

    /// Latest fused sample.
    fn orientation(&self) -> Orientation;
}
