//! Telemetry snapshot layout.
//!
//! The core defines field order and count; wire encoding belongs to the
//! external serializer.
//!
//! Flat layout (`NUM_DEBUG_VALUES` = 91):
//!
//! | Offset     | Content                                            |
//! |------------|----------------------------------------------------|
//! | 0          | timestamp [ms]                                     |
//! | 1..=6      | yaw, pitch, roll, yaw_rate, pitch_rate, roll_rate  |
//! | 7 + 7i ... | actuator i: p, v, I, pr, vr, Ir, Il                |

use serde::{Deserialize, Serialize};

use crate::actuator::{ActuatorCurrentVector, ActuatorPositionVector, ActuatorVelocityVector};
use crate::bus::Orientation;
use crate::consts::{NUM_ACTUATORS, NUM_DEBUG_VALUES, NUM_ORIENTATION_VALUES, NUM_VALUES_PER_ACTUATOR};
use crate::mode::ControlMode;

/// Short labels of the per-actuator block, in snapshot order.
pub const ACTUATOR_FIELD_LABELS: [&str; NUM_VALUES_PER_ACTUATOR] =
    ["p", "v", "I", "pr", "vr", "Ir", "Il"];

/// Orientation labels, in snapshot order.
pub const ORIENTATION_LABELS: [&str; NUM_ORIENTATION_VALUES] =
    ["yaw", "pitch", "roll", "yaw_rate", "pitch_rate", "roll_rate"];

/// Offset of actuator `i`'s block in the flat snapshot.
#[inline]
pub const fn actuator_block_offset(i: usize) -> usize {
    1 + NUM_ORIENTATION_VALUES + i * NUM_VALUES_PER_ACTUATOR
}

/// Column names matching the flat snapshot, e.g. `T, yaw, ..., p[0], v[0], ...`.
pub fn debug_header() -> Vec<String> {
    let mut header = Vec::with_capacity(NUM_DEBUG_VALUES);
    header.push("T".to_string());
    header.extend(ORIENTATION_LABELS.iter().map(|s| s.to_string()));
    for i in 0..NUM_ACTUATORS {
        header.extend(ACTUATOR_FIELD_LABELS.iter().map(|label| format!("{label}[{i}]")));
    }
    header
}

/// Structured status report for external serializers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriveStatus {
    /// Timestamp [ms].
    pub ts: u64,
    pub mode: ControlMode,
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
    pub yaw_rate: f32,
    pub pitch_rate: f32,
    pub roll_rate: f32,
    /// Calibrated positions.
    pub pos: ActuatorPositionVector,
    /// Calibrated velocities.
    pub vel: ActuatorVelocityVector,
    /// Calibrated currents.
    pub cur: ActuatorCurrentVector,
    /// Joint position references.
    pub pref: ActuatorPositionVector,
    /// Joint velocity references.
    pub vref: ActuatorVelocityVector,
    /// Current references.
    pub cref: ActuatorCurrentVector,
    /// Last current actually commanded.
    pub lcur: ActuatorCurrentVector,
}

impl DriveStatus {
    /// Orientation portion of the report.
    pub fn orientation(&self) -> Orientation {
        Orientation {
            yaw: self.yaw,
            pitch: self.pitch,
            roll: self.roll,
            yaw_rate: self.yaw_rate,
            pitch_rate: self.pitch_rate,
            roll_rate: self.roll_rate,
        }
    }
}
