//! Drive control mode.

use serde::{Deserialize, Serialize};

/// Active control mode of the drive system.
///
/// Exactly one mode is active at a time. `Error` is left only through an
/// explicit idle command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ControlMode {
    /// Zero current, accepting commands.
    Idle = 0,
    /// Zero-offset discovery; completes within one tick.
    Homing = 1,
    /// Per-joint PD toward the joint position reference.
    PositionControl = 2,
    /// Per-leg cartesian PD mapped through the leg Jacobian.
    CartesianPositionControl = 3,
    /// Current reference passed straight through.
    CurrentControl = 4,
    /// Fault latched. Zero current until `Idle` is commanded.
    Error = 5,
}

impl ControlMode {
    /// Convert from raw `u8`. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Idle),
            1 => Some(Self::Homing),
            2 => Some(Self::PositionControl),
            3 => Some(Self::CartesianPositionControl),
            4 => Some(Self::CurrentControl),
            5 => Some(Self::Error),
            _ => None,
        }
    }

    /// Modes that command all-zero current.
    #[inline]
    pub const fn commands_zero_current(&self) -> bool {
        matches!(self, Self::Idle | Self::Error)
    }
}

impl Default for ControlMode {
    fn default() -> Self {
        Self::Idle
    }
}
