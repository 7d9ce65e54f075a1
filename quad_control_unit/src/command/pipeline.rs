//! Safety-checked current command pipeline.
//!
//! ```text
//! requested ─► clamp(±max_current) ─► fault gate(fault_current) ─► mask
//!           ─► record ─► × direction ─► round(×1000) ─► buses
//! ```
//!
//! The fault gate is the last line before hardware: a rejected vector
//! leaves `last_commanded_current` untouched and sends nothing.

use quad_common::actuator::{ActuatorActivations, ActuatorCurrentVector};
use quad_common::consts::{MILLI_UNITS_PER_UNIT, NUM_ACTUATORS};
use quad_common::error::DriveFault;

/// Current bounds applied to every command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrentLimits {
    /// Saturation bound [A].
    pub max_current: f32,
    /// Hard gate [A].
    pub fault_current: f32,
}

/// Vector ready for dispatch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreparedCommand {
    /// Masked joint-frame currents, as recorded for telemetry.
    pub commanded: ActuatorCurrentVector,
    /// Wiring-frame milli-amps, as sent.
    pub milli: [i32; NUM_ACTUATORS],
}

/// Run the clamp, gate, mask and conversion stages.
///
/// Non-finite entries fail the gate. A negative or NaN `max_current`
/// clamps everything to zero.
pub fn prepare_currents(
    requested: &ActuatorCurrentVector,
    limits: CurrentLimits,
    mask: &ActuatorActivations,
    directions: &[f32; NUM_ACTUATORS],
) -> Result<PreparedCommand, DriveFault> {
    // NaN or negative bound → zero
    let bound = limits.max_current.max(0.0);
    let mut commanded = [0.0; NUM_ACTUATORS];
    for (i, value) in requested.iter().enumerate() {
        let clamped = value.clamp(-bound, bound);
        if !clamped.is_finite() || clamped.abs() > limits.fault_current {
            return Err(DriveFault::CurrentFault {
                index: i as u8,
                current: clamped,
                limit: limits.fault_current,
            });
        }
        commanded[i] = if mask[i] { clamped } else { 0.0 };
    }

    let milli = std::array::from_fn(|i| to_milli(commanded[i] * directions[i]));
    Ok(PreparedCommand { commanded, milli })
}

/// Amps to signed milli-amps, round to nearest.
#[inline]
pub fn to_milli(value: f32) -> i32 {
    (value * MILLI_UNITS_PER_UNIT).round() as i32
}
