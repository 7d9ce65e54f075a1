//! Drive-wide constants.

use static_assertions::const_assert_eq;

/// Total actuator count (4 legs x 3 joints).
pub const NUM_ACTUATORS: usize = 12;

/// Number of legs.
pub const NUM_LEGS: usize = 4;

/// Joints per leg (abduction, hip, knee).
pub const JOINTS_PER_LEG: usize = 3;

/// Actuators wired to each of the two buses.
pub const NUM_ACTUATORS_PER_BUS: usize = 6;

/// Torque slots addressed by one `command_torques` call.
pub const ACTUATORS_PER_SUBGROUP: usize = 4;

/// Orientation values in a telemetry snapshot (yaw, pitch, roll and rates).
pub const NUM_ORIENTATION_VALUES: usize = 6;

/// Telemetry values recorded per actuator.
pub const NUM_VALUES_PER_ACTUATOR: usize = 7;

/// Length of the flat debug snapshot: timestamp + orientation + per-actuator block.
pub const NUM_DEBUG_VALUES: usize =
    1 + NUM_ORIENTATION_VALUES + NUM_ACTUATORS * NUM_VALUES_PER_ACTUATOR;

/// Current commands travel as signed milli-amps.
pub const MILLI_UNITS_PER_UNIT: f32 = 1000.0;

const_assert_eq!(NUM_LEGS * JOINTS_PER_LEG, NUM_ACTUATORS);
const_assert_eq!(2 * NUM_ACTUATORS_PER_BUS, NUM_ACTUATORS);
const_assert_eq!(NUM_DEBUG_VALUES, 91);
