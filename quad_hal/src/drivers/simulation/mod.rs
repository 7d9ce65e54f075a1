//! Simulation driver module.
//!
//! Software stand-ins for the actuator buses and the orientation sensor,
//! usable without physical hardware.

mod bus;
mod imu;

pub use bus::{FRAME_HISTORY, MotorModel, SimulatedBus, TorqueFrame};
pub use imu::SimulatedImu;
