//! # Quadruped HAL Library
//!
//! Driver implementations for the collaborator traits defined in
//! `quad_common::bus`: the two actuator buses and the orientation sensor.
//!
//! # Module Structure
//!
//! - [`drivers`] - Driver implementations (currently simulation only)

#![deny(missing_docs)]

pub mod drivers;

pub use crate::drivers::simulation::{FRAME_HISTORY, MotorModel, SimulatedBus, SimulatedImu, TorqueFrame};
