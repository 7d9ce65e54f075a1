//! Driver implementations.
//!
//! - [`simulation`] - Software simulation for development and testing
//!
//! # Adding New Drivers
//!
//! 1. Create a new submodule under `drivers/`
//! 2. Implement `ActuatorBus` and/or `OrientationSensor` from `quad_common::bus`
//! 3. Add export and documentation

pub mod simulation;
