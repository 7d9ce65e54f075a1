//! State module root.
//!
//! Calibration state of the twelve actuators and the control-mode machine.

pub mod actuator;
pub mod mode;
