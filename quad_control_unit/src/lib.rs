//! # Quadruped Drive Control Unit Library
//!
//! Motor-control core of a legged-robot drive stack. Converts joint,
//! cartesian and raw current intent into per-actuator current commands for
//! two actuator buses while enforcing safety limits and managing homing.
//!
//! ## Tick Data Flow
//!
//! 1. Poll both buses.
//! 2. Check calibrated position/velocity against fault thresholds.
//! 3. Dispatch the active [`ControlMode`](quad_common::mode::ControlMode)'s
//!    control law to obtain a 12-element current vector.
//! 4. Clamp, fault-gate, mask, convert to milli-amps and send.
//!
//! ## Fixed-Size State
//!
//! All per-actuator state lives in fixed-size arrays, and the core's own
//! tick code does not allocate. Bus implementations may: a rejected frame
//! carries an owned reason string.

pub mod bus;
pub mod command;
pub mod config;
pub mod control;
pub mod cycle;
pub mod drive;
pub mod kinematics;
pub mod state;

pub use drive::DriveSystem;
