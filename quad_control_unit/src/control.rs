//! Control law root.
//!
//! Stateless PD laws, direction-preserving saturation and the per-leg
//! cartesian controller. All functions are allocation-free.

pub mod cartesian;
pub mod pd;
pub mod saturation;
