//! Command processing root.
//!
//! Homing sequencing with the post-homing handoff, and the safety-checked
//! current command pipeline.

pub mod homing;
pub mod pipeline;
