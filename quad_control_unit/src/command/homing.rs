//! Homing sequencing and the post-homing handoff.
//!
//! ## Lifecycle
//!
//! 1. `BeginHoming` → mode Homing, homed flags cleared, all actuators
//!    active, max current lowered to the homing current limit.
//! 2. First Homing tick: raw positions are snapshot and checked against the
//!    start tolerance. Any violation aborts to Error with nothing mutated.
//! 3. Otherwise [`HomingSequencer::compute`] yields zero offsets and the
//!    initial-pose reference; the drive marks everything homed and falls
//!    through into PositionControl within the same tick.
//! 4. [`HomingProgress`] blends from the calibrated pose at handoff to the
//!    reference over the transition duration, using a raised cosine:
//!
//! ```text
//! progress = clamp((now − t0) / duration, 0, 1)
//! smooth   = 0.5 − 0.5·cos(progress·π)
//! target   = start + (reference − start)·smooth
//! ```

use std::f32::consts::PI;

use quad_common::actuator::{ActuatorIndex, ActuatorPositionVector};
use quad_common::config::HomingConfig;
use quad_common::consts::NUM_ACTUATORS;
use quad_common::error::DriveFault;

// ─── Sequencer ──────────────────────────────────────────────────────

/// Zero offsets and reference produced by a successful homing pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HomingOutcome {
    pub zero_position: ActuatorPositionVector,
    pub position_reference: ActuatorPositionVector,
}

/// Fixed calibration constants of the homing procedure.
#[derive(Debug, Clone)]
pub struct HomingSequencer {
    directions: [f32; NUM_ACTUATORS],
    zero_commands: ActuatorPositionVector,
    initial_positions: ActuatorPositionVector,
    start_tolerance: f32,
    transition_duration_ms: u64,
}

impl HomingSequencer {
    pub fn new(config: &HomingConfig) -> Self {
        Self {
            directions: config.directions,
            zero_commands: config.zero_position_commands(),
            initial_positions: config.initial_positions(),
            start_tolerance: config.start_tolerance,
            transition_duration_ms: config.transition_duration_ms,
        }
    }

    #[inline]
    pub const fn transition_duration_ms(&self) -> u64 {
        self.transition_duration_ms
    }

    /// Compute zero offsets from the raw start snapshot.
    ///
    /// Pure: the caller applies the outcome. Fails on the first actuator
    /// whose raw start magnitude exceeds the start tolerance.
    pub fn compute(
        &self,
        raw_start: &ActuatorPositionVector,
        wiring: &[f32; NUM_ACTUATORS],
    ) -> Result<HomingOutcome, DriveFault> {
        for index in ActuatorIndex::all() {
            let position = raw_start[index.as_usize()];
            if position.abs() > self.start_tolerance {
                return Err(DriveFault::HomingPositionWarning {
                    index: index.get(),
                    position,
                    tolerance: self.start_tolerance,
                });
            }
        }

        let mut zero_position = [0.0; NUM_ACTUATORS];
        let mut position_reference = [0.0; NUM_ACTUATORS];
        for i in 0..NUM_ACTUATORS {
            zero_position[i] = raw_start[i] - self.zero_commands[i] * wiring[i] * self.directions[i];
            position_reference[i] = (self.initial_positions[i] * self.directions[i]).clamp(-PI, PI);
        }
        Ok(HomingOutcome {
            zero_position,
            position_reference,
        })
    }
}

// ─── Handoff ────────────────────────────────────────────────────────

/// Raised-cosine ease: 0 at 0, 1 at 1, zero slope at both ends.
#[inline]
pub fn smooth_progress(progress: f32) -> f32 {
    0.5 - 0.5 * (progress * PI).cos()
}

/// `start + (target − start)·s` per actuator.
#[inline]
pub fn interpolate(
    start: &ActuatorPositionVector,
    target: &ActuatorPositionVector,
    s: f32,
) -> ActuatorPositionVector {
    std::array::from_fn(|i| start[i] + (target[i] - start[i]) * s)
}

/// Data latched on the first position-control tick after homing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub start_time_ms: u64,
    pub start_positions: ActuatorPositionVector,
    pub target_positions: ActuatorPositionVector,
}

/// Transient state of the homing → position-control handoff.
#[derive(Debug, Clone, Default)]
pub struct HomingProgress {
    just_homed: bool,
    transition: Option<Transition>,
}

impl HomingProgress {
    /// Arm the handoff. Latching happens on the next [`blend_targets`](Self::blend_targets).
    pub fn begin_handoff(&mut self) {
        self.just_homed = true;
        self.transition = None;
    }

    /// Discard any pending or running handoff.
    pub fn cancel(&mut self) {
        self.just_homed = false;
        self.transition = None;
    }

    #[inline]
    pub const fn is_active(&self) -> bool {
        self.just_homed
    }

    #[inline]
    pub fn transition(&self) -> Option<&Transition> {
        self.transition.as_ref()
    }

    /// Interpolated PD target for this tick, or `None` once no handoff runs.
    ///
    /// The first call latches `now_ms`, `calibrated` and `reference`; later
    /// calls ignore both vectors. The handoff clears itself at progress 1.
    pub fn blend_targets(
        &mut self,
        now_ms: u64,
        duration_ms: u64,
        calibrated: &ActuatorPositionVector,
        reference: &ActuatorPositionVector,
    ) -> Option<ActuatorPositionVector> {
        if !self.just_homed {
            return None;
        }
        let transition = *self.transition.get_or_insert(Transition {
            start_time_ms: now_ms,
            start_positions: *calibrated,
            target_positions: *reference,
        });

        let elapsed = now_ms.saturating_sub(transition.start_time_ms);
        let progress = if duration_ms == 0 {
            1.0
        } else {
            (elapsed as f32 / duration_ms as f32).clamp(0.0, 1.0)
        };
        if progress >= 1.0 {
            self.cancel();
        }
        Some(interpolate(
            &transition.start_positions,
            &transition.target_positions,
            smooth_progress(progress),
        ))
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
