//! ControlMode transitions.
//!
//! ```text
//! any            ── Fault ───────────────→ Error
//! any            ── SetIdle ─────────────→ Idle
//! ¬Error         ── BeginHoming ─────────→ Homing
//! Homing         ── HomingComplete ──────→ PositionControl   (same tick)
//! Idle|PC|CPC|CC ── JointPositionCommand → PositionControl
//! Idle|PC|CPC|CC ── CartesianCommand ────→ CartesianPositionControl
//! Idle|PC|CPC|CC ── CurrentCommand ──────→ CurrentControl
//! ```
//!
//! `Error` is left only through `SetIdle`. While `Homing`, only `SetIdle`,
//! `Fault` and a homing restart are accepted.

use quad_common::mode::ControlMode;

/// Result of a ControlMode transition attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionResult {
    /// Transition accepted, new mode.
    Ok(ControlMode),
    /// Transition rejected, reason.
    Rejected(&'static str),
}

impl TransitionResult {
    #[inline]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }
}

/// Event that can change the control mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeEvent {
    /// Explicit idle command; also acknowledges a fault.
    SetIdle,
    /// Start (or restart) homing.
    BeginHoming,
    /// Zero offsets computed; hand off to position control.
    HomingComplete,
    /// New joint position reference.
    JointPositionCommand,
    /// New cartesian position or velocity reference.
    CartesianCommand,
    /// New current reference.
    CurrentCommand,
    /// Any safety fault.
    Fault,
}

/// Owner of the active [`ControlMode`].
#[derive(Debug, Clone, Default)]
pub struct ModeStateMachine {
    mode: ControlMode,
}

impl ModeStateMachine {
    /// Start in `Idle`.
    pub const fn new() -> Self {
        Self {
            mode: ControlMode::Idle,
        }
    }

    #[inline]
    pub const fn mode(&self) -> ControlMode {
        self.mode
    }

    /// Attempt a transition. The mode is unchanged on rejection.
    pub fn handle_event(&mut self, event: ModeEvent) -> TransitionResult {
        use ControlMode::*;
        use ModeEvent::*;

        let next = match (self.mode, event) {
            (_, Fault) => Error,
            (_, SetIdle) => Idle,

            (Error, _) => return TransitionResult::Rejected("Error: only SetIdle allowed"),

            (_, BeginHoming) => Homing,
            (Homing, HomingComplete) => PositionControl,
            (Homing, _) => {
                return TransitionResult::Rejected("Homing: only SetIdle or BeginHoming allowed");
            }
            (_, HomingComplete) => return TransitionResult::Rejected("HomingComplete outside Homing"),

            (Idle | PositionControl | CartesianPositionControl | CurrentControl, JointPositionCommand) => {
                PositionControl
            }
            (Idle | PositionControl | CartesianPositionControl | CurrentControl, CartesianCommand) => {
                CartesianPositionControl
            }
            (Idle | PositionControl | CartesianPositionControl | CurrentControl, CurrentCommand) => {
                CurrentControl
            }
        };

        self.mode = next;
        TransitionResult::Ok(next)
    }

    #[inline]
    pub const fn is_error(&self) -> bool {
        matches!(self.mode, ControlMode::Error)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
