//! Proportional-derivative laws.
//!
//! `u = kp·(target − measured) + kd·(target_vel − measured_vel)`
//!
//! Zero kp disables the position term; zero kd disables damping.

use nalgebra::{Matrix3, Vector3};

/// Scalar PD gains, shared by all twelve joints.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PdGains {
    /// Proportional gain [A/rad].
    pub kp: f32,
    /// Derivative gain [A·s/rad].
    pub kd: f32,
}

/// Matrix PD gains for one leg's cartesian law.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdGains3 {
    pub kp: Matrix3<f32>,
    pub kd: Matrix3<f32>,
}

impl Default for PdGains3 {
    fn default() -> Self {
        Self {
            kp: Matrix3::zeros(),
            kd: Matrix3::zeros(),
        }
    }
}

impl PdGains3 {
    /// Build from row-major arrays as written in the config file.
    pub fn from_rows(kp: &[[f32; 3]; 3], kd: &[[f32; 3]; 3]) -> Self {
        Self {
            kp: matrix_from_rows(kp),
            kd: matrix_from_rows(kd),
        }
    }
}

/// Row-major `[[f32; 3]; 3]` to `Matrix3`.
#[inline]
pub fn matrix_from_rows(rows: &[[f32; 3]; 3]) -> Matrix3<f32> {
    Matrix3::from_fn(|r, c| rows[r][c])
}

/// Scalar PD for one joint.
#[inline]
pub fn pd(measured: f32, measured_vel: f32, target: f32, target_vel: f32, gains: &PdGains) -> f32 {
    gains.kp * (target - measured) + gains.kd * (target_vel - measured_vel)
}

/// Matrix PD on 3-vectors.
#[inline]
pub fn pd3(
    measured: &Vector3<f32>,
    measured_vel: &Vector3<f32>,
    target: &Vector3<f32>,
    target_vel: &Vector3<f32>,
    gains: &PdGains3,
) -> Vector3<f32> {
    gains.kp * (target - measured) + gains.kd * (target_vel - measured_vel)
}

// ─── Tests ──────────────────────────────────────────────────────────
