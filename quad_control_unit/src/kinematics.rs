//! Leg kinematics.
//!
//! Joint angles per leg are `(abduction β, hip θ, knee γ)`. The hip and knee
//! rotate the leg plane's links; abduction rotates that plane about the body
//! x-axis. Positions are in the body frame, relative to the leg's hip unless
//! noted. Legs 0 and 2 are on the right side (negative y).
//!
//! ```text
//!  x0 =  L2·sin θ + L3·sin(θ+γ)      (leg plane, before abduction)
//!  z0 = −L2·cos θ − L3·cos(θ+γ)
//!  p  = ( x0,  l1·cos β − z0·sin β,  l1·sin β + z0·cos β )
//! ```
//!
//! No bounds are checked on the angles.

use nalgebra::{Matrix3, Vector3};
use quad_common::config::{HipLayoutParameters, LegParameters};
use quad_common::consts::JOINTS_PER_LEG;

/// Three values belonging to one leg.
pub type LegVector = Vector3<f32>;

/// Signed lateral offset of the leg plane: negative for right legs.
#[inline]
fn lateral_offset(params: &LegParameters, leg: usize) -> f32 {
    if leg % 2 == 0 {
        -params.abduction_offset
    } else {
        params.abduction_offset
    }
}

/// Foot position relative to the hip of `leg`.
pub fn forward_kinematics(angles: &LegVector, params: &LegParameters, leg: usize) -> LegVector {
    let (beta, theta, gamma) = (angles.x, angles.y, angles.z);
    let l1 = lateral_offset(params, leg);
    let (l2, l3) = (params.upper_link_length, params.lower_link_length);

    let x0 = l2 * theta.sin() + l3 * (theta + gamma).sin();
    let z0 = -l2 * theta.cos() - l3 * (theta + gamma).cos();
    let (sb, cb) = beta.sin_cos();

    Vector3::new(x0, l1 * cb - z0 * sb, l1 * sb + z0 * cb)
}

/// Hip position of `leg` relative to the body center.
///
/// Order: front-right, front-left, back-right, back-left.
pub fn hip_position(layout: &HipLayoutParameters, leg: usize) -> LegVector {
    let x = if leg < 2 { layout.x_offset } else { -layout.x_offset };
    let y = if leg % 2 == 0 { -layout.y_offset } else { layout.y_offset };
    Vector3::new(x, y, layout.z_offset)
}

/// ∂p/∂(β, θ, γ) evaluated at `angles`. Column `j` is the derivative with
/// respect to joint `j`.
pub fn leg_jacobian(angles: &LegVector, params: &LegParameters, leg: usize) -> Matrix3<f32> {
    let (beta, theta, gamma) = (angles.x, angles.y, angles.z);
    let l1 = lateral_offset(params, leg);
    let (l2, l3) = (params.upper_link_length, params.lower_link_length);

    let (s_t, c_t) = theta.sin_cos();
    let (s_tg, c_tg) = (theta + gamma).sin_cos();
    let (sb, cb) = beta.sin_cos();

    let z0 = -l2 * c_t - l3 * c_tg;
    // ∂x0/∂θ, ∂z0/∂θ and their γ counterparts
    let dx0_dt = l2 * c_t + l3 * c_tg;
    let dz0_dt = l2 * s_t + l3 * s_tg;
    let dx0_dg = l3 * c_tg;
    let dz0_dg = l3 * s_tg;

    Matrix3::new(
        0.0,
        dx0_dt,
        dx0_dg,
        -l1 * sb - z0 * cb,
        -dz0_dt * sb,
        -dz0_dg * sb,
        l1 * cb - z0 * sb,
        dz0_dt * cb,
        dz0_dg * cb,
    )
}

/// Extract leg `leg`'s slice of a 12-vector.
#[inline]
pub fn leg_vector(values: &[f32; 12], leg: usize) -> LegVector {
    let base = leg * JOINTS_PER_LEG;
    Vector3::new(values[base], values[base + 1], values[base + 2])
}

/// Write `v` into leg `leg`'s slice of a 12-vector.
#[inline]
pub fn set_leg_vector(values: &mut [f32; 12], leg: usize, v: &LegVector) {
    let base = leg * JOINTS_PER_LEG;
    values[base..base + JOINTS_PER_LEG].copy_from_slice(v.as_slice());
}
