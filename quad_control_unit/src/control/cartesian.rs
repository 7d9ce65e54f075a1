//! Per-leg cartesian position control.
//!
//! For each leg independently:
//!
//! ```text
//! J      = ∂p/∂q at the measured joint angles
//! f      = PD3(p(q), J·q̇, p_ref − hip, v_ref) + f_ff
//! τ      = Jᵀ·f + knee soft-limit spring
//! τ_sat  = saturate_direction_preserving(τ, max_current)
//! ```
//!
//! The knee spring `kp·(limit − γ)` acts only when `γ > limit` and is added
//! before saturation, so the per-leg bound holds for the final torques.

use nalgebra::Vector3;
use quad_common::actuator::{ActuatorCurrentVector, ActuatorPositionVector, ActuatorVelocityVector};
use quad_common::config::{HipLayoutParameters, LegParameters};
use quad_common::consts::{NUM_ACTUATORS, NUM_LEGS};

use super::pd::{PdGains3, pd3};
use super::saturation::saturate_direction_preserving;
use crate::kinematics::{forward_kinematics, hip_position, leg_jacobian, leg_vector, set_leg_vector};

/// Cartesian references and feed-forward, all in the body frame.
#[derive(Debug, Clone, Copy)]
pub struct CartesianReferences<'a> {
    /// Foot positions relative to the body center [m].
    pub positions: &'a ActuatorPositionVector,
    /// Foot velocities [m/s].
    pub velocities: &'a ActuatorVelocityVector,
    /// Feed-forward foot force per leg.
    pub feed_forward: &'a [f32; NUM_ACTUATORS],
}

/// Geometry and gains of the cartesian law.
#[derive(Debug, Clone)]
pub struct CartesianController {
    legs: LegParameters,
    hips: HipLayoutParameters,
    pub gains: PdGains3,
    knee_soft_limit: f32,
}

impl CartesianController {
    pub fn new(legs: LegParameters, hips: HipLayoutParameters, gains: PdGains3, knee_soft_limit: f32) -> Self {
        Self {
            legs,
            hips,
            gains,
            knee_soft_limit,
        }
    }

    /// Body-frame foot positions with every joint at zero.
    pub fn default_positions(&self) -> ActuatorPositionVector {
        let mut out = [0.0; NUM_ACTUATORS];
        for leg in 0..NUM_LEGS {
            let p = forward_kinematics(&Vector3::zeros(), &self.legs, leg) + hip_position(&self.hips, leg);
            set_leg_vector(&mut out, leg, &p);
        }
        out
    }

    /// Measured foot positions relative to the body center.
    pub fn measured_positions(&self, joint_positions: &ActuatorPositionVector) -> ActuatorPositionVector {
        let mut out = [0.0; NUM_ACTUATORS];
        for leg in 0..NUM_LEGS {
            let q = leg_vector(joint_positions, leg);
            let p = forward_kinematics(&q, &self.legs, leg) + hip_position(&self.hips, leg);
            set_leg_vector(&mut out, leg, &p);
        }
        out
    }

    /// Joint currents for all legs.
    ///
    /// `knee_kp` is the stiffness of the knee soft-limit spring.
    pub fn compute(
        &self,
        joint_positions: &ActuatorPositionVector,
        joint_velocities: &ActuatorVelocityVector,
        refs: CartesianReferences<'_>,
        knee_kp: f32,
        max_current: f32,
    ) -> ActuatorCurrentVector {
        let mut out = [0.0; NUM_ACTUATORS];
        for leg in 0..NUM_LEGS {
            let torques = self.leg_torques(leg, joint_positions, joint_velocities, &refs, knee_kp);
            set_leg_vector(&mut out, leg, &saturate_direction_preserving(torques, max_current));
        }
        out
    }

    fn leg_torques(
        &self,
        leg: usize,
        joint_positions: &ActuatorPositionVector,
        joint_velocities: &ActuatorVelocityVector,
        refs: &CartesianReferences<'_>,
        knee_kp: f32,
    ) -> Vector3<f32> {
        let q = leg_vector(joint_positions, leg);
        let qd = leg_vector(joint_velocities, leg);
        let jac = leg_jacobian(&q, &self.legs, leg);

        let measured = forward_kinematics(&q, &self.legs, leg);
        let measured_vel = jac * qd;
        let target = leg_vector(refs.positions, leg) - hip_position(&self.hips, leg);
        let target_vel = leg_vector(refs.velocities, leg);

        let force =
            pd3(&measured, &measured_vel, &target, &target_vel, &self.gains) + leg_vector(refs.feed_forward, leg);
        let mut torques = jac.transpose() * force;

        let knee = q.z;
        if knee > self.knee_soft_limit {
            torques.z += knee_kp * (self.knee_soft_limit - knee);
        }
        torques
    }
}
