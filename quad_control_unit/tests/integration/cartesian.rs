//! Cartesian position control through the drive.

use std::f32::consts::PI;

use nalgebra::Matrix3;
use quad_common::mode::ControlMode;

use super::*;

fn cartesian_drive(kp: f32, kd: f32) -> SimDrive {
    let mut drive = default_drive();
    drive.set_cartesian_kp3x3(Matrix3::from_diagonal_element(kp));
    drive.set_cartesian_kd3x3(Matrix3::from_diagonal_element(kd));
    drive.set_position_kp(0.0);
    drive.set_max_current(5.0);
    drive
}

#[test]
fn starts_at_default_pose() {
    let drive = default_drive();
    assert_eq!(drive.cartesian_position_reference(), &drive.default_cartesian_positions());
}

#[test]
fn default_pose_at_zero_angles_commands_nothing() {
    let mut drive = cartesian_drive(1000.0, 0.0);
    let pose = drive.default_cartesian_positions();
    assert!(drive.set_cartesian_positions(pose).is_ok());
    drive.update(0);

    assert_eq!(drive.control_mode(), ControlMode::CartesianPositionControl);
    for (i, v) in drive.last_commanded_current().iter().enumerate() {
        assert!(v.abs() < 1e-4, "actuator {i}: {v}");
    }
}

#[test]
fn displaced_foot_moves_only_its_leg() {
    let mut drive = cartesian_drive(1000.0, 0.0);
    let mut pose = drive.default_cartesian_positions();
    pose[0] += 0.01;
    drive.set_cartesian_positions(pose);
    drive.update(0);

    let out = drive.last_commanded_current();
    assert!(out[..3].iter().any(|v| v.abs() > 1e-3), "{out:?}");
    assert!(out[..3].iter().all(|v| v.abs() <= 5.0 + 1e-5));
    for v in &out[3..] {
        assert!(v.abs() < 1e-4);
    }
}

#[test]
fn large_error_saturates_at_max_current() {
    let mut drive = cartesian_drive(100_000.0, 0.0);
    let mut pose = drive.default_cartesian_positions();
    pose[3] -= 0.05;
    pose[5] += 0.05;
    drive.set_cartesian_positions(pose);
    drive.update(0);

    let out = drive.last_commanded_current();
    let peak = out[3..6].iter().fold(0.0f32, |m, v| m.max(v.abs()));
    assert!(approx(peak, 5.0, 1e-4), "{out:?}");
    assert_eq!(drive.control_mode(), ControlMode::CartesianPositionControl);
}

#[test]
fn knee_spring_uses_position_kp() {
    let mut drive = cartesian_drive(0.0, 0.0);
    drive.set_position_kp(2.0);
    let pose = drive.default_cartesian_positions();
    drive.set_cartesian_positions(pose);
    drive.update(0);

    let expected = 2.0 * (-PI / 6.0);
    for knee in [2, 5, 8, 11] {
        assert!(approx(drive.last_commanded_current()[knee], expected, 1e-4));
    }
    let sent = sent_milli(&drive);
    // direction +1 on actuator 2, -1 on actuator 5
    assert_eq!(sent[2], -1047);
    assert_eq!(sent[5], 1047);
    assert_eq!(sent[0], 0);
}

#[test]
fn velocity_reference_enters_mode_and_damps() {
    let mut drive = cartesian_drive(0.0, 10.0);
    let mut vel = [0.0; NUM_ACTUATORS];
    vel[6] = 0.1;
    assert!(drive.set_cartesian_velocities(vel).is_ok());
    assert_eq!(drive.control_mode(), ControlMode::CartesianPositionControl);
    drive.update(0);

    let out = drive.last_commanded_current();
    assert!(out[6..9].iter().any(|v| v.abs() > 1e-4), "{out:?}");
    assert!(out[..6].iter().all(|v| v.abs() < 1e-5));
}

#[test]
fn feed_forward_force_maps_through_jacobian() {
    let mut drive = cartesian_drive(0.0, 0.0);
    let mut force = [0.0; NUM_ACTUATORS];
    force[11] = -2.0;
    drive.set_feed_forward_force(force);
    let pose = drive.default_cartesian_positions();
    drive.set_cartesian_positions(pose);
    drive.update(0);

    let out = drive.last_commanded_current();
    assert!(out[9..].iter().any(|v| v.abs() > 1e-3), "{out:?}");
    assert!(out[..9].iter().all(|v| v.abs() < 1e-5));
}
