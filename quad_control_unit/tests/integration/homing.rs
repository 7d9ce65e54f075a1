//! Homing: zero offsets, abort on a bad start, and the blended handoff.

use quad_common::actuator::AxisGroup;
use quad_common::config::DriveConfig;
use quad_common::error::DriveFault;
use quad_common::mode::ControlMode;

use super::*;

const KP: f32 = 0.5;

/// Drive that has just completed homing at `t = 1000` from the given raw start.
fn homed_drive(start: &[(u8, f32)]) -> SimDrive {
    let mut drive = default_drive();
    drive.set_position_kp(KP);
    for &(i, pos) in start {
        set_raw_position(&mut drive, i, pos);
    }
    assert!(drive.begin_homing().is_ok());
    drive.update(1000);
    drive
}

#[test]
fn homing_sets_zero_from_start_snapshot() {
    let config = DriveConfig::default();
    let start = [(0, 0.1), (1, -0.05), (2, 0.12)];
    let drive = homed_drive(&start);

    assert_eq!(drive.control_mode(), ControlMode::PositionControl);
    assert!(drive.is_homed(AxisGroup::ALL));
    assert_eq!(drive.max_current(), config.limits.current_limit);
    assert!(drive.homing_handoff_active());
    assert_eq!(frame_count(&drive), 4);

    let zcmd = config.homing.zero_position_commands();
    let wiring = config.actuators.direction_multipliers;
    let hdir = config.homing.directions;
    for (i, raw) in start {
        let i = i as usize;
        let expected = raw - zcmd[i] * wiring[i] * hdir[i];
        assert!(
            approx(drive.zero_positions()[i], expected, 1e-6),
            "zero[{i}] = {}, expected {expected}",
            drive.zero_positions()[i]
        );
    }
    // untouched actuators start at raw 0
    assert!(approx(drive.zero_positions()[11], -zcmd[11] * wiring[11] * hdir[11], 1e-6));

    let init = config.homing.initial_positions();
    for i in 0..NUM_ACTUATORS {
        assert!(approx(drive.position_reference()[i], init[i] * hdir[i], 1e-6));
    }
}

#[test]
fn homing_puts_joints_at_the_hard_stop_angle() {
    let config = DriveConfig::default();
    let mut drive = homed_drive(&[(4, 0.07)]);
    let zcmd = config.homing.zero_position_commands();
    let hdir = config.homing.directions;
    for i in 0..NUM_ACTUATORS as u8 {
        let expected = zcmd[i as usize] * hdir[i as usize];
        assert!(approx(drive.actuator_position(i), expected, 1e-5));
    }
}

#[test]
fn bad_start_aborts_without_mutation() {
    let mut drive = default_drive();
    set_raw_position(&mut drive, 7, 0.2);
    assert!(drive.begin_homing().is_ok());
    drive.update(0);

    assert_eq!(drive.control_mode(), ControlMode::Error);
    assert_eq!(drive.zero_positions(), &[0.0; NUM_ACTUATORS]);
    assert!(!drive.is_homed(AxisGroup::ALL));
    assert!(!drive.homing_handoff_active());
    assert_last_tick_zero(&drive);
    assert!(matches!(
        drive.last_fault(),
        Some(DriveFault::HomingPositionWarning { index: 7, .. })
    ));
}

#[test]
fn handoff_blends_over_transition() {
    let config = DriveConfig::default();
    let init = config.homing.initial_positions();
    let zcmd = config.homing.zero_position_commands();
    let hdir = config.homing.directions;
    let full_error: [f32; NUM_ACTUATORS] = std::array::from_fn(|i| (init[i] - zcmd[i]) * hdir[i]);

    let mut drive = homed_drive(&[]);
    // handoff tick targets the measured pose
    for i in 0..NUM_ACTUATORS {
        assert!(approx(drive.last_commanded_current()[i], 0.0, 1e-5));
    }

    drive.update(3500);
    assert!(drive.homing_handoff_active());
    for i in 0..NUM_ACTUATORS {
        let expected = KP * 0.5 * full_error[i];
        assert!(
            approx(drive.last_commanded_current()[i], expected, 1e-4),
            "actuator {i}: {} vs {expected}",
            drive.last_commanded_current()[i]
        );
    }

    drive.update(6000);
    assert!(!drive.homing_handoff_active());
    for i in 0..NUM_ACTUATORS {
        assert!(approx(drive.last_commanded_current()[i], KP * full_error[i], 1e-4));
    }

    // plain PD afterwards
    drive.update(9000);
    assert_eq!(drive.control_mode(), ControlMode::PositionControl);
    for i in 0..NUM_ACTUATORS {
        assert!(approx(drive.last_commanded_current()[i], KP * full_error[i], 1e-4));
    }
}

#[test]
fn handoff_output_is_monotonic() {
    let mut drive = homed_drive(&[]);
    let mut last = drive.last_commanded_current()[2].abs();
    for t in (1250..=6000).step_by(250) {
        drive.update(t);
        let now = drive.last_commanded_current()[2].abs();
        assert!(now + 1e-6 >= last, "t={t}: {now} < {last}");
        last = now;
    }
}

#[test]
fn rehoming_discards_running_handoff() {
    let mut drive = homed_drive(&[]);
    drive.update(2000);
    assert!(drive.homing_handoff_active());

    assert!(drive.begin_homing().is_ok());
    assert!(!drive.homing_handoff_active());
    assert!(!drive.is_homed(AxisGroup::KNEES));

    drive.update(10_000);
    assert_eq!(drive.control_mode(), ControlMode::PositionControl);
    assert!(drive.homing_handoff_active());
    drive.update(12_500);
    // restarted from the new handoff tick
    assert!(drive.homing_handoff_active());
}

#[test]
fn joint_command_cancels_handoff() {
    let mut drive = homed_drive(&[]);
    assert!(drive.set_joint_positions([0.0; NUM_ACTUATORS]).is_ok());
    assert!(!drive.homing_handoff_active());
    drive.update(1500);
    assert_eq!(drive.position_reference(), &[0.0; NUM_ACTUATORS]);
}

#[test]
fn homing_rejects_references() {
    let mut drive = default_drive();
    assert!(drive.begin_homing().is_ok());
    assert!(!drive.set_joint_positions([0.1; NUM_ACTUATORS]).is_ok());
    assert!(!drive.set_currents([0.1; NUM_ACTUATORS]).is_ok());
    assert!(!drive.set_cartesian_positions([0.0; NUM_ACTUATORS]).is_ok());
    assert_eq!(drive.control_mode(), ControlMode::Homing);
    assert!(drive.set_idle().is_ok());
    assert_eq!(drive.control_mode(), ControlMode::Idle);
}

#[test]
fn homing_activates_every_actuator() {
    let mut drive = inactive_drive(&DriveConfig::default());
    drive.set_position_kp(KP);
    assert!(drive.begin_homing().is_ok());
    drive.update(1000);
    drive.update(6000);

    let sent = sent_milli(&drive);
    assert!(sent.iter().all(|&m| m != 0), "{sent:?}");
}
