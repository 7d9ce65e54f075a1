//! Joint and current control, queries and telemetry snapshots.

use quad_common::actuator::{ActuatorIndex, AxisGroup};
use quad_common::bus::{ActuatorTelemetry, Orientation};
use quad_common::mode::ControlMode;
use quad_common::telemetry::{DriveStatus, actuator_block_offset};
use quad_control_unit::state::mode::TransitionResult;

use super::*;

#[test]
fn single_current_goes_out_in_wiring_frame() {
    let mut drive = default_drive();
    drive.set_max_current(1.0);
    assert_eq!(drive.set_current(3, 0.5), TransitionResult::Ok(ControlMode::CurrentControl));
    drive.update(0);

    let sent = sent_milli(&drive);
    // direction -1 on actuator 3
    assert_eq!(sent[3], -500);
    assert_eq!(drive.last_commanded_current()[3], 0.5);
    assert_eq!(sent.iter().filter(|&&m| m != 0).count(), 1);
}

#[test]
fn current_reference_accumulates_entries() {
    let mut drive = default_drive();
    drive.set_max_current(1.0);
    drive.set_current(0, 0.1);
    drive.set_current(11, -0.2);
    drive.update(0);
    assert_eq!(drive.last_commanded_current()[0], 0.1);
    assert_eq!(drive.last_commanded_current()[11], -0.2);
}

#[test]
fn inactive_actuator_gets_zero() {
    let mut drive = default_drive();
    drive.set_max_current(1.0);
    let mut mask = [true; NUM_ACTUATORS];
    mask[7] = false;
    drive.set_activations(mask);
    drive.set_currents([0.4; NUM_ACTUATORS]);
    drive.update(0);

    let sent = sent_milli(&drive);
    assert_eq!(sent[7], 0);
    assert_eq!(drive.last_commanded_current()[7], 0.0);
    // actuator 8 has direction +1
    assert_eq!(sent[8], 400);
}

#[test]
fn position_control_runs_pd() {
    let mut drive = default_drive();
    drive.set_max_current(1.0);
    drive.set_position_kp(2.0);
    let mut reference = [0.0; NUM_ACTUATORS];
    reference[4] = 0.1;
    assert!(drive.set_joint_positions(reference).is_ok());
    drive.update(0);

    assert_eq!(drive.control_mode(), ControlMode::PositionControl);
    assert_eq!(sent_milli(&drive)[4], 200);
    assert!(approx(drive.last_commanded_current()[4], 0.2, 1e-6));
}

#[test]
fn velocity_reference_feeds_derivative_term() {
    let mut drive = default_drive();
    drive.set_max_current(1.0);
    drive.set_position_kd(0.5);
    let mut velocity = [0.0; NUM_ACTUATORS];
    velocity[1] = 0.4;
    drive.set_joint_velocities(velocity);
    drive.set_joint_positions([0.0; NUM_ACTUATORS]);
    drive.update(0);
    assert!(approx(drive.last_commanded_current()[1], 0.2, 1e-6));
}

#[test]
fn max_current_bounds_pd_output() {
    let mut drive = default_drive();
    drive.set_max_current(0.3);
    drive.set_position_kp(100.0);
    drive.set_joint_positions([-1.0; NUM_ACTUATORS]);
    drive.update(0);
    assert_eq!(drive.last_commanded_current(), &[-0.3; NUM_ACTUATORS]);
}

#[test]
fn idle_clears_nothing_but_output() {
    let mut drive = default_drive();
    drive.set_joint_positions([0.2; NUM_ACTUATORS]);
    drive.set_idle();
    drive.update(0);
    assert_last_tick_zero(&drive);
    assert_eq!(drive.position_reference(), &[0.2; NUM_ACTUATORS]);
}

#[test]
fn zero_current_position_recalibrates() {
    let mut drive = default_drive();
    set_raw_position(&mut drive, 6, 0.3);
    set_raw_position(&mut drive, 10, -0.1);
    drive.zero_current_position();

    assert_eq!(drive.zero_positions()[6], 0.3);
    assert_eq!(drive.zero_positions()[10], -0.1);
    assert_eq!(drive.actuator_positions(), [0.0; NUM_ACTUATORS]);
    assert_eq!(drive.raw_actuator_position(6), 0.3);
}

#[test]
fn explicit_zero_offsets_shift_calibration() {
    let mut drive = default_drive();
    let mut zero = [0.0; NUM_ACTUATORS];
    zero[2] = 0.5;
    drive.set_zero_positions(zero);
    set_raw_position(&mut drive, 2, 0.7);
    assert!(approx(drive.actuator_position(2), 0.2, 1e-6));
}

#[test]
fn homed_groups_report_after_homing() {
    let mut drive = default_drive();
    assert!(!drive.is_homed(AxisGroup::KNEES));
    drive.begin_homing();
    drive.update(0);
    for group in [
        AxisGroup::KNEES,
        AxisGroup::HIPS,
        AxisGroup::ABDUCTION,
        AxisGroup::single(ActuatorIndex::new(5).unwrap()),
    ] {
        assert!(drive.is_homed(group), "{group:?}");
    }
}

#[test]
fn power_sums_bus_reports() {
    let mut drive = default_drive();
    drive.buses_mut().front.set_telemetry(
        0,
        ActuatorTelemetry {
            electrical_power: 3.0,
            mechanical_power: 1.0,
            ..Default::default()
        },
    );
    drive.buses_mut().rear.set_telemetry(
        5,
        ActuatorTelemetry {
            current: 0.5,
            electrical_power: 2.0,
            mechanical_power: 0.5,
            ..Default::default()
        },
    );
    assert_eq!(drive.total_electrical_power(), 5.0);
    assert_eq!(drive.total_mechanical_power(), 1.5);
    // direction -1 on actuator 11
    assert_eq!(drive.actuator_current(11), -0.5);
    assert_eq!(drive.actuator_currents()[11], -0.5);
}

#[test]
fn debug_snapshot_layout() {
    let mut drive = default_drive();
    drive.imu_mut().set_orientation(Orientation {
        yaw: 0.1,
        pitch: 0.2,
        roll: 0.3,
        yaw_rate: 0.4,
        pitch_rate: 0.5,
        roll_rate: 0.6,
    });
    drive.set_max_current(1.0);
    set_raw_state(&mut drive, 10, 0.05, 0.25);
    let mut reference = [0.0; NUM_ACTUATORS];
    reference[10] = 0.15;
    drive.set_position_kp(1.0);
    drive.set_joint_positions(reference);
    drive.update(42);

    let data = drive.debug_data(42);
    assert_eq!(data[0], 42.0);
    assert_eq!(&data[1..7], &[0.1, 0.2, 0.3, 0.4, 0.5, 0.6]);

    let base = actuator_block_offset(10);
    // direction +1 on actuator 10
    assert_eq!(data[base], 0.05);
    assert_eq!(data[base + 1], 0.25);
    assert_eq!(data[base + 3], 0.15);
    assert!(approx(data[base + 6], 0.1, 1e-6));
    assert_eq!(data[data.len() - 1], drive.last_commanded_current()[11]);
}

#[test]
fn status_serializes_for_external_logging() {
    let mut drive = default_drive();
    drive.set_max_current(1.0);
    drive.set_currents([0.25; NUM_ACTUATORS]);
    drive.update(7);

    let status = drive.status(7);
    assert_eq!(status.ts, 7);
    assert_eq!(status.mode, ControlMode::CurrentControl);
    assert_eq!(status.lcur, [0.25; NUM_ACTUATORS]);
    assert_eq!(status.cref, [0.25; NUM_ACTUATORS]);

    let json = serde_json::to_string(&status).unwrap();
    assert!(json.contains("\"mode\":\"CurrentControl\""));
    let back: DriveStatus = serde_json::from_str(&json).unwrap();
    assert_eq!(back.mode, ControlMode::CurrentControl);
    assert_eq!(back.ts, 7);
}

#[test]
fn commands_switch_between_control_modes() {
    let mut drive = default_drive();
    assert!(drive.set_currents([0.0; NUM_ACTUATORS]).is_ok());
    assert!(drive.set_joint_positions([0.0; NUM_ACTUATORS]).is_ok());
    assert_eq!(drive.control_mode(), ControlMode::PositionControl);
    let pose = drive.default_cartesian_positions();
    assert!(drive.set_cartesian_positions(pose).is_ok());
    assert_eq!(drive.control_mode(), ControlMode::CartesianPositionControl);
    assert!(drive.set_current(0, 0.0).is_ok());
    assert_eq!(drive.control_mode(), ControlMode::CurrentControl);
}

#[test]
fn imu_is_set_up_and_updated_by_caller() {
    let mut drive = default_drive();
    drive.setup_imu(250);
    drive.update_imu();
    drive.update_imu();
    assert_eq!(drive.imu().filter_frequency(), Some(250));
    assert_eq!(drive.imu().update_count(), 2);
    assert_eq!(drive.orientation(), Orientation::default());
}
