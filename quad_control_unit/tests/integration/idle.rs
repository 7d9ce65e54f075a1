//! Idle mode commands zero current whatever references are held.

use quad_common::consts::NUM_ACTUATORS;
use quad_common::mode::ControlMode;

use super::*;

#[test]
fn idle_commands_zero_with_references_set() {
    let mut drive = default_drive();
    drive.set_max_current(3.0);
    drive.set_position_kp(5.0);
    drive.set_joint_velocities([0.4; NUM_ACTUATORS]);
    drive.set_feed_forward_force([1.0; NUM_ACTUATORS]);
    assert!(drive.set_joint_positions([0.5; NUM_ACTUATORS]).is_ok());
    assert!(drive.set_currents([1.0; NUM_ACTUATORS]).is_ok());
    assert!(drive.set_idle().is_ok());
    assert_eq!(drive.control_mode(), ControlMode::Idle);

    drive.update(0);

    assert_eq!(frame_count(&drive), 4);
    assert_last_tick_zero(&drive);
    assert_eq!(drive.last_commanded_current(), &[0.0; NUM_ACTUATORS]);
    assert_eq!(drive.position_reference(), &[0.5; NUM_ACTUATORS]);
}

#[test]
fn new_drive_is_idle_and_unhomed() {
    let mut drive = default_drive();
    assert_eq!(drive.control_mode(), ControlMode::Idle);
    assert!(drive.last_fault().is_none());
    assert!(!drive.is_homed(quad_common::actuator::AxisGroup::ALL));
    assert_eq!(
        drive.cartesian_position_reference(),
        &drive.default_cartesian_positions()
    );

    for now in 0..5 {
        drive.update(now);
    }
    assert_eq!(frame_count(&drive), 20);
    assert_last_tick_zero(&drive);
}

#[test]
fn every_tick_polls_both_buses() {
    let mut drive = default_drive();
    drive.update(0);
    drive.update(2);
    assert_eq!(drive.buses().front.poll_count(), 2);
    assert_eq!(drive.buses().rear.poll_count(), 2);
    drive.check_for_bus_messages();
    assert_eq!(drive.buses().rear.poll_count(), 3);
}
