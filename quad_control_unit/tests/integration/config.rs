//! Configuration files driving a full control unit.

use std::io::Write;
use std::path::Path;

use quad_common::mode::ControlMode;
use quad_control_unit::config::{ControlUnitConfig, load_config};
use quad_control_unit::cycle::CycleRunner;
use tempfile::NamedTempFile;

use super::*;

#[test]
fn shipped_config_loads() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/drive.toml");
    let config = load_config(&path).unwrap();
    assert_eq!(config.cycle.rate_hz, 500);
    assert_eq!(config.drive.homing.transition_duration_ms, 5000);
    assert_eq!(config.drive.limits.max_current, 0.0);
    assert_eq!(
        config.drive.actuators.direction_multipliers,
        ControlUnitConfig::default().drive.actuators.direction_multipliers
    );
}

#[test]
fn file_gains_reach_the_drive() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        "[drive.limits]\nmax_current = 1.0\n\n[drive.gains]\nposition_kp = 3.0\n"
    )
    .unwrap();
    let config = load_config(file.path()).unwrap();

    let mut drive = frozen_drive(&config.drive);
    assert_eq!(drive.max_current(), 1.0);
    let mut reference = [0.0; NUM_ACTUATORS];
    reference[1] = 0.1;
    drive.set_joint_positions(reference);
    drive.update(0);
    assert!(approx(drive.last_commanded_current()[1], 0.3, 1e-6));
}

#[test]
fn file_thresholds_reach_the_drive() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "[drive.limits]\nfault_position = 1.0\n").unwrap();
    let config = load_config(file.path()).unwrap();

    let mut drive = frozen_drive(&config.drive);
    set_raw_position(&mut drive, 2, 1.5);
    drive.update(0);
    assert_eq!(drive.control_mode(), ControlMode::Error);
}

#[test]
fn runner_ticks_a_configured_drive() {
    let config = ControlUnitConfig::default();
    let drive = DriveSystem::new(
        &config.drive,
        SimulatedBus::new(BusId::Front),
        SimulatedBus::new(BusId::Rear),
        SimulatedImu::new(),
    );
    let mut runner = CycleRunner::new(drive, &config.cycle).with_tick_budget(5);
    runner.run().unwrap();

    assert_eq!(runner.stats.cycle_count, 5);
    assert_eq!(runner.drive.imu().filter_frequency(), Some(500));
    assert_eq!(runner.drive.imu().update_count(), 5);
    assert_eq!(runner.drive.buses().front.poll_count(), 5);
    assert_eq!(runner.drive.control_mode(), ControlMode::Idle);
}
