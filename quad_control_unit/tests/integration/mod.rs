//! Shared fixtures for integration tests.

mod cartesian;
mod config;
mod homing;
mod idle;
mod modes;

use quad_common::actuator::ActuatorIndex;
use quad_common::bus::{BusId, Subgroup};
use quad_common::config::DriveConfig;
use quad_common::consts::NUM_ACTUATORS;
use quad_control_unit::DriveSystem;
use quad_hal::{SimulatedBus, SimulatedImu};

pub type SimDrive = DriveSystem<SimulatedBus, SimulatedImu>;

/// Drive on frozen buses, as constructed: every actuator inactive.
pub fn inactive_drive(config: &DriveConfig) -> SimDrive {
    DriveSystem::new(
        config,
        SimulatedBus::new(BusId::Front).frozen(),
        SimulatedBus::new(BusId::Rear).frozen(),
        SimulatedImu::new(),
    )
}

/// Drive on frozen buses with every actuator activated. Telemetry only
/// changes when a test injects it.
pub fn frozen_drive(config: &DriveConfig) -> SimDrive {
    let mut drive = inactive_drive(config);
    drive.set_activations([true; NUM_ACTUATORS]);
    drive
}

pub fn default_drive() -> SimDrive {
    frozen_drive(&DriveConfig::default())
}

/// Set the raw position of actuator `i` on whichever bus owns it.
pub fn set_raw_position(drive: &mut SimDrive, i: u8, position: f32) {
    set_raw_state(drive, i, position, 0.0);
}

pub fn set_raw_state(drive: &mut SimDrive, i: u8, position: f32, velocity: f32) {
    let index = ActuatorIndex::new(i).unwrap();
    let buses = drive.buses_mut();
    let bus = match index.bus() {
        BusId::Front => &mut buses.front,
        BusId::Rear => &mut buses.rear,
    };
    bus.set_motor_state(index.local(), position, velocity);
}

/// Milli-amp command last sent to each actuator, in actuator order.
pub fn sent_milli(drive: &SimDrive) -> [i32; NUM_ACTUATORS] {
    let front = drive.buses().front.last_commands();
    let rear = drive.buses().rear.last_commands();
    let mut out = [0; NUM_ACTUATORS];
    out[..6].copy_from_slice(&front);
    out[6..].copy_from_slice(&rear);
    out
}

/// Total frames sent on both buses.
pub fn frame_count(drive: &SimDrive) -> usize {
    drive.buses().front.frame_count() + drive.buses().rear.frame_count()
}

pub fn clear_frames(drive: &mut SimDrive) {
    drive.buses_mut().front.clear_frames();
    drive.buses_mut().rear.clear_frames();
}

/// The four frames of the last tick, all zero.
pub fn assert_last_tick_zero(drive: &SimDrive) {
    for bus in [&drive.buses().front, &drive.buses().rear] {
        for subgroup in [Subgroup::IdZeroToThree, Subgroup::IdFourToSeven] {
            let frame = bus.last_frame(subgroup).expect("frame sent");
            assert_eq!(frame.torques, [0; 4], "{:?} {subgroup:?}", bus.id());
        }
    }
}

pub fn approx(a: f32, b: f32, tol: f32) -> bool {
    (a - b).abs() <= tol
}
