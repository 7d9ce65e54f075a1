//! Drive system: one owned object driving both buses.
//!
//! ## Tick (`update`)
//!
//! 1. Poll both buses.
//! 2. Fault check on calibrated position/velocity (mode → Error).
//! 3. Mode dispatch:
//!    - Idle, Error: zero current
//!    - Homing: compute zero offsets, then PositionControl in the same tick
//!    - PositionControl: joint PD, blended toward the reference after homing
//!    - CartesianPositionControl: per-leg cartesian law
//!    - CurrentControl: current reference as-is
//! 4. Command pipeline → buses.
//!
//! Mode-changing setters go through [`ModeStateMachine`] and return its
//! [`TransitionResult`]; a rejected command mutates nothing. Gains, limits,
//! velocity references and feed-forward are accepted in every mode.

use nalgebra::Matrix3;
use quad_common::actuator::{
    ActuatorActivations, ActuatorCurrentVector, ActuatorIndex, ActuatorPositionVector,
    ActuatorVelocityVector, AxisGroup,
};
use quad_common::bus::{ActuatorBus, ActuatorTelemetry, Orientation, OrientationSensor};
use quad_common::config::DriveConfig;
use quad_common::consts::{NUM_ACTUATORS, NUM_DEBUG_VALUES, NUM_VALUES_PER_ACTUATOR};
use quad_common::error::DriveFault;
use quad_common::mode::ControlMode;
use quad_common::telemetry::{DriveStatus, actuator_block_offset};
use tracing::{debug, error, info, warn};

use crate::bus::BusPair;
use crate::command::homing::{HomingProgress, HomingSequencer};
use crate::command::pipeline::{CurrentLimits, prepare_currents};
use crate::control::cartesian::{CartesianController, CartesianReferences};
use crate::control::pd::{PdGains, PdGains3, pd};
use crate::state::actuator::{ActuatorStateModel, CalibratedTelemetry};
use crate::state::mode::{ModeEvent, ModeStateMachine, TransitionResult};

/// Motor-control core for twelve actuators on two buses.
#[derive(Debug)]
pub struct DriveSystem<B: ActuatorBus, S: OrientationSensor> {
    buses: BusPair<B>,
    imu: S,
    actuators: ActuatorStateModel,
    mode: ModeStateMachine,
    homing: HomingSequencer,
    homing_progress: HomingProgress,
    cartesian: CartesianController,
    position_gains: PdGains,

    fault_current: f32,
    fault_position: f32,
    fault_velocity: f32,
    current_limit: f32,
    max_current: f32,

    position_reference: ActuatorPositionVector,
    velocity_reference: ActuatorVelocityVector,
    current_reference: ActuatorCurrentVector,
    cartesian_position_reference: ActuatorPositionVector,
    cartesian_velocity_reference: ActuatorVelocityVector,
    feed_forward_force: [f32; NUM_ACTUATORS],

    last_commanded_current: ActuatorCurrentVector,
    last_fault: Option<DriveFault>,
}

impl<B: ActuatorBus, S: OrientationSensor> DriveSystem<B, S> {
    /// Build an idle drive. Cartesian references start at the default pose.
    ///
    /// No actuator is active until [`set_activations`](Self::set_activations)
    /// or [`begin_homing`](Self::begin_homing).
    pub fn new(config: &DriveConfig, front: B, rear: B, imu: S) -> Self {
        let gains = &config.gains;
        let mut drive = Self {
            buses: BusPair::new(front, rear),
            imu,
            actuators: ActuatorStateModel::new(config.actuators.direction_multipliers),
            mode: ModeStateMachine::new(),
            homing: HomingSequencer::new(&config.homing),
            homing_progress: HomingProgress::default(),
            cartesian: CartesianController::new(
                config.legs,
                config.hips,
                PdGains3::from_rows(&gains.cartesian_kp, &gains.cartesian_kd),
                config.cartesian.knee_soft_limit,
            ),
            position_gains: PdGains {
                kp: gains.position_kp,
                kd: gains.position_kd,
            },
            fault_current: config.limits.fault_current,
            fault_position: config.limits.fault_position,
            fault_velocity: config.limits.fault_velocity,
            current_limit: config.limits.current_limit,
            max_current: config.limits.max_current,
            position_reference: [0.0; NUM_ACTUATORS],
            velocity_reference: [0.0; NUM_ACTUATORS],
            current_reference: [0.0; NUM_ACTUATORS],
            cartesian_position_reference: [0.0; NUM_ACTUATORS],
            cartesian_velocity_reference: [0.0; NUM_ACTUATORS],
            feed_forward_force: [0.0; NUM_ACTUATORS],
            last_commanded_current: [0.0; NUM_ACTUATORS],
            last_fault: None,
        };
        drive.set_default_cartesian_positions();
        drive
    }

    // ─── Tick ───────────────────────────────────────────────────────

    /// Poll both buses.
    pub fn check_for_bus_messages(&mut self) {
        self.buses.poll();
    }

    /// Run one control tick at time `now_ms`.
    pub fn update(&mut self, now_ms: u64) {
        self.check_for_bus_messages();

        if let Err(fault) = self.check_errors() {
            if !self.mode.is_error() {
                self.raise_fault(fault);
            }
        }

        match self.mode.mode() {
            ControlMode::Idle | ControlMode::Error => self.command_idle(),
            ControlMode::Homing => self.homing_tick(now_ms),
            ControlMode::PositionControl => self.position_control_tick(now_ms),
            ControlMode::CartesianPositionControl => self.cartesian_tick(),
            ControlMode::CurrentControl => {
                let requested = self.current_reference;
                self.command_currents(&requested);
            }
        }
    }

    /// First actuator beyond the position or velocity threshold.
    fn check_errors(&self) -> Result<(), DriveFault> {
        for index in ActuatorIndex::all() {
            let cal = self.calibrated(index);
            // negated comparisons so NaN trips
            if !(cal.position.abs() <= self.fault_position) {
                return Err(DriveFault::PositionFault {
                    index: index.get(),
                    position: cal.position,
                    limit: self.fault_position,
                });
            }
            if !(cal.velocity.abs() <= self.fault_velocity) {
                return Err(DriveFault::VelocityFault {
                    index: index.get(),
                    velocity: cal.velocity,
                    limit: self.fault_velocity,
                });
            }
        }
        Ok(())
    }

    fn raise_fault(&mut self, fault: DriveFault) {
        error!("Drive fault: {fault}");
        self.mode.handle_event(ModeEvent::Fault);
        self.homing_progress.cancel();
        self.last_fault = Some(fault);
    }

    fn homing_tick(&mut self, now_ms: u64) {
        let start = self.raw_actuator_positions();
        match self.homing.compute(&start, self.actuators.directions()) {
            Err(fault) => {
                warn!("Homing aborted, initial position is not zero");
                self.raise_fault(fault);
                self.command_idle();
            }
            Ok(outcome) => {
                self.actuators.set_zero(outcome.zero_position);
                self.actuators.mark_all_homed();
                self.position_reference = outcome.position_reference;
                self.mode.handle_event(ModeEvent::HomingComplete);
                self.homing_progress.begin_handoff();
                info!("Homing complete");
                self.position_control_tick(now_ms);
            }
        }
    }

    fn position_control_tick(&mut self, now_ms: u64) {
        let positions = self.actuator_positions();
        let velocities = self.actuator_velocities();
        let targets = self
            .homing_progress
            .blend_targets(
                now_ms,
                self.homing.transition_duration_ms(),
                &positions,
                &self.position_reference,
            )
            .unwrap_or(self.position_reference);

        let currents: ActuatorCurrentVector = std::array::from_fn(|i| {
            pd(
                positions[i],
                velocities[i],
                targets[i],
                self.velocity_reference[i],
                &self.position_gains,
            )
        });
        self.command_currents(&currents);
    }

    fn cartesian_tick(&mut self) {
        let currents = self.cartesian.compute(
            &self.actuator_positions(),
            &self.actuator_velocities(),
            CartesianReferences {
                positions: &self.cartesian_position_reference,
                velocities: &self.cartesian_velocity_reference,
                feed_forward: &self.feed_forward_force,
            },
            self.position_gains.kp,
            self.max_current,
        );
        self.command_currents(&currents);
    }

    fn command_idle(&mut self) {
        self.command_currents(&[0.0; NUM_ACTUATORS]);
    }

    /// Clamp, gate, mask, convert and send. Faults route to Error.
    fn command_currents(&mut self, requested: &ActuatorCurrentVector) {
        let limits = CurrentLimits {
            max_current: self.max_current,
            fault_current: self.fault_current,
        };
        let prepared = match prepare_currents(
            requested,
            limits,
            self.actuators.active_mask(),
            self.actuators.directions(),
        ) {
            Ok(prepared) => prepared,
            Err(fault) => {
                self.raise_fault(fault);
                return;
            }
        };
        self.last_commanded_current = prepared.commanded;
        if let Err(e) = self.buses.dispatch(&prepared.milli) {
            self.raise_fault(e.into());
        }
    }

    // ─── Mode Commands ──────────────────────────────────────────────

    fn transition(&mut self, event: ModeEvent) -> TransitionResult {
        let from = self.mode.mode();
        let result = self.mode.handle_event(event);
        match result {
            TransitionResult::Ok(to) => {
                if to != ControlMode::PositionControl {
                    self.homing_progress.cancel();
                }
                if to != from {
                    info!("Control mode {from:?} -> {to:?}");
                }
            }
            TransitionResult::Rejected(reason) => {
                warn!("{event:?} rejected in {from:?}: {reason}");
            }
        }
        result
    }

    /// Zero current; acknowledges a latched fault.
    pub fn set_idle(&mut self) -> TransitionResult {
        self.transition(ModeEvent::SetIdle)
    }

    /// Start homing on the next tick.
    ///
    /// Clears homed flags, activates every actuator and lowers max current
    /// to the homing current limit.
    pub fn begin_homing(&mut self) -> TransitionResult {
        let result = self.transition(ModeEvent::BeginHoming);
        if result.is_ok() {
            self.actuators.clear_homed();
            self.actuators.set_active_mask([true; NUM_ACTUATORS]);
            self.max_current = self.current_limit;
        }
        result
    }

    /// New joint position reference → PositionControl.
    pub fn set_joint_positions(&mut self, positions: ActuatorPositionVector) -> TransitionResult {
        let result = self.transition(ModeEvent::JointPositionCommand);
        if result.is_ok() {
            self.homing_progress.cancel();
            self.position_reference = positions;
        }
        result
    }

    /// New cartesian foot positions (body frame) → CartesianPositionControl.
    pub fn set_cartesian_positions(&mut self, positions: ActuatorPositionVector) -> TransitionResult {
        let result = self.transition(ModeEvent::CartesianCommand);
        if result.is_ok() {
            self.cartesian_position_reference = positions;
        }
        result
    }

    /// New cartesian foot velocities → CartesianPositionControl.
    pub fn set_cartesian_velocities(&mut self, velocities: ActuatorVelocityVector) -> TransitionResult {
        let result = self.transition(ModeEvent::CartesianCommand);
        if result.is_ok() {
            self.cartesian_velocity_reference = velocities;
        }
        result
    }

    /// Set one entry of the current reference → CurrentControl.
    ///
    /// An invalid index latches Error instead.
    pub fn set_current(&mut self, i: u8, current: f32) -> TransitionResult {
        let Some(index) = self.index_or_fault(i) else {
            return TransitionResult::Rejected("invalid actuator index");
        };
        let result = self.transition(ModeEvent::CurrentCommand);
        if result.is_ok() {
            self.current_reference[index.as_usize()] = current;
        }
        result
    }

    /// Replace the whole current reference → CurrentControl.
    pub fn set_currents(&mut self, currents: ActuatorCurrentVector) -> TransitionResult {
        let result = self.transition(ModeEvent::CurrentCommand);
        if result.is_ok() {
            self.current_reference = currents;
        }
        result
    }

    // ─── References, Gains, Limits ──────────────────────────────────

    /// Joint velocity reference for the PD law.
    pub fn set_joint_velocities(&mut self, velocities: ActuatorVelocityVector) {
        self.velocity_reference = velocities;
    }

    /// Feed-forward foot force, three entries per leg.
    pub fn set_feed_forward_force(&mut self, force: [f32; NUM_ACTUATORS]) {
        self.feed_forward_force = force;
    }

    /// Foot positions with every joint at zero, body frame.
    pub fn default_cartesian_positions(&self) -> ActuatorPositionVector {
        self.cartesian.default_positions()
    }

    pub fn set_default_cartesian_positions(&mut self) {
        self.cartesian_position_reference = self.default_cartesian_positions();
    }

    /// Zero offsets := current raw positions.
    pub fn zero_current_position(&mut self) {
        let raw = self.raw_actuator_positions();
        self.set_zero_positions(raw);
    }

    pub fn set_zero_positions(&mut self, zero: ActuatorPositionVector) {
        debug!("Zero positions set: {zero:?}");
        self.actuators.set_zero(zero);
    }

    pub fn set_activations(&mut self, mask: ActuatorActivations) {
        debug!("Activations set: {mask:?}");
        self.actuators.set_active_mask(mask);
    }

    pub fn set_position_kp(&mut self, kp: f32) {
        self.position_gains.kp = kp;
    }

    pub fn set_position_kd(&mut self, kd: f32) {
        self.position_gains.kd = kd;
    }

    pub fn set_cartesian_kp3x3(&mut self, kp: Matrix3<f32>) {
        self.cartesian.gains.kp = kp;
    }

    pub fn set_cartesian_kd3x3(&mut self, kd: Matrix3<f32>) {
        self.cartesian.gains.kd = kd;
    }

    pub fn set_fault_current(&mut self, fault_current: f32) {
        self.fault_current = fault_current;
    }

    pub fn set_fault_velocity(&mut self, fault_velocity: f32) {
        self.fault_velocity = fault_velocity;
    }

    pub fn set_fault_position(&mut self, fault_position: f32) {
        self.fault_position = fault_position;
    }

    /// Saturation bound [A]. Negative or NaN values are ignored.
    pub fn set_max_current(&mut self, max_current: f32) {
        if !(max_current >= 0.0) {
            warn!("Ignoring max current {max_current}, must be >= 0");
            return;
        }
        self.max_current = max_current;
    }

    // ─── Queries ────────────────────────────────────────────────────

    #[inline]
    pub fn control_mode(&self) -> ControlMode {
        self.mode.mode()
    }

    /// Most recent fault, kept across `set_idle`.
    #[inline]
    pub fn last_fault(&self) -> Option<&DriveFault> {
        self.last_fault.as_ref()
    }

    #[inline]
    pub fn max_current(&self) -> f32 {
        self.max_current
    }

    #[inline]
    pub fn is_homed(&self, group: AxisGroup) -> bool {
        self.actuators.is_homed(group)
    }

    #[inline]
    pub fn zero_positions(&self) -> &ActuatorPositionVector {
        self.actuators.zero_positions()
    }

    #[inline]
    pub fn position_reference(&self) -> &ActuatorPositionVector {
        &self.position_reference
    }

    #[inline]
    pub fn cartesian_position_reference(&self) -> &ActuatorPositionVector {
        &self.cartesian_position_reference
    }

    #[inline]
    pub fn last_commanded_current(&self) -> &ActuatorCurrentVector {
        &self.last_commanded_current
    }

    /// Whether the post-homing blend is still running.
    #[inline]
    pub fn homing_handoff_active(&self) -> bool {
        self.homing_progress.is_active()
    }

    #[inline]
    fn telemetry(&self, index: ActuatorIndex) -> ActuatorTelemetry {
        self.buses.get(index)
    }

    #[inline]
    pub fn calibrated(&self, index: ActuatorIndex) -> CalibratedTelemetry {
        self.actuators.calibrate(index, &self.telemetry(index))
    }

    fn index_or_fault(&mut self, i: u8) -> Option<ActuatorIndex> {
        match ActuatorIndex::try_from(i) {
            Ok(index) => Some(index),
            Err(fault) => {
                self.raise_fault(fault);
                None
            }
        }
    }

    /// Raw position of actuator `i`. Invalid index → Error, returns 0.
    pub fn raw_actuator_position(&mut self, i: u8) -> f32 {
        self.index_or_fault(i)
            .map_or(0.0, |index| self.telemetry(index).position)
    }

    /// Calibrated position of actuator `i`. Invalid index → Error, returns 0.
    pub fn actuator_position(&mut self, i: u8) -> f32 {
        self.index_or_fault(i)
            .map_or(0.0, |index| self.calibrated(index).position)
    }

    /// Calibrated velocity of actuator `i`. Invalid index → Error, returns 0.
    pub fn actuator_velocity(&mut self, i: u8) -> f32 {
        self.index_or_fault(i)
            .map_or(0.0, |index| self.calibrated(index).velocity)
    }

    /// Calibrated current of actuator `i`. Invalid index → Error, returns 0.
    pub fn actuator_current(&mut self, i: u8) -> f32 {
        self.index_or_fault(i)
            .map_or(0.0, |index| self.calibrated(index).current)
    }

    pub fn raw_actuator_positions(&self) -> ActuatorPositionVector {
        ActuatorIndex::map_all(|i| self.telemetry(i).position)
    }

    pub fn actuator_positions(&self) -> ActuatorPositionVector {
        ActuatorIndex::map_all(|i| self.calibrated(i).position)
    }

    pub fn actuator_velocities(&self) -> ActuatorVelocityVector {
        ActuatorIndex::map_all(|i| self.calibrated(i).velocity)
    }

    pub fn actuator_currents(&self) -> ActuatorCurrentVector {
        ActuatorIndex::map_all(|i| self.calibrated(i).current)
    }

    /// Bus-reported electrical power summed over all actuators [W].
    pub fn total_electrical_power(&self) -> f32 {
        ActuatorIndex::all()
            .map(|i| self.telemetry(i).electrical_power)
            .sum()
    }

    /// Bus-reported mechanical power summed over all actuators [W].
    pub fn total_mechanical_power(&self) -> f32 {
        ActuatorIndex::all()
            .map(|i| self.telemetry(i).mechanical_power)
            .sum()
    }

    // ─── Orientation ────────────────────────────────────────────────

    pub fn setup_imu(&mut self, filter_frequency: u32) {
        self.imu.setup(filter_frequency);
    }

    pub fn update_imu(&mut self) {
        self.imu.update();
    }

    #[inline]
    pub fn orientation(&self) -> Orientation {
        self.imu.orientation()
    }

    // ─── Telemetry ──────────────────────────────────────────────────

    /// Flat snapshot: timestamp, orientation, then per actuator
    /// `p, v, I, pr, vr, Ir, Il`.
    pub fn debug_data(&self, now_ms: u64) -> [f32; NUM_DEBUG_VALUES] {
        let mut out = [0.0; NUM_DEBUG_VALUES];
        let o = self.orientation();
        out[0] = now_ms as f32;
        out[1..7].copy_from_slice(&[o.yaw, o.pitch, o.roll, o.yaw_rate, o.pitch_rate, o.roll_rate]);
        for index in ActuatorIndex::all() {
            let i = index.as_usize();
            let cal = self.calibrated(index);
            let base = actuator_block_offset(i);
            out[base..base + NUM_VALUES_PER_ACTUATOR].copy_from_slice(&[
                cal.position,
                cal.velocity,
                cal.current,
                self.position_reference[i],
                self.velocity_reference[i],
                self.current_reference[i],
                self.last_commanded_current[i],
            ]);
        }
        out
    }

    /// Structured snapshot for external serializers.
    pub fn status(&self, now_ms: u64) -> DriveStatus {
        let o = self.orientation();
        DriveStatus {
            ts: now_ms,
            mode: self.control_mode(),
            yaw: o.yaw,
            pitch: o.pitch,
            roll: o.roll,
            yaw_rate: o.yaw_rate,
            pitch_rate: o.pitch_rate,
            roll_rate: o.roll_rate,
            pos: self.actuator_positions(),
            vel: self.actuator_velocities(),
            cur: self.actuator_currents(),
            pref: self.position_reference,
            vref: self.velocity_reference,
            cref: self.current_reference,
            lcur: self.last_commanded_current,
        }
    }

    // ─── Collaborators ──────────────────────────────────────────────

    #[inline]
    pub fn buses(&self) -> &BusPair<B> {
        &self.buses
    }

    #[inline]
    pub fn buses_mut(&mut self) -> &mut BusPair<B> {
        &mut self.buses
    }

    #[inline]
    pub fn imu(&self) -> &S {
        &self.imu
    }

    #[inline]
    pub fn imu_mut(&mut self) -> &mut S {
        &mut self.imu
    }
}
