//! Simulated actuator bus.
//!
//! Six motors with a first-order model: commanded current produces torque,
//! viscous damping opposes velocity. `poll()` advances the model by one
//! fixed period and refreshes the cached telemetry.

use std::time::Duration;

use heapless::HistoryBuf;
use quad_common::bus::{ActuatorBus, ActuatorTelemetry, BusId, Subgroup};
use quad_common::consts::{ACTUATORS_PER_SUBGROUP, MILLI_UNITS_PER_UNIT, NUM_ACTUATORS_PER_BUS};
use quad_common::error::BusError;
use tracing::{debug, trace, warn};

/// Frames kept for inspection; older ones are evicted.
pub const FRAME_HISTORY: usize = 64;

/// Physical constants of a simulated motor (output side).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotorModel {
    /// Output torque per amp [Nm/A].
    pub torque_constant: f32,
    /// Reflected rotor + link inertia [kg·m²].
    pub inertia: f32,
    /// Viscous damping [Nm·s/rad].
    pub damping: f32,
    /// Winding resistance [Ω].
    pub resistance: f32,
}

impl Default for MotorModel {
    fn default() -> Self {
        Self {
            torque_constant: 0.18,
            inertia: 0.002,
            damping: 0.05,
            resistance: 0.3,
        }
    }
}

/// One torque frame as received by the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TorqueFrame {
    /// Addressed subgroup.
    pub subgroup: Subgroup,
    /// Milli-amp commands, in slot order.
    pub torques: [i32; ACTUATORS_PER_SUBGROUP],
}

#[derive(Debug, Clone, Copy, Default)]
struct SimulatedMotor {
    position: f32,
    velocity: f32,
    current: f32,
}

/// In-memory actuator bus implementing [`ActuatorBus`].
#[derive(Debug)]
pub struct SimulatedBus {
    id: BusId,
    model: MotorModel,
    period: Duration,
    frozen: bool,
    motors: [SimulatedMotor; NUM_ACTUATORS_PER_BUS],
    cached: [ActuatorTelemetry; NUM_ACTUATORS_PER_BUS],
    history: HistoryBuf<TorqueFrame, FRAME_HISTORY>,
    latest: [Option<TorqueFrame>; 2],
    poll_count: u64,
    fail_next: Option<String>,
}

impl SimulatedBus {
    /// Bus with the default motor model and a 1 ms integration period.
    pub fn new(id: BusId) -> Self {
        Self::with_model(id, MotorModel::default(), Duration::from_millis(1))
    }

    /// Bus with an explicit motor model and integration period.
    pub fn with_model(id: BusId, model: MotorModel, period: Duration) -> Self {
        debug!("Simulated {id:?} bus: period={period:?}, model={model:?}");
        Self {
            id,
            model,
            period,
            frozen: false,
            motors: [SimulatedMotor::default(); NUM_ACTUATORS_PER_BUS],
            cached: [ActuatorTelemetry::default(); NUM_ACTUATORS_PER_BUS],
            history: HistoryBuf::new(),
            latest: [None; 2],
            poll_count: 0,
            fail_next: None,
        }
    }

    /// Disable dynamics: `poll()` keeps injected telemetry unchanged.
    pub fn frozen(mut self) -> Self {
        self.frozen = true;
        self
    }

    /// Bus identifier.
    pub fn id(&self) -> BusId {
        self.id
    }

    /// Set position and velocity of motor `local` and refresh its telemetry.
    pub fn set_motor_state(&mut self, local: usize, position: f32, velocity: f32) {
        if let Some(motor) = self.motors.get_mut(local) {
            motor.position = position;
            motor.velocity = velocity;
            self.refresh(local);
        }
    }

    /// Override the cached telemetry of motor `local` verbatim.
    pub fn set_telemetry(&mut self, local: usize, telemetry: ActuatorTelemetry) {
        if let Some(motor) = self.motors.get_mut(local) {
            motor.position = telemetry.position;
            motor.velocity = telemetry.velocity;
            motor.current = telemetry.current;
            self.cached[local] = telemetry;
        }
    }

    /// Make the next `command_torques` call fail with `reason`.
    pub fn fail_next_command(&mut self, reason: impl Into<String>) {
        self.fail_next = Some(reason.into());
    }

    /// Recent accepted frames, oldest first. At most [`FRAME_HISTORY`].
    pub fn frames(&self) -> impl Iterator<Item = &TorqueFrame> {
        self.history.oldest_ordered()
    }

    /// Number of frames held in the history.
    pub fn frame_count(&self) -> usize {
        self.history.len()
    }

    /// Most recent frame sent to `subgroup`.
    pub fn last_frame(&self, subgroup: Subgroup) -> Option<TorqueFrame> {
        self.latest[slot(subgroup)]
    }

    /// Latest milli-amp command per bus-local motor (0 if never commanded).
    pub fn last_commands(&self) -> [i32; NUM_ACTUATORS_PER_BUS] {
        let mut out = [0; NUM_ACTUATORS_PER_BUS];
        for subgroup in [Subgroup::IdZeroToThree, Subgroup::IdFourToSeven] {
            if let Some(frame) = self.last_frame(subgroup) {
                for (slot, value) in frame.torques.iter().enumerate() {
                    if let Some(o) = out.get_mut(subgroup.first_local() + slot) {
                        *o = *value;
                    }
                }
            }
        }
        out
    }

    /// Number of `poll()` calls.
    pub fn poll_count(&self) -> u64 {
        self.poll_count
    }

    /// Forget recorded frames.
    pub fn clear_frames(&mut self) {
        self.history.clear();
        self.latest = [None; 2];
    }

    fn refresh(&mut self, local: usize) {
        let motor = self.motors[local];
        let torque = self.model.torque_constant * motor.current;
        let mechanical_power = torque * motor.velocity;
        self.cached[local] = ActuatorTelemetry {
            position: motor.position,
            velocity: motor.velocity,
            current: motor.current,
            electrical_power: motor.current * motor.current * self.model.resistance
                + mechanical_power,
            mechanical_power,
        };
    }
}

impl ActuatorBus for SimulatedBus {
    fn poll(&mut self) {
        self.poll_count += 1;
        if self.frozen {
            return;
        }
        let dt = self.period.as_secs_f32();
        for local in 0..NUM_ACTUATORS_PER_BUS {
            let motor = &mut self.motors[local];
            let torque = self.model.torque_constant * motor.current;
            let accel = (torque - self.model.damping * motor.velocity) / self.model.inertia;
            motor.velocity += accel * dt;
            motor.position += motor.velocity * dt;
            self.refresh(local);
        }
    }

    fn get(&self, local_index: usize) -> ActuatorTelemetry {
        self.cached.get(local_index).copied().unwrap_or_default()
    }

    fn command_torques(
        &mut self,
        torques: [i32; ACTUATORS_PER_SUBGROUP],
        subgroup: Subgroup,
    ) -> Result<(), BusError> {
        if let Some(reason) = self.fail_next.take() {
            warn!("Simulated {:?} bus rejecting frame: {reason}", self.id);
            return Err(BusError::CommandRejected {
                bus: self.id,
                subgroup,
                reason,
            });
        }

        for (slot, milli) in torques.iter().enumerate() {
            let local = subgroup.first_local() + slot;
            if let Some(motor) = self.motors.get_mut(local) {
                motor.current = *milli as f32 / MILLI_UNITS_PER_UNIT;
            }
        }
        trace!("{:?} bus {subgroup:?} <- {torques:?}", self.id);
        let frame = TorqueFrame { subgroup, torques };
        self.history.write(frame);
        self.latest[slot(subgroup)] = Some(frame);
        Ok(())
    }
}

#[inline]
const fn slot(subgroup: Subgroup) -> usize {
    subgroup.first_local() / ACTUATORS_PER_SUBGROUP
}
