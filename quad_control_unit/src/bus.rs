//! Front/rear bus pair with fixed torque-frame addressing.
//!
//! | Frame | Bus   | Subgroup        | Slots               |
//! |-------|-------|-----------------|---------------------|
//! | 1     | front | `IdZeroToThree` | m0, m1, m2, m3      |
//! | 2     | front | `IdFourToSeven` | m4, m5, 0, 0        |
//! | 3     | rear  | `IdZeroToThree` | m6, m7, m8, m9      |
//! | 4     | rear  | `IdFourToSeven` | m10, m11, 0, 0      |

use quad_common::actuator::ActuatorIndex;
use quad_common::bus::{ActuatorBus, ActuatorTelemetry, BusId, Subgroup};
use quad_common::consts::{ACTUATORS_PER_SUBGROUP, NUM_ACTUATORS, NUM_ACTUATORS_PER_BUS};
use quad_common::error::BusError;

/// The two actuator buses of the robot.
#[derive(Debug)]
pub struct BusPair<B: ActuatorBus> {
    pub front: B,
    pub rear: B,
}

impl<B: ActuatorBus> BusPair<B> {
    pub fn new(front: B, rear: B) -> Self {
        Self { front, rear }
    }

    /// Refresh cached telemetry on both buses.
    pub fn poll(&mut self) {
        self.front.poll();
        self.rear.poll();
    }

    #[inline]
    pub fn bus(&self, id: BusId) -> &B {
        match id {
            BusId::Front => &self.front,
            BusId::Rear => &self.rear,
        }
    }

    #[inline]
    fn bus_mut(&mut self, id: BusId) -> &mut B {
        match id {
            BusId::Front => &mut self.front,
            BusId::Rear => &mut self.rear,
        }
    }

    /// Raw telemetry of one actuator.
    #[inline]
    pub fn get(&self, index: ActuatorIndex) -> ActuatorTelemetry {
        self.bus(index.bus()).get(index.local())
    }

    /// Send milli-amp commands for all twelve actuators as four frames.
    ///
    /// Stops at the first rejected frame; frames already sent stay sent.
    pub fn dispatch(&mut self, milli: &[i32; NUM_ACTUATORS]) -> Result<(), BusError> {
        for id in [BusId::Front, BusId::Rear] {
            let base = match id {
                BusId::Front => 0,
                BusId::Rear => NUM_ACTUATORS_PER_BUS,
            };
            for subgroup in [Subgroup::IdZeroToThree, Subgroup::IdFourToSeven] {
                let mut frame = [0; ACTUATORS_PER_SUBGROUP];
                let first = base + subgroup.first_local();
                let last = (base + NUM_ACTUATORS_PER_BUS).min(first + ACTUATORS_PER_SUBGROUP);
                frame[..last - first].copy_from_slice(&milli[first..last]);
                self.bus_mut(id).command_torques(frame, subgroup)?;
            }
        }
        Ok(())
    }
}
