//! Actuator indexing and per-actuator vector types.
//!
//! Actuators are numbered 0..=11 in leg-major order: leg `l` owns
//! `3l` (abduction), `3l + 1` (hip) and `3l + 2` (knee). Indices 0-5 live on
//! the front bus, 6-11 on the rear bus.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::bus::BusId;
use crate::consts::{JOINTS_PER_LEG, NUM_ACTUATORS, NUM_ACTUATORS_PER_BUS, NUM_LEGS};
use crate::error::DriveFault;

/// Calibrated joint positions [rad], one per actuator.
pub type ActuatorPositionVector = [f32; NUM_ACTUATORS];

/// Joint velocities [rad/s], one per actuator.
pub type ActuatorVelocityVector = [f32; NUM_ACTUATORS];

/// Motor currents [A], one per actuator.
pub type ActuatorCurrentVector = [f32; NUM_ACTUATORS];

/// Per-actuator enable mask.
pub type ActuatorActivations = [bool; NUM_ACTUATORS];

/// Joint role within a leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum JointKind {
    Abduction = 0,
    Hip = 1,
    Knee = 2,
}

/// Validated actuator index in `0..NUM_ACTUATORS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActuatorIndex(u8);

impl ActuatorIndex {
    /// Returns `None` for indices outside `0..=11`.
    #[inline]
    pub const fn new(raw: u8) -> Option<Self> {
        if (raw as usize) < NUM_ACTUATORS {
            Some(Self(raw))
        } else {
            None
        }
    }

    /// Index of `joint` on leg `leg`. Returns `None` for `leg >= 4`.
    #[inline]
    pub const fn from_leg_joint(leg: usize, joint: JointKind) -> Option<Self> {
        if leg < NUM_LEGS {
            Some(Self((leg * JOINTS_PER_LEG) as u8 + joint as u8))
        } else {
            None
        }
    }

    #[inline]
    pub const fn get(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn leg(self) -> usize {
        self.as_usize() / JOINTS_PER_LEG
    }

    #[inline]
    pub const fn joint(self) -> JointKind {
        match self.0 as usize % JOINTS_PER_LEG {
            0 => JointKind::Abduction,
            1 => JointKind::Hip,
            _ => JointKind::Knee,
        }
    }

    /// Bus the actuator is wired to.
    #[inline]
    pub const fn bus(self) -> BusId {
        if self.as_usize() < NUM_ACTUATORS_PER_BUS {
            BusId::Front
        } else {
            BusId::Rear
        }
    }

    /// Index local to the actuator's bus (0..=5).
    #[inline]
    pub const fn local(self) -> usize {
        self.as_usize() % NUM_ACTUATORS_PER_BUS
    }

    /// All twelve indices in ascending order.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..NUM_ACTUATORS as u8).map(Self)
    }

    /// Per-actuator array with entry `i` set to `f(i)`.
    pub fn map_all<T>(mut f: impl FnMut(Self) -> T) -> [T; NUM_ACTUATORS] {
        std::array::from_fn(|i| f(Self(i as u8)))
    }
}

impl TryFrom<u8> for ActuatorIndex {
    type Error = DriveFault;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        Self::new(raw).ok_or(DriveFault::InvalidActuatorIndex(raw))
    }
}

impl From<ActuatorIndex> for usize {
    fn from(index: ActuatorIndex) -> Self {
        index.as_usize()
    }
}

bitflags! {
    /// Named groups of actuators, one bit per index.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AxisGroup: u16 {
        /// Right abduction joints (legs 0 and 2).
        const RIGHT_ABDUCTION = 0x0041;
        /// Hip joints.
        const HIPS            = 0x0492;
        /// Left abduction joints (legs 1 and 3).
        const LEFT_ABDUCTION  = 0x0208;
        /// Knee joints.
        const KNEES           = 0x0924;
        /// Both sides' abduction joints.
        const ABDUCTION = Self::RIGHT_ABDUCTION.bits() | Self::LEFT_ABDUCTION.bits();
        /// Every actuator.
        const ALL = Self::ABDUCTION.bits() | Self::HIPS.bits() | Self::KNEES.bits();
    }
}

impl AxisGroup {
    /// Group containing only `index`.
    #[inline]
    pub const fn single(index: ActuatorIndex) -> Self {
        Self::from_bits_truncate(1u16 << index.get())
    }

    #[inline]
    pub const fn contains_actuator(&self, index: ActuatorIndex) -> bool {
        self.contains(Self::single(index))
    }

    /// Member indices in ascending order.
    pub fn actuators(self) -> impl Iterator<Item = ActuatorIndex> {
        ActuatorIndex::all().filter(move |i| self.contains_actuator(*i))
    }
}
