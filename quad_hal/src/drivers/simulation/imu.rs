//! Simulated orientation sensor.

use quad_common::bus::{Orientation, OrientationSensor};
use tracing::debug;

/// Orientation sensor returning a settable sample.
#[derive(Debug, Default)]
pub struct SimulatedImu {
    orientation: Orientation,
    filter_frequency: Option<u32>,
    updates: u64,
}

impl SimulatedImu {
    /// Sensor reporting a level, motionless body.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sample returned from the next `orientation()` call on.
    pub fn set_orientation(&mut self, orientation: Orientation) {
        self.orientation = orientation;
    }

    /// Filter rate passed to `setup`, if called.
    pub fn filter_frequency(&self) -> Option<u32> {
        self.filter_frequency
    }

    /// Number of `update()` calls.
    pub fn update_count(&self) -> u64 {
        self.updates
    }
}

impl OrientationSensor for SimulatedImu {
    fn setup(&mut self, filter_frequency: u32) {
        debug!("Simulated IMU filter frequency {filter_frequency} Hz");
        self.filter_frequency = Some(filter_frequency);
    }

    fn update(&mut self) {
        self.updates += 1;
    }

    fn orientation(&self) -> Orientation {
        self.orientation
    }
}
