//! # Chassis interface
//!
//! Velocity demands consumed by the differential-drive chassis driver.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A velocity demand for a non-omnidirectional chassis.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Command {
    /// The forward speed of the chassis in meters/second.
    ///
    /// Positive speeds are "forwards", negative speeds are "backwards"
    pub linear_speed_ms: f64,

    /// The turn rate of the chassis in radians/second.
    ///
    /// Follows the right hand rule about the robot's Z+ (upwards) axis, so that a positive turn
    /// rate will rotate the robot to the left, and a negative turn rate will rotate the robot to
    /// the right.
    pub angular_rate_rads: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Command {
    pub fn new(linear_speed_ms: f64, angular_rate_rads: f64) -> Self {
        Self {
            linear_speed_ms,
            angular_rate_rads,
        }
    }

    /// Zero velocity demand.
    pub fn stop() -> Self {
        Self::default()
    }

    /// Turn on the spot at the given rate.
    pub fn pivot(angular_rate_rads: f64) -> Self {
        Self::new(0.0, angular_rate_rads)
    }

    pub fn is_stop(&self) -> bool {
        self.linear_speed_ms == 0.0 && self.angular_rate_rads == 0.0
    }
}
