//! Path follower parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;
use std::f64::consts::PI;

// Internal
use crate::geom::{Pose, ShapeParams};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the virtual light sensor path follower
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Params {
    /// Pose of the virtual light sensor in the robot frame
    pub sensor_pose: Pose,

    /// Footprint of the virtual light sensor, in the sensor frame
    pub light_range: ShapeParams,

    /// Heading changes between consecutive path poses larger than this are considered sharp
    /// corners.
    pub min_tip_angle_rad: f64,

    /// Bearings to a corner larger than this angle trigger a pivot turn.
    pub min_turn_angle_rad: f64,

    /// Bearing beyond which a pivot turn goes the "long way" round.
    ///
    /// Must be in [-pi, pi]. Setting it to pi means always turning the short way.
    pub turn_threshold_rad: f64,

    /// Linear speed while driving along the path
    pub max_speed_ms: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            sensor_pose: Pose::new(0.275, 0.0, 0.0),
            light_range: ShapeParams::default(),
            min_tip_angle_rad: PI / 3.0,
            min_turn_angle_rad: PI / 12.0,
            turn_threshold_rad: PI,
            max_speed_ms: 0.2,
        }
    }
}
