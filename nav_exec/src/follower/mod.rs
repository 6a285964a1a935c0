//! # Path follower
//!
//! The path follower turns the local path into a velocity command for the chassis. While the
//! path ahead is smooth the robot drives at a fixed speed, steering with the reading of a
//! [`VirtualLightSensor`]. When a sharp corner is close the robot stops and pivots on the spot
//! until the path ahead is roughly straight again.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod params;
mod sensor;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Standard
use std::f64::consts::{FRAC_PI_2, PI, TAU};

// External
use log::{debug, info, trace};

// Internal
pub use params::Params;
pub use sensor::VirtualLightSensor;
use crate::{
    geom::{Pose, ShapeError},
    local_path::LocalPath,
};
use comms_if::{eqpt::chassis::Command, tm::FollowerState};
use util::maths::{sign, wrap_to_pi};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Corners closer than this many poses are dealt with before driving on.
pub const PRE_TURN_COUNT: usize = 4;

/// Key poses with a heading below this are considered reached.
const KEY_POSE_HEADING_TOLERANCE_RAD: f64 = 10.0 * PI / 180.0;

/// Distance along the corner's outgoing heading used to aim pivot turns.
const TIP_LOOK_AHEAD_M: f64 = 0.2;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

pub struct PathFollower {
    params: Params,

    sensor: VirtualLightSensor,

    cos_min_tip: f64,

    /// Direction of the pending or current pivot turn, -1 (clockwise), 0 or +1 (anticlockwise)
    dir: i8,

    turning: bool,

    state: FollowerState,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum FollowerError {
    #[error("Invalid light range: {0}")]
    InvalidLightRange(ShapeError),

    #[error("Minimum tip angle must be in [0, pi], got {0}")]
    InvalidMinTipAngle(f64),

    #[error("Minimum turn angle must be in [0, pi], got {0}")]
    InvalidMinTurnAngle(f64),

    #[error("Turn threshold must be in [-pi, pi], got {0}")]
    InvalidTurnThreshold(f64),

    #[error("Maximum speed must be positive, got {0}")]
    InvalidMaxSpeed(f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PathFollower {
    pub fn new(params: Params) -> Result<Self, FollowerError> {
        if !(0.0..=PI).contains(&params.min_tip_angle_rad) {
            return Err(FollowerError::InvalidMinTipAngle(params.min_tip_angle_rad));
        }
        if !(0.0..=PI).contains(&params.min_turn_angle_rad) {
            return Err(FollowerError::InvalidMinTurnAngle(params.min_turn_angle_rad));
        }
        if !(-PI..=PI).contains(&params.turn_threshold_rad) {
            return Err(FollowerError::InvalidTurnThreshold(params.turn_threshold_rad));
        }
        if !(params.max_speed_ms > 0.0) {
            return Err(FollowerError::InvalidMaxSpeed(params.max_speed_ms));
        }

        let light_range = params.light_range.build()?;
        let sensor = VirtualLightSensor::new(params.sensor_pose, light_range);

        Ok(Self {
            cos_min_tip: params.min_tip_angle_rad.cos(),
            params,
            sensor,
            dir: 0,
            turning: false,
            state: FollowerState::Idle,
        })
    }

    /// Compute the command for the given local path, `None` if the robot doesn't know where to
    /// go.
    pub fn plan(&mut self, local_path: LocalPath) -> Option<Command> {
        let cmd = match local_path {
            LocalPath::Finish => {
                self.dir = 0;
                self.turning = false;
                Some(Command::stop())
            }
            LocalPath::Failure => None,
            LocalPath::KeyPose(pose) => Some(self.key_pose(&pose)),
            LocalPath::Path(path) => self.follow(path),
        };

        self.state = match cmd {
            Some(_) if self.turning => FollowerState::Turning,
            Some(c) if !c.is_stop() => FollowerState::Driving,
            _ => FollowerState::Idle,
        };

        cmd
    }

    pub fn state(&self) -> FollowerState {
        self.state
    }

    pub fn sensor(&self) -> &VirtualLightSensor {
        &self.sensor
    }

    fn key_pose(&mut self, pose: &Pose) -> Command {
        if pose.heading_rad.abs() < KEY_POSE_HEADING_TOLERANCE_RAD {
            self.turning = false;
            Command::stop()
        }
        else {
            self.dir = sign(pose.heading_rad);
            self.turn()
        }
    }

    fn follow<I>(&mut self, path: I) -> Option<Command>
    where
        I: Iterator<Item = Pose>,
    {
        let bright = self.sensor.shine(path);

        if self.turning && bright.len() < PRE_TURN_COUNT {
            return Some(self.turn());
        }

        if bright.is_empty() {
            return if self.dir != 0 {
                Some(self.turn())
            }
            else {
                None
            };
        }

        let (tip_index, tip) = self.find_tip(&bright);

        if tip_index > PRE_TURN_COUNT {
            self.dir = 0;
        }
        else if self.calculate_dir(&tip) {
            return Some(self.turn());
        }

        if self.turning {
            info!("Pivot turn complete");
        }
        self.turning = false;

        let light = self.sensor.invoke(&bright[..=tip_index]);
        trace!("Light value {:.3} over {} poses", light, tip_index + 1);

        Some(Command::new(self.params.max_speed_ms, -FRAC_PI_2 * light))
    }

    /// Find the first sharp corner in the lit path.
    ///
    /// Returns the index of the pose before the corner and the pose after it, or the last index
    /// and pose if the path has no corner.
    fn find_tip(&self, bright: &[Pose]) -> (usize, Pose) {
        let last_index = bright.len() - 1;

        bright
            .windows(2)
            .position(|w| w[0].heading_vector().dot(&w[1].heading_vector()) < self.cos_min_tip)
            .map(|i| (i, bright[i + 1]))
            .unwrap_or((last_index, bright[last_index]))
    }

    /// Update the turn direction to face the given corner, returning true if a turn is needed.
    fn calculate_dir(&mut self, tip: &Pose) -> bool {
        let aim = tip.position_m + tip.heading_vector() * TIP_LOOK_AHEAD_M;
        let target = wrap_to_pi(aim.y.atan2(aim.x));

        let turn = target.abs() > self.params.min_turn_angle_rad;

        self.dir = if turn {
            let threshold = self.params.turn_threshold_rad;

            let resolved = if target <= threshold && threshold <= 0.0 {
                target + TAU
            }
            else if 0.0 <= threshold && threshold <= target {
                target - TAU
            }
            else {
                target
            };

            sign(resolved)
        }
        else {
            0
        };

        debug!("Corner bearing {:.3} rad, turn direction {}", target, self.dir);

        turn
    }

    fn turn(&mut self) -> Command {
        if !self.turning {
            info!("Starting pivot turn (direction {})", self.dir);
        }
        self.turning = true;

        Command::pivot(self.dir as f64 * FRAC_PI_2)
    }
}

impl From<ShapeError> for FollowerError {
    fn from(e: ShapeError) -> Self {
        FollowerError::InvalidLightRange(e)
    }
}
