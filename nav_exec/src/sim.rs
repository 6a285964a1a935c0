//! # Simulation
//!
//! A kinematic simulation of a differential drive chassis, used to exercise the navigation
//! pipeline without any hardware. The simulation provides:
//!
//! - The robot's map frame pose, integrated from the commands sent to the chassis.
//! - Obstacle points placed in the map, seen from the robot's current pose.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::{Arc, PoisonError, RwLock};

use log::trace;
use nalgebra::Vector2;
use serde::Deserialize;

use crate::{
    geom::Pose,
    potential_field::{ObstacleError, ObstacleSource},
};
use comms_if::eqpt::chassis::Command;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Simulation parameters
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Params {
    /// Period of one simulated cycle
    pub cycle_period_s: f64,

    /// The simulation stops after this many cycles even if the route isn't complete
    pub max_cycles: usize,

    /// Map frame pose of the robot at the start of the simulation
    pub start_pose: Pose,

    /// Map frame obstacle points
    pub obstacles_m: Vec<Vector2<f64>>,
}

/// Unicycle model of a differential drive chassis.
pub struct SimChassis {
    pose: Pose,

    /// Copy of the pose shared with the simulated sensors
    shared_pose: Arc<RwLock<Pose>>,

    /// Last command received
    cmd: Command,
}

/// Map frame obstacles expressed in the frame of the simulated robot.
pub struct MapObstacles {
    points_m: Vec<Vector2<f64>>,

    robot_pose: Arc<RwLock<Pose>>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("The simulated pose lock is poisoned")]
    LockPoisoned,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            cycle_period_s: 0.1,
            max_cycles: 3000,
            start_pose: Pose::identity(),
            obstacles_m: Vec::new(),
        }
    }
}

impl SimChassis {
    pub fn new(start_pose: Pose) -> Self {
        Self {
            pose: start_pose,
            shared_pose: Arc::new(RwLock::new(start_pose)),
            cmd: Command::stop(),
        }
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// Set the command the chassis executes from now on.
    ///
    /// As with a real chassis, the last command keeps being executed until a new one is sent.
    pub fn send(&mut self, cmd: Command) {
        self.cmd = cmd;
    }

    /// Advance the simulation by the given time step.
    pub fn step(&mut self, dt_s: f64) -> Result<(), SimError> {
        let v = self.cmd.linear_speed_ms;
        let w = self.cmd.angular_rate_rads;

        // Midpoint heading integration
        let mid_heading = self.pose.heading_rad + 0.5 * w * dt_s;
        let position_m = self.pose.position_m
            + Vector2::new(mid_heading.cos(), mid_heading.sin()) * v * dt_s;

        self.pose = Pose::from_parts(position_m, self.pose.heading_rad + w * dt_s);

        trace!("Sim pose {:?}", self.pose);

        *self.shared_pose.write()? = self.pose;

        Ok(())
    }

    /// Create an obstacle source seeing the given map frame points from this chassis.
    pub fn obstacles(&self, points_m: Vec<Vector2<f64>>) -> MapObstacles {
        MapObstacles {
            points_m,
            robot_pose: self.shared_pose.clone(),
        }
    }
}

impl ObstacleSource for MapObstacles {
    fn snapshot(&mut self) -> Result<Vec<Vector2<f64>>, ObstacleError> {
        let pose = *self
            .robot_pose
            .read()
            .map_err(|_| ObstacleError::Disconnected)?;

        Ok(self
            .points_m
            .iter()
            .map(|p| pose.inverse_transform_point(p))
            .collect())
    }
}

impl<G> From<PoisonError<G>> for SimError {
    fn from(_: PoisonError<G>) -> Self {
        SimError::LockPoisoned
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_load_params() {
        let params: Params =
            util::params::load_from(concat!(env!("CARGO_MANIFEST_DIR"), "/../params/sim.toml"))
                .unwrap();

        assert!((params.cycle_period_s - 0.1).abs() < 1e-12);
        assert_eq!(params.obstacles_m.len(), 3);
    }

    #[test]
    fn test_straight() {
        let mut chassis = SimChassis::new(Pose::identity());
        chassis.send(Command::new(0.2, 0.0));

        for _ in 0..10 {
            chassis.step(0.1).unwrap();
        }

        assert!((chassis.pose().position_m.x - 0.2).abs() < 1e-9);
        assert!(chassis.pose().position_m.y.abs() < 1e-9);
    }

    #[test]
    fn test_pivot() {
        let mut chassis = SimChassis::new(Pose::new(1.0, 1.0, 0.0));
        chassis.send(Command::pivot(FRAC_PI_2));
        chassis.step(1.0).unwrap();

        assert!((chassis.pose().heading_rad - FRAC_PI_2).abs() < 1e-9);
        assert!((chassis.pose().position_m - Vector2::new(1.0, 1.0)).norm() < 1e-9);
    }

    #[test]
    fn test_map_obstacles() {
        let mut chassis = SimChassis::new(Pose::new(1.0, 0.0, FRAC_PI_2));
        let mut obstacles = chassis.obstacles(vec![Vector2::new(1.0, 1.0)]);

        let seen = obstacles.snapshot().unwrap();
        assert!((seen[0] - Vector2::new(1.0, 0.0)).norm() < 1e-9);

        // Obstacles follow the chassis
        chassis.send(Command::pivot(FRAC_PI_2));
        chassis.step(1.0).unwrap();
        let seen = obstacles.snapshot().unwrap();
        assert!((seen[0] - Vector2::new(0.0, -1.0)).norm() < 1e-9);
    }
}
