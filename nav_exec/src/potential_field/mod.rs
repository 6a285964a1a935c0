//! # Potential field planner
//!
//! The potential field (or local) planner deforms the route tracker's local path around obstacles
//! sensed by the robot. A virtual "cursor" starts at the robot and is stepped forwards by a fixed
//! distance each iteration in the direction of the sum of two forces:
//!
//! - Attraction towards the next few route poses, the mean of the unit vectors pointing from the
//!   cursor to each of them.
//! - Repulsion from every obstacle point, given by the repulsion field evaluated in the cursor's
//!   frame. Repulsion never pushes the cursor backwards.
//!
//! The resulting poses are produced lazily, so a follower only pays for the part of the path it
//! actually looks at.
//!
//! Obstacles are only fetched when there is a path to deform. Key poses, finish and failure pass
//! straight through, so a stalled or broken obstacle source can't stop the robot from reaching a
//! key pose or coming to rest at the end of the route.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod obstacles;
pub mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Standard
use std::{collections::VecDeque, sync::Arc};

// External
use log::trace;
use nalgebra::Vector2;

// Internal
pub use obstacles::{CancelHandle, ChannelObstacles, ObstacleError, ObstacleSource, StaticObstacles};
pub use params::Params;
use crate::{
    geom::Pose,
    local_path::{LocalPath, PoseIter},
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Maximum number of poses in a deformed path.
pub const MAX_DEFORMED_POSES: usize = 50;

/// A new pose closer than this to one of the recent poses ends the path.
const LOOP_GUARD_DISTANCE_M: f64 = 0.01;

/// Below this magnitude the total force is considered to be zero.
const MIN_FORCE: f64 = 1e-6;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Repulsion caused by an obstacle point, as a function of its position relative to the cursor.
pub type RepelField = Box<dyn Fn(&Vector2<f64>) -> Vector2<f64> + Send + Sync>;

pub struct PotentialFieldPlanner {
    params: Params,

    repel_field: Arc<RepelField>,

    obstacles: Box<dyn ObstacleSource>,
}

/// Lazy iterator over the poses of a deformed path.
struct DeformedPath {
    source: PoseIter,

    /// Route poses currently attracting the cursor
    attract: VecDeque<Pose>,

    /// Recently emitted positions, used to detect the cursor getting stuck
    recent: VecDeque<Vector2<f64>>,

    obstacles_m: Vec<Vector2<f64>>,

    cursor: Pose,

    repel_field: Arc<RepelField>,

    repel_weight: f64,
    step_length_m: f64,
    look_ahead: usize,

    finished: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PotentialFieldError {
    #[error("Repel weight must be positive, got {0}")]
    InvalidRepelWeight(f64),

    #[error("Step length must be positive, got {0}")]
    InvalidStepLength(f64),

    #[error("Look ahead must be greater than zero")]
    InvalidLookAhead,

    #[error("Minimum repel points count must be greater than zero")]
    InvalidMinRepelPointsCount,

    #[error("Could not get obstacles: {0}")]
    ObstacleError(ObstacleError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PotentialFieldPlanner {
    /// Create a new planner using the inverse cube repulsion field.
    pub fn new(
        params: Params,
        obstacles: Box<dyn ObstacleSource>,
    ) -> Result<Self, PotentialFieldError> {
        Self::with_repel_field(params, Box::new(inverse_cube_repel), obstacles)
    }

    pub fn with_repel_field(
        params: Params,
        repel_field: RepelField,
        obstacles: Box<dyn ObstacleSource>,
    ) -> Result<Self, PotentialFieldError> {
        if !(params.repel_weight > 0.0) {
            return Err(PotentialFieldError::InvalidRepelWeight(params.repel_weight));
        }
        if !(params.step_length_m > 0.0) {
            return Err(PotentialFieldError::InvalidStepLength(params.step_length_m));
        }
        if params.look_ahead == 0 {
            return Err(PotentialFieldError::InvalidLookAhead);
        }
        if params.min_repel_points_count == 0 {
            return Err(PotentialFieldError::InvalidMinRepelPointsCount);
        }

        Ok(Self {
            params,
            repel_field: Arc::new(repel_field),
            obstacles,
        })
    }

    /// Deform the given local path around the current obstacles.
    ///
    /// Only `Path` is modified, every other variant is returned unchanged without fetching
    /// obstacles.
    pub fn plan(&mut self, local_path: LocalPath) -> Result<LocalPath, PotentialFieldError> {
        let source = match local_path {
            LocalPath::Path(source) => source,
            other => return Ok(other),
        };

        let obstacles_m = self
            .obstacles
            .snapshot()
            .map_err(PotentialFieldError::ObstacleError)?;

        trace!("Deforming path around {} obstacle points", obstacles_m.len());

        let repel_weight = self.params.repel_weight
            / self.params.min_repel_points_count.max(obstacles_m.len()) as f64;

        let deformed = DeformedPath {
            source,
            attract: VecDeque::with_capacity(self.params.look_ahead),
            recent: VecDeque::with_capacity(self.params.look_ahead),
            obstacles_m,
            cursor: Pose::identity(),
            repel_field: self.repel_field.clone(),
            repel_weight,
            step_length_m: self.params.step_length_m,
            look_ahead: self.params.look_ahead,
            finished: false,
        };

        Ok(LocalPath::Path(Box::new(deformed.take(MAX_DEFORMED_POSES))))
    }
}

impl DeformedPath {
    /// Mean of the unit vectors from the cursor to each attracting pose.
    fn attraction(&self) -> Vector2<f64> {
        let sum: Vector2<f64> = self
            .attract
            .iter()
            .map(|p| {
                (p.position_m - self.cursor.position_m)
                    .try_normalize(0.0)
                    .unwrap_or_else(Vector2::zeros)
            })
            .sum();

        sum / self.attract.len() as f64
    }

    /// Weighted repulsion from all obstacles, in the robot frame.
    fn repulsion(&self) -> Vector2<f64> {
        if self.obstacles_m.is_empty() {
            return Vector2::zeros();
        }

        let sum: Vector2<f64> = self
            .obstacles_m
            .iter()
            .map(|o| (self.repel_field)(&self.cursor.inverse_transform_point(o)))
            .sum();

        // Never push the cursor backwards
        let forward = Vector2::new(sum.x.max(0.0), sum.y);

        self.cursor.rotate_vector(&forward) * self.repel_weight
    }

    /// Drop attracting poses that the cursor has already passed.
    fn drop_passed(&mut self) {
        let cursor = self.cursor.position_m;

        while self.attract.len() > 1 {
            let head = (self.attract[0].position_m - cursor).norm();
            let next = (self.attract[1].position_m - cursor).norm();

            if next < head {
                self.attract.pop_front();
            }
            else {
                break;
            }
        }
    }
}

impl Iterator for DeformedPath {
    type Item = Pose;

    fn next(&mut self) -> Option<Pose> {
        if self.finished {
            return None;
        }

        while self.attract.len() < self.look_ahead {
            match self.source.next() {
                Some(p) => self.attract.push_back(p),
                None => break,
            }
        }

        if self.attract.is_empty() {
            self.finished = true;
            return None;
        }

        self.drop_passed();

        let force = self.attraction() + self.repulsion();
        let direction = if force.norm() > MIN_FORCE {
            force.normalize()
        }
        else {
            Vector2::new(1.0, 0.0)
        };

        let heading_sum: Vector2<f64> = self.attract.iter().map(|p| p.heading_vector()).sum();

        let position_m = self.cursor.position_m + direction * self.step_length_m;

        if self
            .recent
            .iter()
            .any(|r| (r - position_m).norm() < LOOP_GUARD_DISTANCE_M)
        {
            trace!("Deformed path is looping, stopping");
            self.finished = true;
            return None;
        }

        if self.recent.len() >= self.look_ahead {
            self.recent.pop_front();
        }
        self.recent.push_back(position_m);

        self.cursor = Pose::from_parts(position_m, heading_sum.y.atan2(heading_sum.x));

        Some(self.cursor)
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Repulsion decaying with the square of the distance, pointing away from the obstacle.
///
/// An obstacle exactly at the cursor has no defined direction and contributes nothing.
pub fn inverse_cube_repel(v: &Vector2<f64>) -> Vector2<f64> {
    let norm = v.norm();

    if norm < f64::EPSILON {
        Vector2::zeros()
    }
    else {
        -v / norm.powi(3)
    }
}
