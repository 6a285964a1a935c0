//! 2D rigid body pose

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Standard
use std::ops::Mul;

// External
use nalgebra::{Isometry2, Point2, Vector2};
use serde::{Deserialize, Serialize};

// Internal
use util::maths::wrap_to_pi;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A position and heading in some parent frame.
///
/// A pose doubles as the rigid transform from its own frame into the parent frame, so poses
/// compose with `*`: `a * b` is `b` (expressed in `a`'s frame) expressed in `a`'s parent frame.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Position in the parent frame
    pub position_m: Vector2<f64>,

    /// Heading in radians, anticlockwise from the parent's X axis, in (-pi, pi].
    pub heading_rad: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Pose {
    pub fn new(x_m: f64, y_m: f64, heading_rad: f64) -> Self {
        Self::from_parts(Vector2::new(x_m, y_m), heading_rad)
    }

    pub fn from_parts(position_m: Vector2<f64>, heading_rad: f64) -> Self {
        Self {
            position_m,
            heading_rad: wrap_to_pi(heading_rad),
        }
    }

    /// The pose at the origin of the parent frame facing along its X axis.
    pub fn identity() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub fn from_isometry(iso: &Isometry2<f64>) -> Self {
        Self::from_parts(iso.translation.vector, iso.rotation.angle())
    }

    pub fn to_isometry(&self) -> Isometry2<f64> {
        Isometry2::new(self.position_m, self.heading_rad)
    }

    /// Unit vector pointing along the heading.
    pub fn heading_vector(&self) -> Vector2<f64> {
        Vector2::new(self.heading_rad.cos(), self.heading_rad.sin())
    }

    /// The transform from the parent frame back into this pose's frame.
    pub fn inverse(&self) -> Self {
        Self::from_isometry(&self.to_isometry().inverse())
    }

    /// Map a point expressed in this pose's frame into the parent frame.
    pub fn transform_point(&self, point_m: &Vector2<f64>) -> Vector2<f64> {
        self.to_isometry()
            .transform_point(&Point2::from(*point_m))
            .coords
    }

    /// Map a point expressed in the parent frame into this pose's frame.
    pub fn inverse_transform_point(&self, point_m: &Vector2<f64>) -> Vector2<f64> {
        self.to_isometry()
            .inverse_transform_point(&Point2::from(*point_m))
            .coords
    }

    /// Rotate a free vector from this pose's frame into the parent frame, ignoring translation.
    pub fn rotate_vector(&self, vector: &Vector2<f64>) -> Vector2<f64> {
        self.to_isometry().transform_vector(vector)
    }

    /// Euclidian distance between the positions of two poses.
    pub fn distance_to(&self, other: &Pose) -> f64 {
        (self.position_m - other.position_m).norm()
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mul<Pose> for Pose {
    type Output = Pose;

    fn mul(self, rhs: Pose) -> Pose {
        Pose::from_isometry(&(self.to_isometry() * rhs.to_isometry()))
    }
}

impl<'a> Mul<&'a Pose> for &'a Pose {
    type Output = Pose;

    fn mul(self, rhs: &'a Pose) -> Pose {
        Pose::from_isometry(&(self.to_isometry() * rhs.to_isometry()))
    }
}
