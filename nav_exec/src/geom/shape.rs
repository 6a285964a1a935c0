//! Convex polygon shapes

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

// Internal
use super::Pose;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Tolerance used for containment and degeneracy checks.
const GEOM_EPSILON: f64 = 1e-9;

/// Number of vertices used to sample a circle when none is given.
pub const DEFAULT_CIRCLE_VERTICES: usize = 32;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An immutable convex polygon.
///
/// Vertices are always stored in anticlockwise order, whatever order they were supplied in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Shape {
    vertices_m: Vec<Vector2<f64>>,
    area_m2: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ShapeError {
    #[error("A shape needs at least 3 vertices but {0} were given")]
    TooFewVertices(usize),

    #[error("The shape's vertices do not form a convex polygon")]
    NotConvex,

    #[error("The shape has zero area")]
    ZeroArea,

    #[error("Circle radius must be positive and finite, got {0}")]
    InvalidRadius(f64),

    #[error("A vertex is not finite: {0:?}")]
    NonFiniteVertex(Vector2<f64>),
}

/// Description of a shape as found in parameter files.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ShapeParams {
    /// A circle centred on the origin, sampled into a polygon
    Circle {
        radius_m: f64,

        #[serde(default = "default_circle_vertices")]
        num_vertices: usize,
    },

    /// An explicit list of vertices
    Polygon { vertices_m: Vec<Vector2<f64>> },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Shape {
    /// Build a new convex shape from the given vertices.
    ///
    /// The vertices may be clockwise or anticlockwise but must describe a simple convex polygon
    /// with a non-zero area.
    pub fn new(mut vertices_m: Vec<Vector2<f64>>) -> Result<Self, ShapeError> {
        if vertices_m.len() < 3 {
            return Err(ShapeError::TooFewVertices(vertices_m.len()));
        }

        if let Some(v) = vertices_m.iter().find(|v| !v.x.is_finite() || !v.y.is_finite()) {
            return Err(ShapeError::NonFiniteVertex(*v));
        }

        let area = signed_area(&vertices_m);
        if area.abs() < GEOM_EPSILON {
            return Err(ShapeError::ZeroArea);
        }

        if area < 0.0 {
            vertices_m.reverse();
        }

        if !is_convex_ccw(&vertices_m) {
            return Err(ShapeError::NotConvex);
        }

        Ok(Self {
            vertices_m,
            area_m2: area.abs(),
        })
    }

    /// Sample a circle of the given radius, centred on the origin, into a regular polygon.
    pub fn circle(radius_m: f64, num_vertices: usize) -> Result<Self, ShapeError> {
        if !radius_m.is_finite() || radius_m <= 0.0 {
            return Err(ShapeError::InvalidRadius(radius_m));
        }

        if num_vertices < 3 {
            return Err(ShapeError::TooFewVertices(num_vertices));
        }

        let step_rad = std::f64::consts::TAU / num_vertices as f64;

        Self::new(
            (0..num_vertices)
                .map(|i| {
                    let angle = step_rad * i as f64;
                    Vector2::new(radius_m * angle.cos(), radius_m * angle.sin())
                })
                .collect(),
        )
    }

    pub fn vertices(&self) -> &[Vector2<f64>] {
        &self.vertices_m
    }

    /// The (positive) area of the shape.
    pub fn area(&self) -> f64 {
        self.area_m2
    }

    /// Returns true if the point lies inside or on the boundary of the shape.
    pub fn contains(&self, point_m: &Vector2<f64>) -> bool {
        let n = self.vertices_m.len();

        (0..n).all(|i| {
            let a = self.vertices_m[i];
            let b = self.vertices_m[(i + 1) % n];
            cross(&(b - a), &(point_m - a)) >= -GEOM_EPSILON
        })
    }

    /// Returns this shape with every vertex mapped from the pose's frame into its parent frame.
    pub fn transformed(&self, pose: &Pose) -> Self {
        Self {
            vertices_m: self
                .vertices_m
                .iter()
                .map(|v| pose.transform_point(v))
                .collect(),
            area_m2: self.area_m2,
        }
    }
}

impl ShapeParams {
    /// Build the shape described by these parameters.
    pub fn build(&self) -> Result<Shape, ShapeError> {
        match self {
            ShapeParams::Circle {
                radius_m,
                num_vertices,
            } => Shape::circle(*radius_m, *num_vertices),
            ShapeParams::Polygon { vertices_m } => Shape::new(vertices_m.clone()),
        }
    }
}

impl Default for ShapeParams {
    fn default() -> Self {
        ShapeParams::Circle {
            radius_m: 0.3,
            num_vertices: DEFAULT_CIRCLE_VERTICES,
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Signed area of the closed polygon through the given points (shoelace formula).
///
/// Positive for anticlockwise ordering, negative for clockwise.
pub fn signed_area(points_m: &[Vector2<f64>]) -> f64 {
    if points_m.len() < 3 {
        return 0.0;
    }

    let n = points_m.len();
    let twice_area: f64 = (0..n)
        .map(|i| cross(&points_m[i], &points_m[(i + 1) % n]))
        .sum();

    0.5 * twice_area
}

fn cross(a: &Vector2<f64>, b: &Vector2<f64>) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Every corner must turn left, and the corners together must make exactly one full turn (which
/// rules out star shaped polygons).
fn is_convex_ccw(vertices_m: &[Vector2<f64>]) -> bool {
    let n = vertices_m.len();
    let mut total_turn_rad = 0.0;

    for i in 0..n {
        let e0 = vertices_m[(i + 1) % n] - vertices_m[i];
        let e1 = vertices_m[(i + 2) % n] - vertices_m[(i + 1) % n];

        let turn = cross(&e0, &e1);
        if turn < -GEOM_EPSILON {
            return false;
        }

        total_turn_rad += turn.atan2(e0.dot(&e1));
    }

    (total_turn_rad - std::f64::consts::TAU).abs() < 1e-6
}

fn default_circle_vertices() -> usize {
    DEFAULT_CIRCLE_VERTICES
}

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn unit_square() -> Vec<Vector2<f64>> {
        vec![
            Vector2::new(0.0, 0.0),
            Vector2::new(1.0, 0.0),
            Vector2::new(1.0, 1.0),
            Vector2::new(0.0, 1.0),
        ]
    }

    #[test]
    fn test_area_and_orientation() {
        assert!((signed_area(&unit_square()) - 1.0).abs() < 1e-12);

        let mut cw = unit_square();
        cw.reverse();
        assert!((signed_area(&cw) + 1.0).abs() < 1e-12);

        // Clockwise input is normalised
        let shape = Shape::new(cw).unwrap();
        assert!((shape.area() - 1.0).abs() < 1e-12);
        assert!(signed_area(shape.vertices()) > 0.0);
    }

    #[test]
    fn test_invalid_shapes() {
        assert!(matches!(
            Shape::new(vec![Vector2::new(0.0, 0.0), Vector2::new(1.0, 0.0)]),
            Err(ShapeError::TooFewVertices(2))
        ));

        assert!(matches!(
            Shape::new(vec![
                Vector2::new(0.0, 0.0),
                Vector2::new(1.0, 0.0),
                Vector2::new(2.0, 0.0)
            ]),
            Err(ShapeError::ZeroArea)
        ));

        // Arrowhead
        assert!(matches!(
            Shape::new(vec![
                Vector2::new(0.0, 0.0),
                Vector2::new(2.0, 1.0),
                Vector2::new(0.0, 2.0),
                Vector2::new(0.5, 1.0)
            ]),
            Err(ShapeError::NotConvex)
        ));

        assert!(matches!(
            Shape::circle(-1.0, 16),
            Err(ShapeError::InvalidRadius(_))
        ));
    }

    #[test]
    fn test_contains() {
        let shape = Shape::new(unit_square()).unwrap();

        assert!(shape.contains(&Vector2::new(0.5, 0.5)));
        assert!(shape.contains(&Vector2::new(1.0, 0.5)));
        assert!(!shape.contains(&Vector2::new(1.5, 0.5)));
        assert!(!shape.contains(&Vector2::new(-0.01, 0.5)));
    }

    #[test]
    fn test_circle() {
        let circle = Shape::circle(0.3, 32).unwrap();

        assert_eq!(circle.vertices().len(), 32);

        // A sampled circle is slightly smaller than the real one
        let real_area = std::f64::consts::PI * 0.09;
        assert!(circle.area() < real_area);
        assert!(circle.area() > 0.95 * real_area);

        assert!(circle.contains(&Vector2::new(0.0, 0.0)));
        assert!(circle.contains(&Vector2::new(0.25, 0.0)));
        assert!(!circle.contains(&Vector2::new(0.31, 0.0)));
    }

    #[test]
    fn test_transformed() {
        let shape = Shape::new(unit_square()).unwrap();
        let moved = shape.transformed(&Pose::new(2.0, 0.0, FRAC_PI_2));

        assert!(moved.contains(&Vector2::new(1.5, 0.5)));
        assert!(!moved.contains(&Vector2::new(0.5, 0.5)));
        assert!((moved.area() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_params() {
        let params: ShapeParams =
            util::params::from_str("type = \"Circle\"\nradius_m = 0.5").unwrap();
        let shape = params.build().unwrap();
        assert_eq!(shape.vertices().len(), DEFAULT_CIRCLE_VERTICES);

        let params: ShapeParams =
            util::params::from_str("type = \"Polygon\"\nvertices_m = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]")
                .unwrap();
        assert!((params.build().unwrap().area() - 0.5).abs() < 1e-12);
    }
}
