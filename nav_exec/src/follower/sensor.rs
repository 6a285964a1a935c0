//! # Virtual light sensor
//!
//! The virtual light sensor imitates a line following light sensor. A footprint (the area lit by
//! the sensor) is mounted on the robot. The part of the path inside the footprint splits it in
//! two, and the share of the footprint on the right hand side of the path gives the sensor's
//! reading:
//!
//! - `0` when the path splits the footprint in half,
//! - positive when the path is to the right of the footprint's centre,
//! - negative when the path is to the left.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector2;
use ordered_float::OrderedFloat;

// Internal
use crate::geom::{signed_area, Pose, Shape};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct VirtualLightSensor {
    /// Pose of the sensor on the robot
    sensor_pose: Pose,

    /// Transform from the robot frame into the sensor frame
    to_sensor: Pose,

    /// Lit area in the sensor frame
    light_range: Shape,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl VirtualLightSensor {
    pub fn new(sensor_pose: Pose, light_range: Shape) -> Self {
        Self {
            sensor_pose,
            to_sensor: sensor_pose.inverse(),
            light_range,
        }
    }

    pub fn sensor_pose(&self) -> &Pose {
        &self.sensor_pose
    }

    pub fn light_range(&self) -> &Shape {
        &self.light_range
    }

    /// Returns true if the robot frame point is lit by the sensor.
    pub fn is_lit(&self, point_m: &Vector2<f64>) -> bool {
        self.light_range
            .contains(&self.to_sensor.transform_point(point_m))
    }

    /// Select the part of a robot frame path which is lit by the sensor.
    ///
    /// Leading poses outside the footprint are skipped and the following run of poses inside it
    /// is returned. If the path isn't lit at all its first pose is returned on its own, so that
    /// the follower still knows which way to go.
    pub fn shine<I>(&self, path: I) -> Vec<Pose>
    where
        I: IntoIterator<Item = Pose>,
    {
        let mut path = path.into_iter();

        let first = match path.next() {
            Some(p) => p,
            None => return Vec::new(),
        };

        let bright: Vec<Pose> = std::iter::once(first)
            .chain(path)
            .skip_while(|p| !self.is_lit(&p.position_m))
            .take_while(|p| self.is_lit(&p.position_m))
            .collect();

        if bright.is_empty() {
            vec![first]
        }
        else {
            bright
        }
    }

    /// Compute the light value for a lit (robot frame) path, in [-1, 1].
    ///
    /// The covered area is bounded by the path and by the footprint's boundary, walked clockwise
    /// from where the path leaves the footprint back to where it entered.
    pub fn invoke(&self, bright: &[Pose]) -> f64 {
        let local: Vec<Pose> = bright.iter().map(|p| &self.to_sensor * p).collect();

        let (first, last) = match (local.first(), local.last()) {
            (Some(f), Some(l)) => (f, l),
            _ => return 0.0,
        };

        let exit_pose = local
            .iter()
            .rev()
            .find(|p| self.light_range.contains(&p.position_m))
            .unwrap_or(last);

        let vertices = self.light_range.vertices();
        let n = vertices.len();

        let exit_index = self.exit_vertex(exit_pose);
        let entry_index = self.entry_vertex(first);

        let arc_len = (exit_index + n - entry_index) % n + 1;

        let covered: Vec<Vector2<f64>> = local
            .iter()
            .map(|p| p.position_m)
            .chain((0..arc_len).map(|k| vertices[(exit_index + n - k) % n]))
            .collect();

        let covered_area = signed_area(&covered).abs();

        2.0 * (0.5 - covered_area / self.light_range.area())
    }

    /// The boundary vertex best aligned with the pose's direction of travel.
    fn exit_vertex(&self, pose: &Pose) -> usize {
        let dir = pose.heading_vector();

        self.light_range
            .vertices()
            .iter()
            .enumerate()
            .max_by_key(|(_, v)| OrderedFloat(alignment(v, pose, &dir).unwrap_or(1.0)))
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    /// The boundary vertex most directly behind the pose.
    fn entry_vertex(&self, pose: &Pose) -> usize {
        let dir = pose.heading_vector();

        self.light_range
            .vertices()
            .iter()
            .enumerate()
            .min_by_key(|(_, v)| OrderedFloat(alignment(v, pose, &dir).unwrap_or(-1.0)))
            .map(|(i, _)| i)
            .unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Cosine of the angle between `dir` and the direction from the pose to the vertex, `None` if
/// the vertex is at the pose.
fn alignment(vertex: &Vector2<f64>, pose: &Pose, dir: &Vector2<f64>) -> Option<f64> {
    (vertex - pose.position_m)
        .try_normalize(f64::EPSILON)
        .map(|v| v.dot(dir))
}
