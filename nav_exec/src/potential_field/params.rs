//! Potential field planner parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the potential field planner
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Params {
    /// Overall weight of the obstacle repulsion relative to the route attraction
    pub repel_weight: f64,

    /// Distance between consecutive poses of the deformed path
    pub step_length_m: f64,

    /// Number of route poses contributing to the attraction, also the length of the loop guard
    pub look_ahead: usize,

    /// The repulsion is averaged over at least this many obstacle points, so that a handful of
    /// points doesn't produce a huge repulsion.
    pub min_repel_points_count: usize,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            repel_weight: 0.025,
            step_length_m: 0.05,
            look_ahead: 8,
            min_repel_points_count: 16,
        }
    }
}
