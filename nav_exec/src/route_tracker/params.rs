//! Route tracker parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the route tracker
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Params {
    /// Heading changes between consecutive route poses larger than this angle split the route
    /// into segments.
    pub min_tip_angle_rad: f64,

    /// Number of poses ahead of the current index searched during normal tracking.
    pub search_count: usize,

    /// Radius of the default "local first" predicate. Route poses further than this from the
    /// robot are never chosen as the start of the local path.
    pub local_first_radius_m: f64,

    /// If set, the default predicate also requires the bearing to the pose and the pose's
    /// relative heading to be within this angle, which stops poses behind the robot being
    /// chosen.
    pub local_first_cone_rad: Option<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            min_tip_angle_rad: std::f64::consts::FRAC_PI_2,
            search_count: 5,
            local_first_radius_m: 2.0,
            local_first_cone_rad: None,
        }
    }
}
