//! Navigation manager parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// Internal
use crate::{follower, potential_field, route_tracker};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters of the whole navigation pipeline, one table per stage.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Params {
    pub route_tracker: route_tracker::Params,

    pub potential_field: potential_field::Params,

    pub follower: follower::Params,
}
