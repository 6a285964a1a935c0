//! # Route
//!
//! A route is the fixed, ordered list of map frame poses that the robot has to follow. Routes are
//! loaded from CSV files containing one `x,y,heading_rad` pose per line.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod loader;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Standard
use std::ops::Index;

// External
use serde::Serialize;

// Internal
use crate::geom::Pose;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An immutable, non-empty sequence of map frame poses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    poses: Vec<Pose>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("A route must contain at least one pose")]
    Empty,

    #[error("Could not open the route file: {0}")]
    FileError(std::io::Error),

    #[error("Malformed route record on line {line}: {source}")]
    Parse {
        line: u64,
        source: csv::Error,
    },

    #[error("Route record on line {line} contains a non-finite value")]
    NonFinite { line: u64 },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Route {
    pub fn new(poses: Vec<Pose>) -> Result<Self, RouteError> {
        if poses.is_empty() {
            return Err(RouteError::Empty);
        }

        Ok(Self { poses })
    }

    pub fn len(&self) -> usize {
        self.poses.len()
    }

    /// Always false, routes cannot be empty.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn last_index(&self) -> usize {
        self.poses.len() - 1
    }

    pub fn last(&self) -> &Pose {
        &self.poses[self.last_index()]
    }

    pub fn poses(&self) -> &[Pose] {
        &self.poses
    }

    pub fn get(&self, index: usize) -> Option<&Pose> {
        self.poses.get(index)
    }
}

impl Index<usize> for Route {
    type Output = Pose;

    fn index(&self, index: usize) -> &Pose {
        &self.poses[index]
    }
}
