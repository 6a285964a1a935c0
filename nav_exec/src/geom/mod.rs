//! # Geometry primitives
//!
//! Rigid 2D poses and convex shapes used by every stage of the navigation pipeline.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod pose;
mod shape;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use pose::Pose;
pub use shape::{signed_area, Shape, ShapeError, ShapeParams};
