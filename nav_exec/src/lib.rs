//! # Navigation library.
//!
//! Route following navigation for a differential drive robot. Each cycle the robot's pose runs
//! through a three stage pipeline:
//!
//! 1. [`route_tracker`] finds the locally relevant window of the stored route,
//! 2. [`potential_field`] deforms that window around sensed obstacles,
//! 3. [`follower`] turns the deformed path into a velocity command.
//!
//! [`nav_mgr`] ties the stages together and handles operator commands.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Path follower - virtual light sensor steering and pivot turns
pub mod follower;

/// Geometry - poses and convex shapes
pub mod geom;

/// Local path - the result of route tracking passed between pipeline stages
pub mod local_path;

/// Navigation manager - runs the pipeline and holds the business mode
pub mod nav_mgr;

/// Potential field planner - deforms local paths around obstacles
pub mod potential_field;

/// Route - the fixed list of poses to follow
pub mod route;

/// Route tracker - tracks progress along the route
pub mod route_tracker;

/// Simulation - kinematic chassis and map obstacles
#[cfg(feature = "sim")]
pub mod sim;
