//! # Telemetry module
//!
//! Telemetry is the status information published by the navigation manager once per cycle.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod nav;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use nav::{FollowerState, LocalPathKind, NavMode, NavTm};
