//! # Communications interface crate.
//!
//! Provides the interfaces shared between the navigation stack and its collaborators.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Operator telecommands accepted by the navigation manager
pub mod tc;

/// Command definitions for equipment (like the chassis)
pub mod eqpt;

/// Telemetry published by the navigation manager
pub mod tm;
