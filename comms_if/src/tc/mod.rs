//! # Telecommand module
//!
//! Telecommands are instructions sent to the navigation manager by an operator (ground station,
//! console or business layer). They are applied between planning cycles.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod nav;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use nav::{NavCmd, TcParseError};
