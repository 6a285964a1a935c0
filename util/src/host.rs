//! Host platform utility functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::env::{self, VarError};
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Environment variable pointing at the root of the software checkout, which contains the
/// `params` and `sessions` directories.
pub const SW_ROOT_ENV_VAR: &str = "NAV_SW_ROOT";

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the software root directory from the environment.
pub fn get_nav_sw_root() -> Result<PathBuf, VarError> {
    env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}
