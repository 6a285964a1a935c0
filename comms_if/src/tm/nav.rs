//! # Navigation telemetry

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::eqpt::chassis::Command;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Status of the navigation manager after one planning cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NavTm {
    /// Business mode the manager was in at the end of the cycle
    pub mode: NavMode,

    /// Progress along the route in (0, 1]
    pub progress: f64,

    /// Index of the current route pose
    pub route_index: usize,

    /// Outcome of the route tracker, `None` if no planning took place this cycle
    pub local_path: Option<LocalPathKind>,

    /// Follower sub-state
    pub follower_state: FollowerState,

    /// True if the cycle was abandoned waiting on the obstacle source
    pub obstacles_unavailable: bool,

    /// The command sent to the chassis, if any
    pub cmd: Option<Command>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Business mode of the navigation manager.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum NavMode {
    /// No route following, no commands produced
    Idle,

    /// Following the loaded route
    Follow { loop_route: bool },
}

/// The kind of local path produced by the route tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocalPathKind {
    Path,
    KeyPose,
    Finish,
    Failure,
}

/// Sub-state of the path follower.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FollowerState {
    /// Not currently producing commands
    Idle,

    /// Pivoting on the spot
    Turning,

    /// Driving along the path
    Driving,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for NavMode {
    fn default() -> Self {
        NavMode::Idle
    }
}

impl Default for FollowerState {
    fn default() -> Self {
        FollowerState::Idle
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_tm_json() {
        let tm = NavTm {
            mode: NavMode::Follow { loop_route: true },
            progress: 0.5,
            route_index: 12,
            local_path: Some(LocalPathKind::Path),
            follower_state: FollowerState::Driving,
            obstacles_unavailable: false,
            cmd: Some(Command::new(0.2, -0.1)),
        };

        let json = serde_json::to_string(&tm).unwrap();
        assert!(json.contains("\"Follow\""));

        let parsed: NavTm = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, tm);
    }
}
