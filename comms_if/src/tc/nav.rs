//! # Navigation Telecommands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use structopt::StructOpt;
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A command that can be performed by the navigation manager.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, StructOpt)]
pub enum NavCmd {
    /// Start following the loaded route.
    #[structopt(name = "follow")]
    Follow {
        /// Restart from the beginning of the route once the end is reached.
        #[structopt(long = "loop")]
        loop_route: bool,
    },

    /// Stop following and hold position.
    #[structopt(name = "idle")]
    Idle,

    /// Set the progress along the route, forcing a full route search on the next cycle.
    #[structopt(name = "progress")]
    SetProgress {
        /// Fraction of the route in [0, 1].
        progress: f64,
    },

    /// Enable or disable looping of the route.
    #[structopt(name = "loop")]
    SetLoop {
        /// `true` to loop the route.
        #[structopt(parse(try_from_str))]
        on: bool,
    },
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum TcParseError {
    #[error("TC contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl NavCmd {
    /// Parse a new command from a JSON packet.
    pub fn from_json(json_str: &str) -> Result<Self, TcParseError> {
        serde_json::from_str(json_str).map_err(TcParseError::InvalidJson)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_from_json() {
        assert_eq!(
            NavCmd::from_json(r#"{"Follow": {"loop_route": true}}"#).unwrap(),
            NavCmd::Follow { loop_route: true }
        );
        assert_eq!(NavCmd::from_json(r#""Idle""#).unwrap(), NavCmd::Idle);
        assert_eq!(
            NavCmd::from_json(r#"{"SetProgress": {"progress": 0.25}}"#).unwrap(),
            NavCmd::SetProgress { progress: 0.25 }
        );
        assert!(NavCmd::from_json("{nonsense").is_err());
    }

    #[test]
    fn test_from_args() {
        let cmd = NavCmd::from_iter_safe(vec!["nav", "follow", "--loop"]).unwrap();
        assert_eq!(cmd, NavCmd::Follow { loop_route: true });

        let cmd = NavCmd::from_iter_safe(vec!["nav", "progress", "0.5"]).unwrap();
        assert_eq!(cmd, NavCmd::SetProgress { progress: 0.5 });

        let cmd = NavCmd::from_iter_safe(vec!["nav", "loop", "false"]).unwrap();
        assert_eq!(cmd, NavCmd::SetLoop { on: false });
    }
}
