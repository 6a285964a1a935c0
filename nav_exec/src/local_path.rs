//! # Local path
//!
//! The result of route tracking, handed from stage to stage of the planning pipeline.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Standard
use std::fmt;

// Internal
use crate::geom::Pose;
use comms_if::tm::LocalPathKind;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A one-shot, lazily evaluated sequence of poses in the robot frame.
pub type PoseIter = Box<dyn Iterator<Item = Pose> + Send>;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Local planning outcome for a single cycle.
pub enum LocalPath {
    /// A sequence of poses to follow, expressed in the robot frame.
    Path(PoseIter),

    /// The robot is close to the end of the route and should align with this pose (robot frame).
    KeyPose(Pose),

    /// The route has been completed.
    Finish,

    /// The robot could not be located on the route.
    Failure,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LocalPath {
    /// Build a path variant from an owned list of poses.
    pub fn from_poses(poses: Vec<Pose>) -> Self {
        LocalPath::Path(Box::new(poses.into_iter()))
    }

    pub fn kind(&self) -> LocalPathKind {
        match self {
            LocalPath::Path(_) => LocalPathKind::Path,
            LocalPath::KeyPose(_) => LocalPathKind::KeyPose,
            LocalPath::Finish => LocalPathKind::Finish,
            LocalPath::Failure => LocalPathKind::Failure,
        }
    }
}

impl fmt::Debug for LocalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocalPath::Path(_) => write!(f, "Path(..)"),
            LocalPath::KeyPose(p) => write!(f, "KeyPose({:?})", p),
            LocalPath::Finish => write!(f, "Finish"),
            LocalPath::Failure => write!(f, "Failure"),
        }
    }
}
