//! # Navigation manager
//!
//! The navigation manager chains the route tracker, potential field planner and path follower
//! into a single pipeline, run once per new robot pose. It also owns the business mode, which
//! operators change with [`NavCmd`] telecommands between cycles.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, warn};

// Internal
pub use params::Params;
use crate::{
    follower::{FollowerError, PathFollower},
    geom::Pose,
    potential_field::{ObstacleSource, PotentialFieldError, PotentialFieldPlanner},
    route::Route,
    route_tracker::{RouteTracker, RouteTrackerError, TrackerHandle},
};
use comms_if::{
    eqpt::chassis::Command,
    tc::NavCmd,
    tm::{LocalPathKind, NavMode, NavTm},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

pub struct NavMgr {
    mode: NavMode,

    tracker: RouteTracker,

    deformer: PotentialFieldPlanner,

    follower: PathFollower,
}

/// Output of one navigation cycle.
#[derive(Debug, Clone, Copy)]
pub struct NavOutput {
    /// Command to send to the chassis, `None` to leave the chassis as it is
    pub cmd: Option<Command>,

    pub tm: NavTm,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum NavMgrError {
    #[error("Route tracker error: {0}")]
    RouteTrackerError(RouteTrackerError),

    #[error("Potential field planner error: {0}")]
    PotentialFieldError(PotentialFieldError),

    #[error("Path follower error: {0}")]
    FollowerError(FollowerError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl NavMgr {
    /// Build the whole pipeline from its parameters.
    pub fn new(
        route: Route,
        params: Params,
        obstacles: Box<dyn ObstacleSource>,
    ) -> Result<Self, NavMgrError> {
        let tracker = RouteTracker::new(route, params.route_tracker)?;
        let deformer = PotentialFieldPlanner::new(params.potential_field, obstacles)?;
        let follower = PathFollower::new(params.follower)?;

        Ok(Self::from_parts(tracker, deformer, follower))
    }

    /// Build the manager from already constructed stages, for example ones using custom
    /// predicates or repulsion fields.
    pub fn from_parts(
        tracker: RouteTracker,
        deformer: PotentialFieldPlanner,
        follower: PathFollower,
    ) -> Self {
        Self {
            mode: NavMode::Idle,
            tracker,
            deformer,
            follower,
        }
    }

    pub fn mode(&self) -> NavMode {
        self.mode
    }

    pub fn tracker(&self) -> &RouteTracker {
        &self.tracker
    }

    pub fn tracker_handle(&self) -> TrackerHandle {
        self.tracker.handle()
    }

    /// Apply an operator command.
    pub fn handle_cmd(&mut self, cmd: NavCmd) -> Result<(), NavMgrError> {
        match cmd {
            NavCmd::Follow { loop_route } => {
                self.tracker.set_loop(loop_route)?;
                self.set_mode(NavMode::Follow { loop_route });
            }
            NavCmd::Idle => self.set_mode(NavMode::Idle),
            NavCmd::SetProgress { progress } => self.tracker.set_progress(progress)?,
            NavCmd::SetLoop { on } => {
                self.tracker.set_loop(on)?;
                if let NavMode::Follow { .. } = self.mode {
                    self.mode = NavMode::Follow { loop_route: on };
                }
            }
        }

        Ok(())
    }

    /// Run one navigation cycle for the robot at the given map frame pose.
    pub fn step(&mut self, pose: &Pose) -> Result<NavOutput, NavMgrError> {
        if let NavMode::Idle = self.mode {
            return Ok(self.output(None, None, false));
        }

        let local_path = self.tracker.plan(pose)?;
        let kind = local_path.kind();

        let deformed = match self.deformer.plan(local_path) {
            Ok(p) => p,
            Err(PotentialFieldError::ObstacleError(e)) => {
                warn!("No obstacles available, holding: {}", e);
                return Ok(self.output(None, Some(kind), true));
            }
            Err(e) => return Err(e.into()),
        };

        let cmd = self.follower.plan(deformed);

        if kind == LocalPathKind::Finish {
            info!("Route complete");
            self.set_mode(NavMode::Idle);
        }

        Ok(self.output(cmd, Some(kind), false))
    }

    fn set_mode(&mut self, mode: NavMode) {
        if mode != self.mode {
            info!("NavMgr mode {:?} -> {:?}", self.mode, mode);
            self.mode = mode;
        }
    }

    fn output(
        &self,
        cmd: Option<Command>,
        local_path: Option<LocalPathKind>,
        obstacles_unavailable: bool,
    ) -> NavOutput {
        NavOutput {
            cmd,
            tm: NavTm {
                mode: self.mode,
                progress: self.tracker.progress(),
                route_index: self.tracker.index(),
                local_path,
                follower_state: self.follower.state(),
                obstacles_unavailable,
                cmd,
            },
        }
    }
}

impl From<RouteTrackerError> for NavMgrError {
    fn from(e: RouteTrackerError) -> Self {
        NavMgrError::RouteTrackerError(e)
    }
}

impl From<PotentialFieldError> for NavMgrError {
    fn from(e: PotentialFieldError) -> Self {
        NavMgrError::PotentialFieldError(e)
    }
}

impl From<FollowerError> for NavMgrError {
    fn from(e: FollowerError) -> Self {
        NavMgrError::FollowerError(e)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::potential_field::{ObstacleError, StaticObstacles};
    use comms_if::tm::FollowerState;
    use nalgebra::Vector2;

    fn straight_route() -> Route {
        Route::new((0..40).map(|i| Pose::new(i as f64 * 0.05, 0.0, 0.0)).collect()).unwrap()
    }

    fn nav_mgr() -> NavMgr {
        NavMgr::new(
            straight_route(),
            Params::default(),
            Box::new(StaticObstacles::empty()),
        )
        .unwrap()
    }

    struct Cancelled;

    impl ObstacleSource for Cancelled {
        fn snapshot(&mut self) -> Result<Vec<Vector2<f64>>, ObstacleError> {
            Err(ObstacleError::Cancelled)
        }
    }

    #[test]
    fn test_load_params() {
        let params: Params = util::params::load_from(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/../params/nav_mgr.toml"
        ))
        .unwrap();

        assert_eq!(params.route_tracker.search_count, 5);
        assert!(params.route_tracker.local_first_cone_rad.is_some());
        assert!((params.follower.sensor_pose.position_m.x - 0.275).abs() < 1e-12);

        NavMgr::new(straight_route(), params, Box::new(StaticObstacles::empty())).unwrap();
    }

    #[test]
    fn test_idle_produces_nothing() {
        let mut nav = nav_mgr();

        let out = nav.step(&Pose::identity()).unwrap();
        assert_eq!(out.cmd, None);
        assert_eq!(out.tm.mode, NavMode::Idle);
        assert_eq!(out.tm.local_path, None);
    }

    #[test]
    fn test_follow() {
        let mut nav = nav_mgr();
        nav.handle_cmd(NavCmd::Follow { loop_route: false }).unwrap();

        let out = nav.step(&Pose::identity()).unwrap();
        let cmd = out.cmd.unwrap();

        assert!(cmd.linear_speed_ms > 0.0);
        assert_eq!(out.tm.local_path, Some(LocalPathKind::Path));
        assert_eq!(out.tm.follower_state, FollowerState::Driving);
        assert_eq!(out.tm.mode, NavMode::Follow { loop_route: false });
    }

    #[test]
    fn test_finish_returns_to_idle() {
        let mut nav = nav_mgr();
        nav.handle_cmd(NavCmd::Follow { loop_route: false }).unwrap();
        nav.handle_cmd(NavCmd::SetProgress { progress: 1.0 }).unwrap();

        // Far from the end of the route
        let out = nav.step(&Pose::new(-5.0, 0.0, 0.0)).unwrap();

        assert_eq!(out.tm.local_path, Some(LocalPathKind::Finish));
        assert_eq!(out.cmd, Some(Command::stop()));
        assert_eq!(nav.mode(), NavMode::Idle);
    }

    #[test]
    fn test_set_loop() {
        let mut nav = nav_mgr();
        nav.handle_cmd(NavCmd::Follow { loop_route: false }).unwrap();
        nav.handle_cmd(NavCmd::SetLoop { on: true }).unwrap();

        assert_eq!(nav.mode(), NavMode::Follow { loop_route: true });
        assert!(nav.tracker_handle().snapshot().unwrap().loop_route);
        assert!(nav.tracker().loop_route());

        assert!(nav.handle_cmd(NavCmd::SetProgress { progress: 2.0 }).is_err());
    }

    #[test]
    fn test_obstacles_unavailable_holds() {
        let params = Params::default();
        let tracker = RouteTracker::new(straight_route(), params.route_tracker).unwrap();
        let deformer =
            PotentialFieldPlanner::new(params.potential_field, Box::new(Cancelled)).unwrap();
        let follower = PathFollower::new(params.follower).unwrap();

        let mut nav = NavMgr::from_parts(tracker, deformer, follower);
        nav.handle_cmd(NavCmd::Follow { loop_route: false }).unwrap();

        let out = nav.step(&Pose::identity()).unwrap();
        assert_eq!(out.cmd, None);
        assert!(out.tm.obstacles_unavailable);
        assert_eq!(out.tm.follower_state, FollowerState::Idle);
        assert_eq!(nav.mode(), NavMode::Follow { loop_route: false });
    }
}
