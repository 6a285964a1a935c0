//! # Route tracker
//!
//! The route tracker (or global planner) follows the robot's progress along a fixed route. Each
//! cycle it takes the robot's map frame pose and returns the locally relevant part of the route,
//! expressed in the robot frame, as a [`LocalPath`].
//!
//! The route is split into segments at "tips", poses where the route's heading changes sharply.
//! The returned path never extends beyond the end of the current segment, so the follower deals
//! with one corner at a time.
//!
//! Finding the robot on the route is done by searching forward from the current index for the
//! first pose accepted by the "local first" predicate. After a progress reset (or at start up)
//! the whole route is searched. Once locked on, only `search_count` poses ahead are searched and
//! the search never crosses a tip unless the tip itself has been passed.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Standard
use std::sync::{Arc, PoisonError, RwLock};

// External
use conquer_once::OnceCell;
use log::{debug, info, warn};

// Internal
pub use params::Params;
use crate::{geom::Pose, local_path::LocalPath, route::Route};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Predicate deciding whether a robot frame route pose is a valid start for the local path.
pub type LocalFirst = Box<dyn Fn(&Pose) -> bool + Send + Sync>;

pub struct RouteTracker {
    params: Params,

    route: Arc<Route>,

    local_first: LocalFirst,

    /// Index of the last pose of every segment, lazily computed
    tips: OnceCell<Vec<usize>>,

    /// Working copy of the tracking state, only mutated through `&mut self`
    state: TrackerState,

    /// Published copy of the state for telemetry readers
    shared: Arc<RwLock<TrackerState>>,
}

/// Mutable part of the tracker.
#[derive(Debug, Clone, Copy, PartialEq)]
struct TrackerState {
    index: usize,
    search_all: bool,
    loop_route: bool,
}

/// Read only view of a tracker's state which can be shared with other threads.
#[derive(Clone)]
pub struct TrackerHandle {
    shared: Arc<RwLock<TrackerState>>,
    route_len: usize,
}

/// A copy of the tracker's state at some instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerSnapshot {
    pub index: usize,
    pub search_all: bool,
    pub loop_route: bool,
    pub progress: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum RouteTrackerError {
    #[error("Minimum tip angle must be in (0, pi], got {0}")]
    InvalidMinTipAngle(f64),

    #[error("Search count must be greater than zero")]
    InvalidSearchCount,

    #[error("Local first radius must be positive, got {0}")]
    InvalidLocalFirstRadius(f64),

    #[error("Local first cone must be in (0, pi], got {0}")]
    InvalidLocalFirstCone(f64),

    #[error("The local first predicate must accept the robot's own pose")]
    LocalFirstRejectsIdentity,

    #[error("Progress must be in [0, 1], got {0}")]
    InvalidProgress(f64),

    #[error("The shared tracker state lock is poisoned")]
    LockPoisoned,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RouteTracker {
    /// Create a new tracker using the default local first predicate, which accepts poses closer
    /// than `local_first_radius_m` which face forwards relative to the robot, or which lie in
    /// the `local_first_cone_rad` cone if it is set.
    pub fn new(route: Route, params: Params) -> Result<Self, RouteTrackerError> {
        if !(params.local_first_radius_m > 0.0) {
            return Err(RouteTrackerError::InvalidLocalFirstRadius(
                params.local_first_radius_m,
            ));
        }

        let local_first = match params.local_first_cone_rad {
            Some(cone) if cone > 0.0 && cone <= std::f64::consts::PI => {
                cone_local_first(params.local_first_radius_m, cone)
            }
            Some(cone) => return Err(RouteTrackerError::InvalidLocalFirstCone(cone)),
            None => default_local_first(params.local_first_radius_m),
        };

        Self::with_local_first(route, params, local_first)
    }

    /// Create a new tracker with a custom local first predicate.
    pub fn with_local_first(
        route: Route,
        params: Params,
        local_first: LocalFirst,
    ) -> Result<Self, RouteTrackerError> {
        if !(params.min_tip_angle_rad > 0.0 && params.min_tip_angle_rad <= std::f64::consts::PI)
        {
            return Err(RouteTrackerError::InvalidMinTipAngle(params.min_tip_angle_rad));
        }

        if params.search_count == 0 {
            return Err(RouteTrackerError::InvalidSearchCount);
        }

        if !local_first(&Pose::identity()) {
            return Err(RouteTrackerError::LocalFirstRejectsIdentity);
        }

        let state = TrackerState {
            index: 0,
            search_all: true,
            loop_route: false,
        };

        Ok(Self {
            params,
            route: Arc::new(route),
            local_first,
            tips: OnceCell::uninit(),
            state,
            shared: Arc::new(RwLock::new(state)),
        })
    }

    /// Find the local path for the robot at the given map frame pose.
    pub fn plan(&mut self, pose: &Pose) -> Result<LocalPath, RouteTrackerError> {
        let to_robot = pose.inverse();
        let on_robot = |p: &Pose| &to_robot * p;

        let mut state = self.state;
        let last_index = self.route.last_index();

        // End of the route
        if state.index == last_index {
            if state.loop_route {
                info!("End of route reached, looping back to the start");
                state.index = 0;
            }
            else {
                let last = on_robot(self.route.last());

                return Ok(if (self.local_first)(&last) {
                    LocalPath::KeyPose(last)
                }
                else {
                    LocalPath::Finish
                });
            }
        }

        let tips = self.tips();
        let current = state.index;

        // Tip group containing the current index. The last index is always a tip, so this can
        // only fall back when looping a single pose route.
        let tip_group = tips.iter().position(|&t| t >= current).unwrap_or(tips.len() - 1);

        // Step into the next segment if we're on a tip that has already been passed
        let next_area = if current == tips[tip_group]
            && tip_group + 1 < tips.len()
            && !(self.local_first)(&on_robot(&self.route[current]))
        {
            1
        }
        else {
            0
        };

        let start = current + next_area;
        let end = if state.search_all {
            last_index
        }
        else {
            tips[tip_group + next_area].min(current + self.params.search_count)
        };

        let found = (start..=end).find(|&i| (self.local_first)(&on_robot(&self.route[i])));

        let local_path = match found {
            Some(begin) => {
                let segment_end = tips
                    .iter()
                    .copied()
                    .find(|&t| t >= begin)
                    .unwrap_or(last_index);

                if begin != current {
                    debug!("Route index advanced {} -> {}", current, begin);
                }

                if state.search_all {
                    info!("Located robot on route at index {}", begin);
                }

                state.index = begin;
                state.search_all = false;

                self.route_path(begin, segment_end, to_robot)
            }
            None if state.search_all => {
                warn!("Could not locate robot on the route");
                LocalPath::Failure
            }
            None => {
                debug!(
                    "No local start found in [{}, {}], following the search window",
                    start, end
                );
                self.route_path(start, end, to_robot)
            }
        };

        self.commit(state)?;

        Ok(local_path)
    }

    /// Progress along the route in (0, 1].
    pub fn progress(&self) -> f64 {
        progress_of(self.state.index, self.route.len())
    }

    /// Set the progress along the route.
    ///
    /// The index becomes `floor(progress * len)`, clamped to the last index, and the next cycle
    /// will search the whole route.
    pub fn set_progress(&mut self, progress: f64) -> Result<(), RouteTrackerError> {
        if !(0.0..=1.0).contains(&progress) {
            return Err(RouteTrackerError::InvalidProgress(progress));
        }

        let index = ((progress * self.route.len() as f64).floor() as usize)
            .min(self.route.last_index());

        info!("Route progress set to {:.3} (index {})", progress, index);

        let mut state = self.state;
        state.index = index;
        state.search_all = true;

        self.commit(state)
    }

    pub fn loop_route(&self) -> bool {
        self.state.loop_route
    }

    pub fn set_loop(&mut self, loop_route: bool) -> Result<(), RouteTrackerError> {
        let mut state = self.state;
        state.loop_route = loop_route;
        self.commit(state)
    }

    /// Index of the current route pose.
    pub fn index(&self) -> usize {
        self.state.index
    }

    /// The route pose at the current index, in the map frame.
    pub fn current_target(&self) -> &Pose {
        &self.route[self.state.index]
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    /// Index of the last pose of each route segment, the last entry is always the route's last
    /// index.
    pub fn tips(&self) -> &[usize] {
        let route = &self.route;
        let cos_min_tip = self.params.min_tip_angle_rad.cos();

        self.tips.get_or_init(|| find_tips(route, cos_min_tip))
    }

    /// Get a handle which can be used to read the tracker state from another thread.
    pub fn handle(&self) -> TrackerHandle {
        TrackerHandle {
            shared: self.shared.clone(),
            route_len: self.route.len(),
        }
    }

    /// Build a lazy robot frame path over the inclusive range of route indices.
    fn route_path(&self, first: usize, last: usize, to_robot: Pose) -> LocalPath {
        let route = self.route.clone();

        LocalPath::Path(Box::new(
            (first..=last).map(move |i| &to_robot * &route[i]),
        ))
    }

    /// Replace the working state and publish it to readers.
    fn commit(&mut self, state: TrackerState) -> Result<(), RouteTrackerError> {
        if state != self.state {
            *self.shared.write()? = state;
            self.state = state;
        }

        Ok(())
    }
}

impl TrackerHandle {
    pub fn snapshot(&self) -> Result<TrackerSnapshot, RouteTrackerError> {
        let state = *self.shared.read()?;

        Ok(TrackerSnapshot {
            index: state.index,
            search_all: state.search_all,
            loop_route: state.loop_route,
            progress: progress_of(state.index, self.route_len),
        })
    }
}

impl<G> From<PoisonError<G>> for RouteTrackerError {
    fn from(_: PoisonError<G>) -> Self {
        RouteTrackerError::LockPoisoned
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// The default local first predicate: close to the robot and pointing forwards.
pub fn default_local_first(radius_m: f64) -> LocalFirst {
    Box::new(move |p: &Pose| p.position_m.norm() < radius_m && p.heading_vector().x > 0.0)
}

/// Close to the robot, roughly in front of it and pointing roughly the same way.
pub fn cone_local_first(radius_m: f64, cone_rad: f64) -> LocalFirst {
    Box::new(move |p: &Pose| {
        let bearing_rad = p.position_m.y.atan2(p.position_m.x);

        p.position_m.norm() < radius_m
            && bearing_rad.abs() < cone_rad
            && p.heading_rad.abs() < cone_rad
    })
}

fn find_tips(route: &Route, cos_min_tip: f64) -> Vec<usize> {
    let poses = route.poses();

    let mut tips: Vec<usize> = poses
        .windows(2)
        .enumerate()
        .filter(|(_, w)| w[0].heading_vector().dot(&w[1].heading_vector()) < cos_min_tip)
        .map(|(i, _)| i)
        .collect();

    tips.push(route.last_index());

    tips
}

fn progress_of(index: usize, len: usize) -> f64 {
    (index + 1) as f64 / len as f64
}

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

    fn corner_route() -> Route {
        Route::new(vec![
            Pose::new(0.0, 0.0, 0.0),
            Pose::new(5.0, 0.0, 0.0),
            Pose::new(5.0, 5.0, FRAC_PI_2),
        ])
        .unwrap()
    }

    fn corner_tracker() -> RouteTracker {
        RouteTracker::new(
            corner_route(),
            Params {
                min_tip_angle_rad: FRAC_PI_4,
                search_count: 1,
                local_first_radius_m: 2.0,
                local_first_cone_rad: None,
            },
        )
        .unwrap()
    }

    /// Straight route along X with the given spacing
    fn straight_route(count: usize, spacing_m: f64) -> Route {
        Route::new(
            (0..count)
                .map(|i| Pose::new(i as f64 * spacing_m, 0.0, 0.0))
                .collect(),
        )
        .unwrap()
    }

    fn collect(path: LocalPath) -> Vec<Pose> {
        match path {
            LocalPath::Path(iter) => iter.collect(),
            p => panic!("Expected a path, got {:?}", p),
        }
    }

    #[test]
    fn test_tips() {
        let tracker = corner_tracker();
        assert_eq!(tracker.tips(), &[1, 2]);

        let tracker = RouteTracker::new(straight_route(10, 0.5), Params::default()).unwrap();
        assert_eq!(tracker.tips(), &[9]);
    }

    #[test]
    fn test_invalid_params() {
        let params = Params {
            search_count: 0,
            ..Params::default()
        };
        assert!(matches!(
            RouteTracker::new(corner_route(), params),
            Err(RouteTrackerError::InvalidSearchCount)
        ));

        let params = Params {
            min_tip_angle_rad: 0.0,
            ..Params::default()
        };
        assert!(matches!(
            RouteTracker::new(corner_route(), params),
            Err(RouteTrackerError::InvalidMinTipAngle(_))
        ));

        assert!(matches!(
            RouteTracker::with_local_first(
                corner_route(),
                Params::default(),
                Box::new(|p: &Pose| p.position_m.x > 1.0)
            ),
            Err(RouteTrackerError::LocalFirstRejectsIdentity)
        ));
    }

    #[test]
    fn test_corner_route() {
        let mut tracker = corner_tracker();

        // Sitting on the first pose, the path runs to the end of the first segment
        let path = collect(tracker.plan(&Pose::new(0.0, 0.0, 0.0)).unwrap());
        assert_eq!(path.len(), 2);
        assert_eq!(tracker.index(), 0);
        assert!(path[0].position_m.norm() < 1e-9);
        assert!((path[1].position_m.x - 5.0).abs() < 1e-9);

        // Near the corner the tracker advances onto the tip
        let path = collect(tracker.plan(&Pose::new(4.0, 0.0, 0.0)).unwrap());
        assert_eq!(tracker.index(), 1);
        assert_eq!(path.len(), 1);

        // Turned past the corner but the next pose is still too far, so the search window
        // (limited to one pose by search_count) is followed without moving on
        let turned = FRAC_PI_2 + 0.1;
        let path = collect(tracker.plan(&Pose::new(5.0, 0.5, turned)).unwrap());
        assert_eq!(tracker.index(), 1);
        assert_eq!(path.len(), 1);
        assert!((path[0].position_m.norm() - 4.5).abs() < 1e-9);

        // Close to the last pose
        collect(tracker.plan(&Pose::new(5.0, 4.0, turned)).unwrap());
        assert_eq!(tracker.index(), 2);
        assert!((tracker.progress() - 1.0).abs() < 1e-12);

        match tracker.plan(&Pose::new(5.0, 4.0, turned)).unwrap() {
            LocalPath::KeyPose(p) => assert!((p.position_m.norm() - 1.0).abs() < 1e-9),
            p => panic!("Expected key pose, got {:?}", p),
        }

        assert!(matches!(
            tracker.plan(&Pose::new(0.0, 0.0, 0.0)).unwrap(),
            LocalPath::Finish
        ));
    }

    #[test]
    fn test_search_count_limits_window() {
        let params = Params {
            search_count: 1,
            ..Params::default()
        };
        let mut tracker = RouteTracker::new(straight_route(10, 0.5), params).unwrap();

        collect(tracker.plan(&Pose::new(0.0, 0.0, 0.0)).unwrap());
        assert_eq!(tracker.index(), 0);

        // Jumped ahead, only indices 0 and 1 are searched and neither is close enough
        let path = collect(tracker.plan(&Pose::new(3.0, 0.0, 0.0)).unwrap());
        assert_eq!(path.len(), 2);
        assert_eq!(tracker.index(), 0);

        // A wider window finds the robot
        let mut tracker = RouteTracker::new(straight_route(10, 0.5), Params::default()).unwrap();
        collect(tracker.plan(&Pose::new(0.0, 0.0, 0.0)).unwrap());
        collect(tracker.plan(&Pose::new(3.0, 0.0, 0.0)).unwrap());
        assert_eq!(tracker.index(), 3);
    }

    #[test]
    fn test_stationary_is_idempotent() {
        let mut tracker = RouteTracker::new(straight_route(20, 0.1), Params::default()).unwrap();
        let pose = Pose::new(0.52, 0.03, 0.1);

        let first = collect(tracker.plan(&pose).unwrap());
        let index = tracker.index();
        let second = collect(tracker.plan(&pose).unwrap());

        assert_eq!(tracker.index(), index);
        assert_eq!(first, second);
    }

    #[test]
    fn test_progress_is_monotonic() {
        let mut tracker = RouteTracker::new(straight_route(100, 0.05), Params::default()).unwrap();
        let mut last_progress = 0.0;

        for i in 0..100 {
            let pose = Pose::new(i as f64 * 0.04, 0.0, 0.0);
            tracker.plan(&pose).unwrap();

            assert!(tracker.progress() >= last_progress);
            last_progress = tracker.progress();
        }

        // The default predicate accepts poses up to 2 m behind the robot
        assert!(last_progress > 0.3);
    }

    #[test]
    fn test_failure_and_recovery() {
        let mut tracker = RouteTracker::new(straight_route(10, 0.5), Params::default()).unwrap();

        assert!(matches!(
            tracker.plan(&Pose::new(100.0, 100.0, 0.0)).unwrap(),
            LocalPath::Failure
        ));
        assert_eq!(tracker.index(), 0);
        assert!(tracker.handle().snapshot().unwrap().search_all);

        collect(tracker.plan(&Pose::new(2.0, 0.0, 0.0)).unwrap());
        assert!(!tracker.handle().snapshot().unwrap().search_all);
    }

    #[test]
    fn test_set_progress() {
        let mut tracker = RouteTracker::new(straight_route(10, 0.5), Params::default()).unwrap();

        tracker.set_progress(0.5).unwrap();
        assert_eq!(tracker.index(), 5);
        assert!((tracker.progress() - 0.6).abs() < 1e-12);
        assert_eq!(tracker.current_target(), &Pose::new(2.5, 0.0, 0.0));

        tracker.set_progress(1.0).unwrap();
        assert_eq!(tracker.index(), 9);

        assert!(matches!(
            tracker.set_progress(1.5),
            Err(RouteTrackerError::InvalidProgress(_))
        ));
        assert!(tracker.set_progress(-0.1).is_err());
    }

    #[test]
    fn test_loop() {
        let mut tracker = RouteTracker::new(straight_route(10, 0.5), Params::default()).unwrap();
        assert!(!tracker.loop_route());
        tracker.set_loop(true).unwrap();
        assert!(tracker.loop_route());
        tracker.set_progress(1.0).unwrap();

        let path = collect(tracker.plan(&Pose::new(0.0, 0.0, 0.0)).unwrap());

        assert_eq!(tracker.index(), 0);
        assert_eq!(path.len(), 10);
    }

    #[test]
    fn test_cone_predicate_moves_past_tip() {
        let params = Params {
            min_tip_angle_rad: FRAC_PI_4,
            search_count: 5,
            local_first_radius_m: 1.0,
            local_first_cone_rad: Some(std::f64::consts::FRAC_PI_3),
        };

        let local_first = cone_local_first(1.0, std::f64::consts::FRAC_PI_3);
        assert!(local_first(&Pose::identity()));
        assert!(!local_first(&Pose::new(-0.1, 0.0, 0.0)));
        assert!(!local_first(&Pose::new(0.5, 0.0, 1.2)));

        let route = Route::new(vec![
            Pose::new(0.0, 0.0, 0.0),
            Pose::new(0.5, 0.0, 0.0),
            Pose::new(0.5, 0.5, FRAC_PI_2),
            Pose::new(0.5, 1.0, FRAC_PI_2),
        ])
        .unwrap();
        let mut tracker = RouteTracker::new(route, params).unwrap();
        assert_eq!(tracker.tips(), &[1, 3]);

        collect(tracker.plan(&Pose::new(0.4, 0.0, 0.0)).unwrap());
        assert_eq!(tracker.index(), 1);

        // Facing up the second segment, the tip is now beside the robot
        collect(tracker.plan(&Pose::new(0.5, 0.1, FRAC_PI_2)).unwrap());
        assert_eq!(tracker.index(), 2);
    }

    #[test]
    fn test_handle_snapshot() {
        let mut tracker = RouteTracker::new(straight_route(10, 0.5), Params::default()).unwrap();
        let handle = tracker.handle();

        collect(tracker.plan(&Pose::new(1.0, 0.0, 0.0)).unwrap());
        tracker.set_loop(true).unwrap();

        let snapshot = std::thread::spawn(move || handle.snapshot().unwrap())
            .join()
            .unwrap();

        assert_eq!(snapshot.index, tracker.index());
        assert!(snapshot.loop_route);
        assert!(!snapshot.search_all);
        assert!((snapshot.progress - tracker.progress()).abs() < 1e-12);
    }
}
