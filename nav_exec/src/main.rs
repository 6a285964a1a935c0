//! Simulated navigation executable entry point.
//!
//! # Architecture
//!
//! The executable runs the navigation pipeline against a simulated chassis:
//!
//!     - Initialise session, logging and parameters
//!     - Load the route and build the navigation manager
//!     - Main loop:
//!         - Get the simulated robot pose
//!         - Navigation processing (route tracking, obstacle avoidance, path following)
//!         - Send the command to the simulated chassis
//!         - Advance the simulation by one cycle
//!     - Save the trajectory and final telemetry into the session directory

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Standard
use std::{
    path::PathBuf,
    thread,
    time::{Duration, Instant},
};

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{debug, info, warn};
use structopt::StructOpt;

// Internal
use comms_if::tc::NavCmd;
use nav_lib::{
    geom::Pose,
    nav_mgr::{self, NavMgr},
    route::Route,
    sim::{self, SimChassis},
};
use util::{
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "nav_exec", about = "Follow a route with a simulated chassis")]
struct Opt {
    /// Route file containing one `x,y,heading_rad` pose per line
    #[structopt(parse(from_os_str))]
    route: PathBuf,

    /// Navigation parameter file, defaults to `$NAV_SW_ROOT/params/nav_mgr.toml`
    #[structopt(long, parse(from_os_str))]
    nav_params: Option<PathBuf>,

    /// Simulation parameter file, defaults to `$NAV_SW_ROOT/params/sim.toml`
    #[structopt(long, parse(from_os_str))]
    sim_params: Option<PathBuf>,

    /// Restart from the beginning of the route once the end is reached
    #[structopt(long = "loop")]
    loop_route: bool,

    /// Initial progress along the route in [0, 1]
    #[structopt(long)]
    progress: Option<f64>,

    /// Sleep between cycles so the simulation runs in real time
    #[structopt(long)]
    realtime: bool,

    /// Log debug messages
    #[structopt(short, long)]
    verbose: bool,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    let session =
        Session::new("nav_exec", "sessions").wrap_err("Failed to create the session")?;

    let level = if opt.verbose {
        LevelFilter::Debug
    }
    else {
        LevelFilter::Info
    };
    logger_init(level, &session).wrap_err("Failed to initialise logging")?;

    info!("Navigation Executable (simulated chassis)\n");
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI arguments: {:?}", opt);

    // ---- LOAD PARAMETERS ----

    let nav_params: nav_mgr::Params = match opt.nav_params {
        Some(ref p) => util::params::load_from(p),
        None => util::params::load("nav_mgr.toml"),
    }
    .wrap_err("Could not load navigation params")?;

    let sim_params: sim::Params = match opt.sim_params {
        Some(ref p) => util::params::load_from(p),
        None => util::params::load("sim.toml"),
    }
    .wrap_err("Could not load simulation params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE MODULES ----

    let route = Route::load(&opt.route)
        .wrap_err_with(|| format!("Failed to load the route from {:?}", opt.route))?;
    info!("Loaded route of {} poses", route.len());

    let mut chassis = SimChassis::new(sim_params.start_pose);
    let obstacles = chassis.obstacles(sim_params.obstacles_m.clone());
    info!(
        "Simulated chassis initialised with {} obstacle points",
        sim_params.obstacles_m.len()
    );

    let mut nav = NavMgr::new(route, nav_params, Box::new(obstacles))
        .wrap_err("Failed to initialise NavMgr")?;

    if let Some(progress) = opt.progress {
        nav.handle_cmd(NavCmd::SetProgress { progress })
            .wrap_err("Invalid initial progress")?;
    }

    nav.handle_cmd(NavCmd::Follow {
        loop_route: opt.loop_route,
    })
    .wrap_err("Failed to start following the route")?;

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    let cycle_period = Duration::from_secs_f64(sim_params.cycle_period_s);
    let mut trajectory: Vec<Pose> = vec![chassis.pose()];
    let mut last_tm = None;
    let mut num_cycles = 0;

    while num_cycles < sim_params.max_cycles {
        let cycle_start_instant = Instant::now();

        // ---- NAVIGATION PROCESSING ----

        let output = nav
            .step(&chassis.pose())
            .wrap_err("Error during navigation processing")?;

        // No command means keep doing what the chassis was doing, except after a failure where
        // the only safe thing to do is stop
        match output.cmd {
            Some(cmd) => chassis.send(cmd),
            None if !output.tm.obstacles_unavailable => chassis.send(Default::default()),
            None => (),
        }

        last_tm = Some(output.tm);

        // ---- SIMULATION ----

        chassis
            .step(sim_params.cycle_period_s)
            .wrap_err("Simulation error")?;
        trajectory.push(chassis.pose());

        num_cycles += 1;

        if let comms_if::tm::NavMode::Idle = nav.mode() {
            info!("Navigation returned to idle after {} cycles", num_cycles);
            break;
        }

        // ---- CYCLE MANAGEMENT ----

        if opt.realtime {
            let cycle_dur = Instant::now() - cycle_start_instant;

            match cycle_period.checked_sub(cycle_dur) {
                Some(d) => thread::sleep(d),
                None => warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - cycle_period.as_secs_f64()
                ),
            }
        }
    }

    if num_cycles >= sim_params.max_cycles {
        warn!("Cycle limit ({}) reached", sim_params.max_cycles);
    }

    // ---- SHUTDOWN ----

    let path = session
        .save_json("trajectory.json", &trajectory)
        .wrap_err("Failed to save the trajectory")?;
    info!("Trajectory saved to {:?}", path);

    if let Some(tm) = last_tm {
        info!(
            "Final progress {:.1} %, pose {:?}",
            tm.progress * 100.0,
            chassis.pose()
        );

        session
            .save_json("nav_tm.json", &tm)
            .wrap_err("Failed to save the final telemetry")?;
    }

    info!("End of execution");

    Ok(())
}
