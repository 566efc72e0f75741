//! Main swerve drive executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Main loop (fixed 50 Hz):
//!         - System input acquisition:
//!             - Module actuator sensing
//!             - Heading sensing
//!         - Localisation processing
//!         - Trajectory control processing
//!         - Swerve control processing
//!         - Actuator demand output
//!
//! With no arguments a short canned teleop demo is run through the input
//! shaper. With a single argument that file is loaded as a trajectory and
//! followed to completion. Both modes drive the simulated mechanisms.

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use swerve_lib::{
    chassis::{self, ChassisGeometry},
    data_store::DataStore,
    drive_input::{AxisInputs, InputShaper},
    loc::{self, Odometry, Pose},
    mech::{
        sim::{SimGyro, SimModule},
        HeadingSensor, ModuleActuator,
    },
    swerve_ctrl::{self, DriveCmd, ModuleState, SwerveKinematics, NUM_MODULES},
    traj_ctrl::{TrajCtrl, TrajCtrlMode, Trajectory},
};

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, info, warn};
use std::env;
use std::thread;
use std::time::{Duration, Instant};

// Internal
use util::{
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Target period of one cycle.
const CYCLE_PERIOD_S: f64 = 0.02;

/// Number of cycles per second
const CYCLE_FREQUENCY_HZ: f64 = 1.0 / CYCLE_PERIOD_S;

/// Duration of the canned teleop demo.
const TELEOP_DEMO_DURATION_S: f64 = 4.0;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The source of drive commands for this execution.
enum CmdSource {
    /// Canned teleop demo through the input shaper.
    TeleopDemo(InputShaper),

    /// Trajectory following.
    Trajectory(TrajCtrl),
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("swerve_exec", "sessions")
        .wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Trace, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Swerve Drive Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let chassis_params: chassis::Params = util::params::load("chassis.toml")
        .wrap_err("Could not load chassis params")?;

    let geom = ChassisGeometry::from_params(&chassis_params)
        .wrap_err("Chassis geometry is invalid")?;

    let swerve_params: swerve_ctrl::Params = util::params::load("swerve_ctrl.toml")
        .wrap_err("Could not load swerve control params")?;

    info!("Exec parameters loaded");
    info!(
        "    Max module speed: {:.2} m/s, max angular velocity: {:.2} rad/s",
        geom.max_module_speed_ms, geom.max_ang_vel_rads
    );

    // ---- INITIALISE DATASTORE ----

    info!("Initialising modules...");

    let mut ds = DataStore::default();

    // ---- INITIALISE MODULES ----

    ds.swerve_ctrl
        .init(("swerve_ctrl.toml", geom.clone()), &session)
        .wrap_err("Failed to initialise SwerveCtrl")?;
    info!("SwerveCtrl init complete");

    let mut odometry = Odometry::new(&geom)
        .wrap_err("Failed to initialise Odometry")?;
    info!("Odometry init complete");

    // ---- INITIALISE COMMAND SOURCE ----

    // Collect all arguments
    let args: Vec<String> = env::args().collect();

    debug!("CLI arguments: {:?}", args);

    let mut cmd_source = match args.len() {
        // No arguments: teleop demo through the input shaper
        1 => {
            info!("No trajectory provided, running the teleop demo\n");

            let shaper = InputShaper::init("drive_input.toml", &geom)
                .wrap_err("Failed to initialise the input shaper")?;

            odometry.reset(Pose::default());

            CmdSource::TeleopDemo(shaper)
        }

        // One argument: follow the given trajectory
        2 => {
            info!("Loading trajectory from \"{}\"", &args[1]);

            let trajectory = Trajectory::from_json_file(&args[1])
                .wrap_err("Failed to load the trajectory")?;

            info!(
                "Loaded trajectory lasts {:.02} s and contains {} points\n",
                trajectory.duration_s(),
                trajectory.num_points()
            );

            let mut traj_ctrl = TrajCtrl::init("traj_ctrl.toml")
                .wrap_err("Failed to initialise TrajCtrl")?;

            // Reference the pose estimate to the trajectory start before the
            // run begins
            let start = trajectory.sample(0.0);
            odometry.reset(Pose {
                position_m: start.position_m,
                heading_rad: start.heading_rad,
            });

            traj_ctrl
                .begin(trajectory, &odometry)
                .wrap_err("Failed to begin the trajectory")?;

            CmdSource::Trajectory(traj_ctrl)
        }

        _ => {
            return Err(eyre!(
                "Expected either zero or one argument, found {}",
                args.len() - 1
            ))
        }
    };

    info!("Module initialisation complete\n");

    // ---- INITIALISE SIMULATED MECHANISMS ----

    let mut sim_modules: Vec<SimModule> = (0..NUM_MODULES)
        .map(|_| SimModule::new(geom.max_module_speed_ms, swerve_params.max_voltage_v))
        .collect();

    let mut sim_gyro = SimGyro::new();
    sim_gyro.reset();

    // Forward kinematics used to recover the simulated chassis rotation for
    // the gyro model
    let sim_kinematics = SwerveKinematics::new(&geom)
        .wrap_err("Failed to build the simulation kinematics")?;

    info!("Simulated mechanisms initialised");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    loop {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // Clear items that need wiping at the start of the cycle
        ds.cycle_start(CYCLE_FREQUENCY_HZ);

        // ---- DATA INPUT ----

        let mut measured = [ModuleState::default(); NUM_MODULES];
        for i in 0..NUM_MODULES {
            measured[i] = ModuleState {
                speed_ms: sim_modules[i].read_speed_ms(),
                angle_rad: geom.modules[i].calibrated_angle_rad(sim_modules[i].read_angle_rad()),
            };
        }

        // ---- LOCALISATION PROCESSING ----

        let (pose, loc_rpt) = odometry.proc(&loc::InputData {
            measured,
            heading_rad: sim_gyro.heading_rad(),
            dt_s: CYCLE_PERIOD_S,
        });
        ds.pose = Some(pose);
        ds.loc_status_rpt = loc_rpt;

        if loc_rpt.heading_degraded {
            warn!("Heading sensor dropout, pose accuracy degraded");
        }

        // ---- COMMAND SOURCE PROCESSING ----

        let cmd = match cmd_source {
            CmdSource::TeleopDemo(ref shaper) => {
                if ds.cycle_start_time_s >= TELEOP_DEMO_DURATION_S {
                    info!("End of teleop demo reached, stopping");
                    break;
                }

                // Half forward stick with a gentle turn
                let axes = AxisInputs {
                    forward: 0.5,
                    strafe: 0.0,
                    rotate: 0.1,
                };

                Some(DriveCmd::Velocity(shaper.chassis_velocity(&axes)))
            }

            CmdSource::Trajectory(ref mut traj_ctrl) => {
                let (cmd, traj_rpt) = traj_ctrl.proc(&pose, CYCLE_PERIOD_S);
                ds.traj_ctrl_status_rpt = traj_rpt;

                if traj_rpt.pos_error_limit_exceeded {
                    warn!(
                        "Position error limit exceeded: ({:.3}, {:.3}) m",
                        traj_rpt.pos_error_m[0], traj_rpt.pos_error_m[1]
                    );
                }

                cmd
            }
        };

        // ---- CONTROL ALGORITHM PROCESSING ----

        ds.swerve_ctrl_input = swerve_ctrl::InputData { cmd, measured };

        match ds.swerve_ctrl.proc(&ds.swerve_ctrl_input) {
            Ok((o, r)) => {
                ds.swerve_ctrl_output = o;
                ds.swerve_ctrl_status_rpt = r;
            }
            Err(e) => {
                // SwerveCtrl errors usually mean a malformed command, so
                // issue the warning and fall back to the no-command
                // behaviour: hold the steering demands, zero the drive
                // voltages.
                warn!("Error during SwerveCtrl processing: {}", e);

                let idle = swerve_ctrl::InputData { cmd: None, measured };
                if let Ok((o, r)) = ds.swerve_ctrl.proc(&idle) {
                    ds.swerve_ctrl_output = o;
                    ds.swerve_ctrl_status_rpt = r;
                }
            }
        };

        // ---- ACTUATOR DEMAND OUTPUT ----

        for i in 0..NUM_MODULES {
            sim_modules[i].command(&ds.swerve_ctrl_output.demands[i]);
            sim_modules[i].step(CYCLE_PERIOD_S);
        }

        // The simulated gyro follows the chassis rotation implied by the new
        // module states
        let mut stepped = [ModuleState::default(); NUM_MODULES];
        for i in 0..NUM_MODULES {
            stepped[i] = ModuleState {
                speed_ms: sim_modules[i].read_speed_ms(),
                angle_rad: geom.modules[i].calibrated_angle_rad(sim_modules[i].read_angle_rad()),
            };
        }
        sim_gyro.integrate(sim_kinematics.forward(&stepped).angular_rads, CYCLE_PERIOD_S);

        // ---- TELEMETRY ----

        match serde_json::to_string(&ds.tm_snapshot()) {
            Ok(tm) => debug!("TM: {}", tm),
            Err(e) => warn!("Could not serialise telemetry: {}", e),
        };

        if ds.is_1_hz_cycle {
            info!(
                "Pose: ({:.3}, {:.3}) m, {:.3} rad",
                pose.position_m[0], pose.position_m[1], pose.heading_rad
            );
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match Duration::from_secs_f64(CYCLE_PERIOD_S).checked_sub(cycle_dur) {
            Some(d) => {
                ds.num_consec_cycle_overruns = 0;
                thread::sleep(d);
            }
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - CYCLE_PERIOD_S
                );
                ds.num_consec_cycle_overruns += 1;
            }
        }

        // Increment cycle counter
        ds.num_cycles += 1;

        // Exit once the trajectory run has finished (the final stop demand
        // has already been executed this cycle)
        if let CmdSource::Trajectory(ref traj_ctrl) = cmd_source {
            if traj_ctrl.mode() == TrajCtrlMode::Finished {
                info!("Trajectory finished after {} cycles", ds.num_cycles);
                break;
            }
        }
    }

    // ---- SHUTDOWN ----

    info!("End of execution");

    Ok(())
}
