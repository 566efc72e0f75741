//! Trajectory controller state machine

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// Internal
use super::{Params, TrajControllers, TrajCtrlError, Trajectory};
use crate::loc::{Odometry, Pose};
use crate::swerve_ctrl::{ChassisVelocity, DriveCmd};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Trajectory controller.
///
/// Holds the active trajectory, the elapsed run time and the feedback
/// controllers. Time is advanced by the `dt_s` injected into each `proc`
/// call rather than read from a wall clock, keeping playback deterministic.
pub struct TrajCtrl {
    params: Params,

    controllers: TrajControllers,

    trajectory: Option<Trajectory>,

    mode: TrajCtrlMode,

    /// Time since the active run began.
    ///
    /// Units: seconds
    elapsed_s: f64,
}

/// Status report for trajectory control processing.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct StatusReport {
    /// Units: seconds
    pub elapsed_s: f64,

    /// Position error at the last cycle (target - estimate).
    ///
    /// Units: meters
    pub pos_error_m: [f64; 2],

    /// Heading error at the last cycle.
    ///
    /// Units: radians
    pub head_error_rad: f64,

    /// Raised when the position error magnitude exceeds the configured
    /// limit.
    pub pos_error_limit_exceeded: bool,

    /// Raised when the heading error magnitude exceeds the configured limit.
    pub head_error_limit_exceeded: bool,

    /// Raised on the cycle the run finishes and every cycle thereafter until
    /// a new run begins.
    pub finished: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The trajectory controller states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum TrajCtrlMode {
    /// No trajectory has been accepted yet.
    NotStarted,

    /// A trajectory is being followed.
    Running,

    /// The elapsed time has passed the trajectory duration.
    Finished,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TrajCtrl {
    /// Initialise the controller from a parameter file.
    pub fn init(params_path: &str) -> Result<Self, TrajCtrlError> {
        let params: Params =
            util::params::load(params_path).map_err(TrajCtrlError::ParamLoadError)?;

        Ok(Self::with_params(params))
    }

    /// Build the controller from an already loaded parameter struct.
    pub fn with_params(params: Params) -> Self {
        let controllers = TrajControllers::new(&params);

        Self {
            params,
            controllers,
            trajectory: None,
            mode: TrajCtrlMode::NotStarted,
            elapsed_s: 0.0,
        }
    }

    /// Current controller state.
    pub fn mode(&self) -> TrajCtrlMode {
        self.mode
    }

    /// Accept a trajectory and begin following it on the next `proc` call.
    ///
    /// Fails if another run is in progress, or if the pose estimator has no
    /// reference yet - feedback against an unreferenced pose would drive the
    /// chassis to an arbitrary point.
    pub fn begin(
        &mut self,
        trajectory: Trajectory,
        odometry: &Odometry,
    ) -> Result<(), TrajCtrlError> {
        if self.mode == TrajCtrlMode::Running {
            return Err(TrajCtrlError::AlreadyRunning);
        }
        if !odometry.is_tracking() {
            return Err(TrajCtrlError::OdometryNotTracking);
        }

        self.trajectory = Some(trajectory);
        self.mode = TrajCtrlMode::Running;
        self.elapsed_s = 0.0;
        self.controllers.reset();

        Ok(())
    }

    /// Abort the active run, dropping the trajectory.
    ///
    /// The controller returns to `NotStarted` and outputs no demand until a
    /// new run begins.
    pub fn abort(&mut self) {
        self.trajectory = None;
        self.mode = TrajCtrlMode::NotStarted;
        self.elapsed_s = 0.0;
        self.controllers.reset();
    }

    /// Perform one cycle of trajectory control.
    ///
    /// While running this samples the trajectory at the accumulated elapsed
    /// time, adds the feedback corrections to the feedforward velocity and
    /// converts the total into the body frame of the given pose. On the
    /// cycle the elapsed time passes the trajectory duration a final `Stop`
    /// is issued and the run finishes. Outside a run no demand is produced.
    pub fn proc(&mut self, pose: &Pose, dt_s: f64) -> (Option<DriveCmd>, StatusReport) {
        let mut report = StatusReport {
            elapsed_s: self.elapsed_s,
            finished: self.mode == TrajCtrlMode::Finished,
            ..Default::default()
        };

        if self.mode != TrajCtrlMode::Running {
            return (None, report);
        }

        // The trajectory is always present while running
        let trajectory = match &self.trajectory {
            Some(t) => t,
            None => {
                self.mode = TrajCtrlMode::NotStarted;
                return (None, report);
            }
        };

        self.elapsed_s += dt_s;
        report.elapsed_s = self.elapsed_s;

        if self.elapsed_s >= trajectory.duration_s() {
            self.mode = TrajCtrlMode::Finished;
            report.finished = true;
            return (Some(DriveCmd::Stop), report);
        }

        let sample = trajectory.sample(self.elapsed_s);

        let (correction, pos_error_m, head_error_rad) =
            self.controllers.get_correction(&sample, pose, dt_s);

        report.pos_error_m = pos_error_m;
        report.head_error_rad = head_error_rad;
        report.pos_error_limit_exceeded =
            pos_error_m[0].hypot(pos_error_m[1]) > self.params.pos_error_limit_m;
        report.head_error_limit_exceeded =
            head_error_rad.abs() > self.params.head_error_limit_rad;

        // Total demand is feedforward plus feedback, in the field frame,
        // converted to the body frame of the current pose
        let velocity = ChassisVelocity::from_field_relative(
            sample.velocity_field_ms[0] + correction.velocity_field_ms[0],
            sample.velocity_field_ms[1] + correction.velocity_field_ms[1],
            correction.angular_rads,
            pose.heading_rad,
        );

        (Some(DriveCmd::Velocity(velocity)), report)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
