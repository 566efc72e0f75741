//! # Localisation module
//!
//! This module provides the pose estimate for the chassis by fusing the
//! measured module states with the heading sensor. The heading sensor is
//! authoritative for rotation - module-derived rotation is not trusted since
//! wheel slip corrupts rotational inference. The measured module states are
//! authoritative for translation.
//!
//! The estimator is a two state machine: `Reset`, in which the pose is
//! forced to a known value and no integration takes place, and `Tracking`,
//! in which the measured chassis velocity is rotated into the field frame
//! and integrated over the cycle time. The heading is replaced by the sensor
//! reading each cycle rather than integrated, so heading drift does not
//! accumulate.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// Internal
use crate::chassis::{ChassisGeometry, NUM_MODULES};
use crate::swerve_ctrl::{ChassisVelocity, ModuleState, SwerveCtrlError, SwerveKinematics};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The current pose (position and heading) of the chassis in the field
/// frame.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct Pose {
    /// The position in the field frame.
    ///
    /// Units: meters
    pub position_m: [f64; 2],

    /// The heading (angle from field X to body X, anticlockwise positive).
    ///
    /// Units: radians
    pub heading_rad: f64,
}

/// Pose estimator fusing module odometry with the heading sensor.
///
/// The estimator is the single writer of the pose - no other component may
/// mutate it.
pub struct Odometry {
    kinematics: SwerveKinematics,

    mode: OdomMode,

    pose: Pose,

    /// Last valid heading sample, used to bridge sensor dropouts.
    last_heading_rad: f64,
}

/// Input data for one odometry cycle.
#[derive(Clone, Copy)]
pub struct InputData {
    /// Measured module states, body-frame calibrated.
    pub measured: [ModuleState; NUM_MODULES],

    /// Heading sensor sample, or `None` on sensor dropout.
    pub heading_rad: Option<f64>,

    /// Wall clock time elapsed since the previous cycle.
    ///
    /// Units: seconds
    pub dt_s: f64,
}

/// Status report for odometry processing.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct StatusReport {
    /// Raised when the heading sensor dropped out and the estimate continued
    /// on the last valid heading. Degraded accuracy, not a halt.
    pub heading_degraded: bool,

    /// The chassis velocity recovered from the measured module states, for
    /// telemetry.
    pub measured_velocity: ChassisVelocity,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The estimator states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OdomMode {
    /// The pose is forced to a known value; no integration occurs until the
    /// estimator has been given a reference via [`Odometry::reset`].
    Reset,

    /// Continuous integration of the measured motion.
    Tracking,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Pose {
    /// Rotate a body-frame vector into the field frame using this pose's
    /// heading.
    pub fn rotate_to_field(&self, body: [f64; 2]) -> [f64; 2] {
        let (sin_h, cos_h) = self.heading_rad.sin_cos();
        [
            cos_h * body[0] - sin_h * body[1],
            sin_h * body[0] + cos_h * body[1],
        ]
    }
}

impl Odometry {
    /// Create a new estimator for the given chassis geometry.
    ///
    /// The estimator starts in `Reset` mode with a zero pose and will not
    /// integrate until [`Odometry::reset`] provides a reference.
    pub fn new(geom: &ChassisGeometry) -> Result<Self, SwerveCtrlError> {
        Ok(Self {
            kinematics: SwerveKinematics::new(geom)?,
            mode: OdomMode::Reset,
            pose: Pose::default(),
            last_heading_rad: 0.0,
        })
    }

    /// Force the estimate to a known pose and begin tracking from it.
    ///
    /// Safe to call while tracking - the estimate and the elapsed-time
    /// baseline are overwritten instantaneously under the single threaded
    /// cycle discipline.
    pub fn reset(&mut self, pose: Pose) {
        self.pose = pose;
        self.last_heading_rad = pose.heading_rad;
        self.mode = OdomMode::Tracking;
    }

    /// Current pose estimate.
    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// True once the estimator has a valid reference pose.
    pub fn is_tracking(&self) -> bool {
        self.mode == OdomMode::Tracking
    }

    /// Perform one cycle of pose estimation.
    ///
    /// In `Reset` mode the forced pose is returned unchanged. In `Tracking`
    /// mode the measured module states are combined into a chassis velocity,
    /// rotated into the field frame and integrated by `dt_s`.
    pub fn proc(&mut self, input: &InputData) -> (Pose, StatusReport) {
        let mut report = StatusReport::default();

        if self.mode == OdomMode::Reset {
            return (self.pose, report);
        }

        // Heading sensor is authoritative; bridge dropouts with the last
        // valid sample and flag the degraded accuracy
        let heading_rad = match input.heading_rad {
            Some(h) => {
                self.last_heading_rad = h;
                h
            }
            None => {
                report.heading_degraded = true;
                self.last_heading_rad
            }
        };

        // Translation comes from the measured module states
        let vel_body = self.kinematics.forward(&input.measured);
        report.measured_velocity = vel_body;

        self.pose.heading_rad = heading_rad;
        let vel_field = self
            .pose
            .rotate_to_field([vel_body.forward_ms, vel_body.strafe_ms]);

        self.pose.position_m[0] += vel_field[0] * input.dt_s;
        self.pose.position_m[1] += vel_field[1] * input.dt_s;

        (self.pose, report)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
