//! Trajectory control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for trajectory control
#[derive(Debug, Clone, Deserialize)]
pub struct Params {
    /// Position controller proportional gain, applied independently to the
    /// x and y errors.
    ///
    /// Units: (meters/second) per meter of error
    pub pos_kp: f64,

    /// Heading controller proportional gain.
    ///
    /// Units: (radians/second) per radian of error
    pub head_kp: f64,

    /// Maximum angular rate the heading controller may demand.
    ///
    /// Units: radians/second
    pub head_max_rate_rads: f64,

    /// Maximum rate of change of the heading controller output, giving the
    /// trapezoidal velocity profile.
    ///
    /// Units: radians/second^2
    pub head_max_accel_radss: f64,

    /// The limit on position error. Above this limit the corresponding
    /// status report flag is raised.
    pub pos_error_limit_m: f64,

    /// The limit on heading error. Above this limit the corresponding
    /// status report flag is raised.
    pub head_error_limit_rad: f64,
}
