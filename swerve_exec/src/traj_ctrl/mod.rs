//! # Trajectory control module
//!
//! This module follows a time-parameterised trajectory by combining a
//! feedforward velocity sampled from the trajectory with feedback
//! corrections from the pose estimate. The output of each cycle is a chassis
//! velocity demand for the swerve controller.
//!
//! A run moves through three states: `NotStarted` until a trajectory is
//! accepted, `Running` while the trajectory is being followed, and
//! `Finished` once the elapsed time passes the trajectory duration. A run
//! may only begin while the pose estimator is tracking - following a
//! trajectory without a pose reference is meaningless.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod controllers;
mod params;
mod state;
mod trajectory;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use controllers::*;
pub use params::*;
pub use state::*;
pub use trajectory::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during TrajCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum TrajCtrlError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("A trajectory needs at least 2 points, got {0}")]
    TooFewPoints(usize),

    #[error("The first trajectory point must be at time 0, got {0} s")]
    FirstPointNotAtZero(f64),

    #[error("Trajectory point {0} does not strictly increase in time")]
    NonMonotonicTime(usize),

    #[error("Trajectory point {0} contains a non-finite value")]
    NonFinitePoint(usize),

    #[error("Could not read the trajectory file: {0}")]
    TrajFileLoadError(std::io::Error),

    #[error("Could not deserialise the trajectory: {0}")]
    TrajDeserialiseError(serde_json::Error),

    #[error("Cannot begin a trajectory while the pose estimator has no reference")]
    OdometryNotTracking,

    #[error("Cannot begin a trajectory while another is running")]
    AlreadyRunning,
}
