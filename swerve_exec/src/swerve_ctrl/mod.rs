//! Swerve drive control module
//!
//! This module converts a robot-relative chassis velocity demand into four
//! per-module actuator demands. Each cycle the demanded velocity is
//! decomposed into module states by the kinematics engine, desaturated to the
//! chassis capabilities, and handed to the four module controllers which
//! close the loop on the measured steering angles and wheel speeds.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod cmd;
mod kinematics;
mod module_ctrl;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use cmd::*;
pub use kinematics::*;
pub use module_ctrl::*;
pub use params::*;
pub use state::*;

pub use crate::chassis::NUM_MODULES;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during SwerveCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum SwerveCtrlError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("Recieved an invalid drive command: {0:?}")]
    InvalidCmd(DriveCmd),

    #[error("SwerveCtrl has not been initialised")]
    NotInitialised,

    #[error("The module geometry cannot be inverted: {0}")]
    SingularGeometry(String),
}
