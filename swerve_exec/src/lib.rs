//! Swerve drive control library
//!
//! This library contains the control core for a four wheel independently
//! steered ("swerve") robot base:
//!
//! - [`chassis`]: immutable chassis and module geometry, built once at
//!   startup from calibration parameters.
//! - [`swerve_ctrl`]: the kinematics engine and the four per-wheel module
//!   controllers.
//! - [`loc`]: pose estimation by fusing measured module states with the
//!   heading sensor.
//! - [`drive_input`]: shaping of raw operator axis values into chassis
//!   velocity demands.
//! - [`traj_ctrl`]: time-parameterised trajectory following.
//! - [`mech`]: capability traits for the actuators and heading sensor, plus
//!   simulated implementations.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod chassis;
pub mod data_store;
pub mod drive_input;
pub mod loc;
pub mod mech;
pub mod swerve_ctrl;
pub mod traj_ctrl;
