//! # Mechanisms module
//!
//! Capability traits for the hardware the control core drives: the four
//! module actuators and the heading sensor. The control core only ever
//! speaks through these traits, so the same loop runs against real hardware
//! drivers or the simulated rig in [`sim`].

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod sim;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
use crate::swerve_ctrl::ModuleDemand;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// One physical swerve module: a drive actuator, a steering actuator and
/// their sensors.
///
/// Readings are in the raw actuator frame - the steering angle is the
/// absolute encoder value, uncalibrated. Calibration is the module
/// controller's job.
pub trait ModuleActuator {
    /// Apply an actuator demand.
    fn command(&mut self, demand: &ModuleDemand);

    /// Measured wheel speed.
    ///
    /// Units: meters/second
    fn read_speed_ms(&self) -> f64;

    /// Measured steering angle in the raw encoder frame.
    ///
    /// Units: radians
    fn read_angle_rad(&self) -> f64;
}

/// The chassis heading sensor.
pub trait HeadingSensor {
    /// Current heading, anticlockwise positive from the field X axis, or
    /// `None` on a sensor dropout.
    ///
    /// Units: radians
    fn heading_rad(&self) -> Option<f64>;

    /// Zero the sensor at the current physical heading.
    fn reset(&mut self);
}
