//! Parameters structure for SwerveCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for swerve drive control.
#[derive(Debug, Default, Deserialize)]
pub struct Params {
    /// Physical voltage limit of the drive actuators.
    ///
    /// Units: volts
    pub max_voltage_v: f64,

    /// Proportional gain of the wheel speed loops.
    ///
    /// Units: volts per meter/second of error
    pub speed_kp_v_per_ms: f64,
}
