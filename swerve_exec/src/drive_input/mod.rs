//! Drive input shaping module
//!
//! Converts raw human-interface axis values in [-1, 1] into a chassis
//! velocity demand. A deadband removes controller drift around zero, then a
//! signed power curve gives fine control near zero and the full range at the
//! extremes. The shaped values are scaled by the chassis velocity
//! capabilities.
//!
//! The shaper is pure - it holds no state between cycles and is safe to
//! call every tick.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use params::*;

use crate::chassis::ChassisGeometry;
use crate::swerve_ctrl::ChassisVelocity;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Raw operator axis values, each in [-1, 1].
#[derive(Clone, Copy, Debug, Default)]
pub struct AxisInputs {
    pub forward: f64,
    pub strafe: f64,
    pub rotate: f64,
}

/// Shapes raw axis values into chassis velocity demands.
pub struct InputShaper {
    params: Params,

    /// Units: meters/second
    max_speed_ms: f64,

    /// Units: radians/second
    max_ang_vel_rads: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors in the drive input shaping configuration.
#[derive(Debug, thiserror::Error)]
pub enum DriveInputError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("Deadband must be in [0, 1), got {0}")]
    InvalidDeadband(f64),

    #[error("Curve exponent must be a positive odd integer, got {0}")]
    InvalidExponent(i32),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl InputShaper {
    /// Initialise the shaper from a parameter file and the chassis geometry.
    pub fn init(params_path: &str, geom: &ChassisGeometry) -> Result<Self, DriveInputError> {
        let params: Params =
            util::params::load(params_path).map_err(DriveInputError::ParamLoadError)?;

        Self::with_params(params, geom)
    }

    /// Build the shaper from an already validated parameter struct.
    pub fn with_params(params: Params, geom: &ChassisGeometry) -> Result<Self, DriveInputError> {
        if !(0.0..1.0).contains(&params.deadband) {
            return Err(DriveInputError::InvalidDeadband(params.deadband));
        }
        if params.curve_exponent < 1 || params.curve_exponent % 2 == 0 {
            return Err(DriveInputError::InvalidExponent(params.curve_exponent));
        }

        Ok(Self {
            params,
            max_speed_ms: geom.max_module_speed_ms,
            max_ang_vel_rads: geom.max_ang_vel_rads,
        })
    }

    /// Shape the raw axis values into a chassis velocity demand.
    pub fn chassis_velocity(&self, axes: &AxisInputs) -> ChassisVelocity {
        ChassisVelocity {
            forward_ms: self.shape_axis(axes.forward) * self.max_speed_ms,
            strafe_ms: self.shape_axis(axes.strafe) * self.max_speed_ms,
            angular_rads: self.shape_axis(axes.rotate) * self.max_ang_vel_rads,
        }
    }

    /// Apply the deadband and power curve to a single axis.
    ///
    /// Values inside the deadband map to exactly zero. The remaining range
    /// is rescaled so that a full deflection still maps to exactly 1, then
    /// passed through the odd power curve.
    fn shape_axis(&self, raw: f64) -> f64 {
        let magnitude = raw.abs();
        if magnitude < self.params.deadband {
            return 0.0;
        }

        let rescaled = (magnitude - self.params.deadband) / (1.0 - self.params.deadband);

        raw.signum() * rescaled.powi(self.params.curve_exponent)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::chassis;

    fn test_shaper() -> InputShaper {
        let geom = chassis::ChassisGeometry::from_params(&chassis::Params {
            track_width_m: 0.6,
            wheelbase_m: 0.6,
            wheel_diameter_m: 0.1,
            drive_motor_free_speed_rpm: 6380.0,
            drive_reduction: 0.25,
            encoder_zero_offsets_rad: [0.0; 4],
        })
        .unwrap();

        InputShaper::with_params(
            Params {
                deadband: 0.05,
                curve_exponent: 3,
            },
            &geom,
        )
        .unwrap()
    }

    #[test]
    fn test_deadband_snaps_to_zero() {
        let shaper = test_shaper();

        for raw in [0.0, 0.01, -0.01, 0.049, -0.049].iter() {
            let vel = shaper.chassis_velocity(&AxisInputs {
                forward: *raw,
                strafe: *raw,
                rotate: *raw,
            });
            assert_eq!(vel.forward_ms, 0.0);
            assert_eq!(vel.strafe_ms, 0.0);
            assert_eq!(vel.angular_rads, 0.0);
        }
    }

    #[test]
    fn test_full_deflection_maps_to_max() {
        let shaper = test_shaper();

        let vel = shaper.chassis_velocity(&AxisInputs {
            forward: 1.0,
            strafe: 0.0,
            rotate: 1.0,
        });

        assert!((vel.forward_ms - shaper.max_speed_ms).abs() < 1e-9);
        assert!((vel.angular_rads - shaper.max_ang_vel_rads).abs() < 1e-9);
    }

    #[test]
    fn test_sign_symmetry() {
        let shaper = test_shaper();

        for raw in [0.1, 0.3, 0.7, 1.0].iter() {
            let pos = shaper.shape_axis(*raw);
            let neg = shaper.shape_axis(-*raw);
            assert_eq!(pos, -neg);
        }
    }

    #[test]
    fn test_curve_softens_small_inputs() {
        let shaper = test_shaper();

        // Half deflection on a cubic curve is well under half output
        let shaped = shaper.shape_axis(0.5);
        assert!(shaped > 0.0);
        assert!(shaped < 0.25);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let geom = chassis::ChassisGeometry::from_params(&chassis::Params {
            track_width_m: 0.6,
            wheelbase_m: 0.6,
            wheel_diameter_m: 0.1,
            drive_motor_free_speed_rpm: 6380.0,
            drive_reduction: 0.25,
            encoder_zero_offsets_rad: [0.0; 4],
        })
        .unwrap();

        assert!(matches!(
            InputShaper::with_params(Params { deadband: 1.0, curve_exponent: 3 }, &geom),
            Err(DriveInputError::InvalidDeadband(_))
        ));
        assert!(matches!(
            InputShaper::with_params(Params { deadband: 0.05, curve_exponent: 2 }, &geom),
            Err(DriveInputError::InvalidExponent(2))
        ));
    }
}
