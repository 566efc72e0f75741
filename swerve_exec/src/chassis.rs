//! Chassis and module geometry
//!
//! The geometry is built once at startup from the calibration parameters and
//! is immutable for the rest of the session. A malformed geometry is a fatal
//! configuration error, there is no partial chassis.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// The number of swerve modules on the chassis.
pub const NUM_MODULES: usize = 4;

/// Module array index of the front left module.
pub const FRONT_LEFT: usize = 0;

/// Module array index of the front right module.
pub const FRONT_RIGHT: usize = 1;

/// Module array index of the back left module.
pub const BACK_LEFT: usize = 2;

/// Module array index of the back right module.
pub const BACK_RIGHT: usize = 3;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Per-module mounting and calibration record.
///
/// Positions are in the robot body frame: X forward, Y left, angles positive
/// anticlockwise about Z (right hand rule).
#[derive(Clone, Copy, Debug)]
pub struct ModuleGeometry {
    /// Module position along the body X axis.
    ///
    /// Units: meters
    pub pos_x_m: f64,

    /// Module position along the body Y axis.
    ///
    /// Units: meters
    pub pos_y_m: f64,

    /// Reading of the absolute steering encoder when the wheel points along
    /// body X.
    ///
    /// Units: radians
    pub encoder_zero_offset_rad: f64,
}

/// The full chassis geometry - four module records plus the derived velocity
/// capabilities of the base.
#[derive(Clone, Debug)]
pub struct ChassisGeometry {
    /// Lateral distance between left and right module pairs.
    ///
    /// Units: meters
    pub track_width_m: f64,

    /// Longitudinal distance between front and back module pairs.
    ///
    /// Units: meters
    pub wheelbase_m: f64,

    /// Diameter of the wheels.
    ///
    /// Units: meters
    pub wheel_diameter_m: f64,

    /// Maximum achievable module speed, derived from the drive motor free
    /// speed, the drive reduction and the wheel diameter.
    ///
    /// Units: meters/second
    pub max_module_speed_ms: f64,

    /// Maximum achievable chassis angular velocity, derived from the maximum
    /// module speed and the module positions.
    ///
    /// Units: radians/second
    pub max_ang_vel_rads: f64,

    /// The four module records, indexed by `FRONT_LEFT` .. `BACK_RIGHT`.
    pub modules: [ModuleGeometry; NUM_MODULES],
}

/// Calibration parameters the chassis geometry is built from.
#[derive(Debug, Default, Deserialize)]
pub struct Params {
    /// Lateral distance between left and right module pairs.
    ///
    /// Units: meters
    pub track_width_m: f64,

    /// Longitudinal distance between front and back module pairs.
    ///
    /// Units: meters
    pub wheelbase_m: f64,

    /// Diameter of the wheels.
    ///
    /// Units: meters
    pub wheel_diameter_m: f64,

    /// Free speed of the drive motors.
    ///
    /// Units: revolutions/minute
    pub drive_motor_free_speed_rpm: f64,

    /// Overall reduction between the drive motor and the wheel.
    ///
    /// Units: dimensionless (wheel revs per motor rev)
    pub drive_reduction: f64,

    /// Absolute steering encoder zero offsets, indexed by `FRONT_LEFT` ..
    /// `BACK_RIGHT`.
    ///
    /// Units: radians
    pub encoder_zero_offsets_rad: [f64; NUM_MODULES],
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can occur while building the chassis geometry.
#[derive(Debug, thiserror::Error)]
pub enum ChassisError {
    #[error("Chassis dimension {0} must be finite and positive, got {1}")]
    InvalidDimension(&'static str, f64),

    #[error("Encoder zero offset for module {0} is not finite: {1}")]
    InvalidEncoderOffset(usize, f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ModuleGeometry {
    /// Convert a raw steering encoder reading into a body-frame wheel angle.
    pub fn calibrated_angle_rad(&self, raw_angle_rad: f64) -> f64 {
        raw_angle_rad - self.encoder_zero_offset_rad
    }

    /// Convert a body-frame wheel angle into a raw steering encoder demand.
    pub fn raw_angle_rad(&self, calibrated_angle_rad: f64) -> f64 {
        calibrated_angle_rad + self.encoder_zero_offset_rad
    }
}

impl ChassisGeometry {
    /// Build and validate the chassis geometry from calibration parameters.
    pub fn from_params(params: &Params) -> Result<Self, ChassisError> {
        // Fail fast on any invalid dimension
        let dims = [
            ("track_width_m", params.track_width_m),
            ("wheelbase_m", params.wheelbase_m),
            ("wheel_diameter_m", params.wheel_diameter_m),
            ("drive_motor_free_speed_rpm", params.drive_motor_free_speed_rpm),
            ("drive_reduction", params.drive_reduction),
        ];

        for (name, value) in dims.iter() {
            if !value.is_finite() || *value <= 0.0 {
                return Err(ChassisError::InvalidDimension(name, *value));
            }
        }

        for (i, offset) in params.encoder_zero_offsets_rad.iter().enumerate() {
            if !offset.is_finite() {
                return Err(ChassisError::InvalidEncoderOffset(i, *offset));
            }
        }

        // Maximum module speed from the free speed of the drive motor geared
        // down to the wheel
        let max_module_speed_ms = params.drive_motor_free_speed_rpm / 60.0
            * params.drive_reduction
            * params.wheel_diameter_m
            * std::f64::consts::PI;

        // Maximum chassis angular velocity occurs with all modules tangential
        // to the circle through the module positions
        let max_ang_vel_rads = max_module_speed_ms
            / (params.track_width_m / 2.0).hypot(params.wheelbase_m / 2.0);

        let half_track_m = params.track_width_m / 2.0;
        let half_base_m = params.wheelbase_m / 2.0;

        // Corner positions in the body frame (X forward, Y left), in the
        // fixed FL, FR, BL, BR order
        let corners = [
            (half_base_m, half_track_m),
            (half_base_m, -half_track_m),
            (-half_base_m, half_track_m),
            (-half_base_m, -half_track_m),
        ];

        let mut modules = [ModuleGeometry {
            pos_x_m: 0.0,
            pos_y_m: 0.0,
            encoder_zero_offset_rad: 0.0,
        }; NUM_MODULES];

        for i in 0..NUM_MODULES {
            modules[i] = ModuleGeometry {
                pos_x_m: corners[i].0,
                pos_y_m: corners[i].1,
                encoder_zero_offset_rad: params.encoder_zero_offsets_rad[i],
            };
        }

        Ok(ChassisGeometry {
            track_width_m: params.track_width_m,
            wheelbase_m: params.wheelbase_m,
            wheel_diameter_m: params.wheel_diameter_m,
            max_module_speed_ms,
            max_ang_vel_rads,
            modules,
        })
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn test_params() -> Params {
        Params {
            track_width_m: 0.6,
            wheelbase_m: 0.6,
            wheel_diameter_m: 0.1,
            drive_motor_free_speed_rpm: 6380.0,
            drive_reduction: 0.25,
            encoder_zero_offsets_rad: [0.1, -0.2, 0.3, -0.4],
        }
    }

    #[test]
    fn test_derived_limits() {
        let geom = ChassisGeometry::from_params(&test_params()).unwrap();

        let expected_speed = 6380.0 / 60.0 * 0.25 * 0.1 * std::f64::consts::PI;
        assert!((geom.max_module_speed_ms - expected_speed).abs() < 1e-9);

        let expected_ang = expected_speed / 0.3f64.hypot(0.3);
        assert!((geom.max_ang_vel_rads - expected_ang).abs() < 1e-9);

        // Front left is forward and to the left
        assert!(geom.modules[FRONT_LEFT].pos_x_m > 0.0);
        assert!(geom.modules[FRONT_LEFT].pos_y_m > 0.0);
        assert!(geom.modules[BACK_RIGHT].pos_x_m < 0.0);
        assert!(geom.modules[BACK_RIGHT].pos_y_m < 0.0);
    }

    #[test]
    fn test_invalid_dimension_rejected() {
        let mut params = test_params();
        params.track_width_m = 0.0;
        assert!(ChassisGeometry::from_params(&params).is_err());

        let mut params = test_params();
        params.wheel_diameter_m = f64::NAN;
        assert!(ChassisGeometry::from_params(&params).is_err());

        let mut params = test_params();
        params.encoder_zero_offsets_rad[2] = f64::INFINITY;
        assert!(ChassisGeometry::from_params(&params).is_err());
    }

    #[test]
    fn test_encoder_calibration_round_trip() {
        let geom = ChassisGeometry::from_params(&test_params()).unwrap();
        let module = &geom.modules[FRONT_RIGHT];

        let raw = 1.234;
        let calibrated = module.calibrated_angle_rad(raw);
        assert!((module.raw_angle_rad(calibrated) - raw).abs() < 1e-12);
    }
}
