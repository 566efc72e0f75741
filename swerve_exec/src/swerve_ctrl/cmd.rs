//! Commands passed into SwerveCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A robot-relative chassis velocity demand.
///
/// Positive forward is along body X, positive strafe is along body Y (left),
/// positive angular is anticlockwise about body Z.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct ChassisVelocity {
    /// Units: meters/second
    pub forward_ms: f64,

    /// Units: meters/second
    pub strafe_ms: f64,

    /// Units: radians/second
    pub angular_rads: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A command to be executed by SwerveCtrl.
#[derive(Clone, Copy, Debug, Serialize)]
pub enum DriveCmd {
    /// Bring the chassis to a full stop, holding the current steering
    /// positions.
    Stop,

    /// Drive at the given robot-relative chassis velocity.
    Velocity(ChassisVelocity),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ChassisVelocity {
    /// A zero chassis velocity.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Build a robot-relative velocity from a field-relative one.
    ///
    /// `heading_rad` is the current chassis heading in the field frame. The
    /// field-relative components are rotated back into the body frame, the
    /// angular rate is frame independent.
    pub fn from_field_relative(
        forward_field_ms: f64,
        strafe_field_ms: f64,
        angular_rads: f64,
        heading_rad: f64,
    ) -> Self {
        let (sin_h, cos_h) = heading_rad.sin_cos();

        Self {
            forward_ms: cos_h * forward_field_ms + sin_h * strafe_field_ms,
            strafe_ms: -sin_h * forward_field_ms + cos_h * strafe_field_ms,
            angular_rads,
        }
    }

    /// True if all components are finite.
    pub fn is_valid(&self) -> bool {
        self.forward_ms.is_finite()
            && self.strafe_ms.is_finite()
            && self.angular_rads.is_finite()
    }
}

impl DriveCmd {
    /// Determine if the command is valid (i.e. contains no non-finite data).
    pub fn is_valid(&self) -> bool {
        match self {
            DriveCmd::Stop => true,
            DriveCmd::Velocity(v) => v.is_valid(),
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
