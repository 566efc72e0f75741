//! Swerve drive kinematics engine
//!
//! The inverse transform decomposes a chassis velocity into four module
//! velocity vectors using the rigid body relation `v_i = v + omega x r_i`,
//! where `r_i` is the module position in the body frame. This is exact for
//! any combination of translation and rotation.
//!
//! The forward transform is the least-squares inverse of the same linear
//! relation. With four modules and three chassis degrees of freedom the
//! system is over-determined, so the forward matrix is the pseudo-inverse of
//! the inverse kinematics matrix, computed once at construction since the
//! geometry is immutable.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::{SMatrix, SVector};
use serde::Serialize;

// Internal
use super::{ChassisVelocity, SwerveCtrlError};
use crate::chassis::{ChassisGeometry, NUM_MODULES};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Module speeds below this threshold are treated as zero, in which case the
/// module angle is held rather than recomputed from a meaningless
/// zero-magnitude vector.
pub const ZERO_SPEED_THRESHOLD_MS: f64 = 1e-6;

/// Numerical tolerance for the pseudo-inverse computation.
const PINV_EPSILON: f64 = 1e-10;

// ---------------------------------------------------------------------------
// TYPES
// ---------------------------------------------------------------------------

type InverseMatrix = SMatrix<f64, { 2 * NUM_MODULES }, 3>;
type ForwardMatrix = SMatrix<f64, 3, { 2 * NUM_MODULES }>;
type ModuleVector = SVector<f64, { 2 * NUM_MODULES }>;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The state of a single module - a signed wheel speed and a body-frame
/// wheel angle.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct ModuleState {
    /// Units: meters/second, signed
    pub speed_ms: f64,

    /// Units: radians, unconstrained range
    pub angle_rad: f64,
}

/// Bidirectional transform between chassis velocity and module states.
pub struct SwerveKinematics {
    /// Maps `[forward, strafe, angular]` to stacked module velocity
    /// components `[vx_0, vy_0, .., vx_3, vy_3]`.
    inverse_matrix: InverseMatrix,

    /// Least-squares inverse of `inverse_matrix`.
    forward_matrix: ForwardMatrix,

    /// Module angles produced by the last inverse transform, held when the
    /// demanded velocity is zero.
    prev_angles_rad: [f64; NUM_MODULES],
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SwerveKinematics {
    /// Build the kinematics for the given chassis geometry.
    pub fn new(geom: &ChassisGeometry) -> Result<Self, SwerveCtrlError> {
        let mut inverse_matrix = InverseMatrix::zeros();

        for (i, module) in geom.modules.iter().enumerate() {
            // v_i = v + omega x r_i, with the cross product expanded in 2D
            inverse_matrix[(2 * i, 0)] = 1.0;
            inverse_matrix[(2 * i, 2)] = -module.pos_y_m;
            inverse_matrix[(2 * i + 1, 1)] = 1.0;
            inverse_matrix[(2 * i + 1, 2)] = module.pos_x_m;
        }

        let forward_matrix = inverse_matrix
            .pseudo_inverse(PINV_EPSILON)
            .map_err(|e| SwerveCtrlError::SingularGeometry(e.to_string()))?;

        Ok(Self {
            inverse_matrix,
            forward_matrix,
            prev_angles_rad: [0.0; NUM_MODULES],
        })
    }

    /// Decompose a chassis velocity into four module states.
    ///
    /// Modules whose velocity magnitude is below `ZERO_SPEED_THRESHOLD_MS`
    /// keep the angle from the previous call, so a stationary chassis does
    /// not command a meaningless wheel reorientation.
    pub fn inverse(&mut self, vel: &ChassisVelocity) -> [ModuleState; NUM_MODULES] {
        let chassis = SVector::<f64, 3>::new(
            vel.forward_ms,
            vel.strafe_ms,
            vel.angular_rads,
        );

        let module_vels = self.inverse_matrix * chassis;

        let mut states = [ModuleState::default(); NUM_MODULES];

        for i in 0..NUM_MODULES {
            let vx = module_vels[2 * i];
            let vy = module_vels[2 * i + 1];
            let speed_ms = vx.hypot(vy);

            if speed_ms < ZERO_SPEED_THRESHOLD_MS {
                states[i] = ModuleState {
                    speed_ms: 0.0,
                    angle_rad: self.prev_angles_rad[i],
                };
            } else {
                let angle_rad = vy.atan2(vx);
                self.prev_angles_rad[i] = angle_rad;
                states[i] = ModuleState { speed_ms, angle_rad };
            }
        }

        states
    }

    /// Recover the chassis velocity which best explains the given module
    /// states, in the least-squares sense.
    pub fn forward(&self, states: &[ModuleState; NUM_MODULES]) -> ChassisVelocity {
        let mut module_vels = ModuleVector::zeros();

        for (i, state) in states.iter().enumerate() {
            module_vels[2 * i] = state.speed_ms * state.angle_rad.cos();
            module_vels[2 * i + 1] = state.speed_ms * state.angle_rad.sin();
        }

        let chassis = self.forward_matrix * module_vels;

        ChassisVelocity {
            forward_ms: chassis[0],
            strafe_ms: chassis[1],
            angular_rads: chassis[2],
        }
    }

    /// Scale all module speeds down by a common ratio so that none exceeds
    /// `max_speed_ms`.
    ///
    /// Scaling all speeds by the same ratio preserves the relative wheel
    /// speed ratios and therefore the commanded path curvature. Angles are
    /// never altered.
    ///
    /// Returns `true` if desaturation was applied.
    pub fn desaturate(
        states: &mut [ModuleState; NUM_MODULES],
        max_speed_ms: f64,
    ) -> bool {
        let max_demanded = states
            .iter()
            .map(|s| s.speed_ms.abs())
            .fold(0.0f64, f64::max);

        if max_demanded <= max_speed_ms {
            return false;
        }

        let scale = max_speed_ms / max_demanded;
        for state in states.iter_mut() {
            state.speed_ms *= scale;
        }

        true
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::chassis;

    const TOL: f64 = 1e-9;

    fn test_kinematics() -> SwerveKinematics {
        let geom = chassis::ChassisGeometry::from_params(&chassis::Params {
            track_width_m: 0.6,
            wheelbase_m: 0.6,
            wheel_diameter_m: 0.1,
            drive_motor_free_speed_rpm: 6380.0,
            drive_reduction: 0.25,
            encoder_zero_offsets_rad: [0.0; 4],
        })
        .unwrap();

        SwerveKinematics::new(&geom).unwrap()
    }

    #[test]
    fn test_pure_translation() {
        let mut kin = test_kinematics();

        let states = kin.inverse(&ChassisVelocity {
            forward_ms: 1.5,
            strafe_ms: 0.0,
            angular_rads: 0.0,
        });

        // All wheels straight ahead at the demanded speed
        for state in states.iter() {
            assert!((state.speed_ms - 1.5).abs() < TOL);
            assert!(state.angle_rad.abs() < TOL);
        }
    }

    #[test]
    fn test_pure_rotation_tangential() {
        let mut kin = test_kinematics();

        let states = kin.inverse(&ChassisVelocity {
            forward_ms: 0.0,
            strafe_ms: 0.0,
            angular_rads: 1.0,
        });

        // All modules at equal speed, tangential to the module circle
        let radius = 0.3f64.hypot(0.3);
        for state in states.iter() {
            assert!((state.speed_ms - radius).abs() < TOL);
        }

        // Front left wheel velocity is perpendicular to its position vector,
        // rotated +90 deg from the position direction for positive omega
        let fl = &states[chassis::FRONT_LEFT];
        let pos_dir = 0.3f64.atan2(0.3);
        let expected = pos_dir + std::f64::consts::FRAC_PI_2;
        assert!((fl.angle_rad - expected).abs() < TOL);
    }

    #[test]
    fn test_round_trip() {
        let mut kin = test_kinematics();

        let vel = ChassisVelocity {
            forward_ms: 1.2,
            strafe_ms: -0.7,
            angular_rads: 2.1,
        };

        let states = kin.inverse(&vel);
        let recovered = kin.forward(&states);

        assert!((recovered.forward_ms - vel.forward_ms).abs() < TOL);
        assert!((recovered.strafe_ms - vel.strafe_ms).abs() < TOL);
        assert!((recovered.angular_rads - vel.angular_rads).abs() < TOL);
    }

    #[test]
    fn test_zero_velocity_holds_angles() {
        let mut kin = test_kinematics();

        let moving = kin.inverse(&ChassisVelocity {
            forward_ms: 0.5,
            strafe_ms: 0.5,
            angular_rads: 0.0,
        });

        let stopped = kin.inverse(&ChassisVelocity::zero());

        for i in 0..NUM_MODULES {
            assert_eq!(stopped[i].speed_ms, 0.0);
            assert!((stopped[i].angle_rad - moving[i].angle_rad).abs() < TOL);
        }
    }

    #[test]
    fn test_desaturation_preserves_ratios() {
        let mut kin = test_kinematics();

        // Large combined demand which exceeds any realistic module limit
        let mut states = kin.inverse(&ChassisVelocity {
            forward_ms: 5.0,
            strafe_ms: 0.0,
            angular_rads: 8.0,
        });
        let before = states.clone();

        let max_speed_ms = 3.0;
        let applied = SwerveKinematics::desaturate(&mut states, max_speed_ms);
        assert!(applied);

        // No module exceeds the limit, the fastest sits exactly on it
        let max_after = states
            .iter()
            .map(|s| s.speed_ms.abs())
            .fold(0.0f64, f64::max);
        assert!((max_after - max_speed_ms).abs() < TOL);

        // Pairwise ratios unchanged, angles untouched
        for i in 0..NUM_MODULES {
            for j in 0..NUM_MODULES {
                let ratio_before = before[i].speed_ms / before[j].speed_ms;
                let ratio_after = states[i].speed_ms / states[j].speed_ms;
                assert!((ratio_before - ratio_after).abs() < TOL);
            }
            assert_eq!(states[i].angle_rad, before[i].angle_rad);
        }
    }

    #[test]
    fn test_desaturation_noop_below_limit() {
        let mut kin = test_kinematics();

        let mut states = kin.inverse(&ChassisVelocity {
            forward_ms: 1.0,
            strafe_ms: 0.0,
            angular_rads: 0.0,
        });
        let before = states.clone();

        assert!(!SwerveKinematics::desaturate(&mut states, 3.0));
        for i in 0..NUM_MODULES {
            assert_eq!(states[i].speed_ms, before[i].speed_ms);
        }
    }
}
