//! Per-module controller
//!
//! Drives one physical wheel's steering axis to a target angle and its drive
//! axis to a target speed. The controller has no knowledge of chassis level
//! semantics - it only sees module states and produces actuator demands.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// Internal
use super::ModuleState;
use crate::chassis::ModuleGeometry;
use util::maths::get_ang_dist;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Actuator demand for one module.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct ModuleDemand {
    /// Drive motor voltage demand, clamped to the physical limit.
    ///
    /// Units: volts, signed
    pub drive_voltage_v: f64,

    /// Steering position demand in the raw encoder frame, continuous
    /// (not wrapped), so the steering loop never takes the long way round.
    ///
    /// Units: radians
    pub steer_raw_pos_rad: f64,
}

/// Controller for a single swerve module.
pub struct ModuleCtrl {
    geom: ModuleGeometry,

    /// Maximum achievable wheel speed, used for the voltage feedforward.
    ///
    /// Units: meters/second
    max_speed_ms: f64,

    /// Physical voltage limit of the drive actuator.
    ///
    /// Units: volts
    max_voltage_v: f64,

    /// Proportional gain of the wheel speed loop.
    ///
    /// Units: volts per meter/second of error
    speed_kp_v_per_ms: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ModuleCtrl {
    pub fn new(
        geom: ModuleGeometry,
        max_speed_ms: f64,
        max_voltage_v: f64,
        speed_kp_v_per_ms: f64,
    ) -> Self {
        Self {
            geom,
            max_speed_ms,
            max_voltage_v,
            speed_kp_v_per_ms,
        }
    }

    /// Convert a raw actuator reading into a body-frame module state.
    pub fn measured_state(&self, raw_speed_ms: f64, raw_angle_rad: f64) -> ModuleState {
        ModuleState {
            speed_ms: raw_speed_ms,
            angle_rad: self.geom.calibrated_angle_rad(raw_angle_rad),
        }
    }

    /// Compute the actuator demand which drives the module to `target` from
    /// `measured`.
    ///
    /// The steering axis always rotates by the shortest signed angular
    /// distance. If the direct rotation would exceed 90 deg the wheel speed
    /// is negated and the target angle offset by 180 deg instead, so the
    /// steering axis never turns further than a quarter revolution.
    ///
    /// Returns the demand and a flag indicating the drive voltage was
    /// clamped to the physical limit.
    pub fn drive_to(
        &self,
        target: &ModuleState,
        measured: &ModuleState,
    ) -> (ModuleDemand, bool) {
        let mut speed_dem_ms = target.speed_ms;
        let mut delta_rad = get_ang_dist(measured.angle_rad, target.angle_rad);

        // Shortest path optimisation: reverse the wheel rather than steering
        // more than 90 deg
        if delta_rad.abs() > std::f64::consts::FRAC_PI_2 {
            speed_dem_ms = -speed_dem_ms;
            delta_rad -= std::f64::consts::PI * delta_rad.signum();
        }

        // The steering demand stays in the continuous measured frame
        let steer_pos_rad = measured.angle_rad + delta_rad;

        // Wheel speed loop: feedforward on the demand plus proportional
        // correction on the measured error
        let feedforward_v = speed_dem_ms / self.max_speed_ms * self.max_voltage_v;
        let correction_v = self.speed_kp_v_per_ms * (speed_dem_ms - measured.speed_ms);

        let unclamped_v = feedforward_v + correction_v;
        let drive_voltage_v = unclamped_v.clamp(-self.max_voltage_v, self.max_voltage_v);
        let limited = (unclamped_v - drive_voltage_v).abs() > 0.0;

        let demand = ModuleDemand {
            drive_voltage_v,
            steer_raw_pos_rad: self.geom.raw_angle_rad(steer_pos_rad),
        };

        (demand, limited)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    const TOL: f64 = 1e-9;

    fn test_ctrl() -> ModuleCtrl {
        ModuleCtrl::new(
            ModuleGeometry {
                pos_x_m: 0.3,
                pos_y_m: 0.3,
                encoder_zero_offset_rad: 0.0,
            },
            4.0,
            12.0,
            0.0,
        )
    }

    #[test]
    fn test_direct_rotation() {
        let ctrl = test_ctrl();

        let target = ModuleState { speed_ms: 2.0, angle_rad: 1.0 };
        let measured = ModuleState { speed_ms: 0.0, angle_rad: 0.5 };

        let (demand, _) = ctrl.drive_to(&target, &measured);

        // Less than 90 deg away: steer directly, keep the speed sign
        assert!((demand.steer_raw_pos_rad - 1.0).abs() < TOL);
        assert!((demand.drive_voltage_v - 2.0 / 4.0 * 12.0).abs() < TOL);
    }

    #[test]
    fn test_shortest_path_reverses_wheel() {
        let ctrl = test_ctrl();

        // Target is 181 deg away: expect the -179 deg turn with the wheel
        // speed reversed, not the 181 deg turn
        let target = ModuleState {
            speed_ms: 2.0,
            angle_rad: 181f64.to_radians(),
        };
        let measured = ModuleState { speed_ms: 0.0, angle_rad: 0.0 };

        let (demand, _) = ctrl.drive_to(&target, &measured);

        assert!((demand.steer_raw_pos_rad - 1f64.to_radians()).abs() < TOL);
        assert!(demand.drive_voltage_v < 0.0);
        assert!((demand.drive_voltage_v + 2.0 / 4.0 * 12.0).abs() < TOL);
    }

    #[test]
    fn test_steer_demand_is_continuous() {
        let ctrl = test_ctrl();

        // Measured angle far outside [0, 2pi): the demand must stay in the
        // measured frame rather than wrapping back near zero
        let measured = ModuleState {
            speed_ms: 0.0,
            angle_rad: 10.0 * std::f64::consts::TAU + 0.1,
        };
        let target = ModuleState { speed_ms: 1.0, angle_rad: 0.2 };

        let (demand, _) = ctrl.drive_to(&target, &measured);

        assert!(
            (demand.steer_raw_pos_rad - (10.0 * std::f64::consts::TAU + 0.2)).abs() < TOL
        );
    }

    #[test]
    fn test_voltage_clamped() {
        let ctrl = ModuleCtrl::new(
            ModuleGeometry {
                pos_x_m: 0.3,
                pos_y_m: 0.3,
                encoder_zero_offset_rad: 0.0,
            },
            4.0,
            12.0,
            10.0,
        );

        // Large error with a high gain saturates the output
        let target = ModuleState { speed_ms: 4.0, angle_rad: 0.0 };
        let measured = ModuleState { speed_ms: -4.0, angle_rad: 0.0 };

        let (demand, limited) = ctrl.drive_to(&target, &measured);

        assert!(limited);
        assert_eq!(demand.drive_voltage_v, 12.0);
    }

    #[test]
    fn test_encoder_offset_applied() {
        let ctrl = ModuleCtrl::new(
            ModuleGeometry {
                pos_x_m: 0.3,
                pos_y_m: 0.3,
                encoder_zero_offset_rad: 0.5,
            },
            4.0,
            12.0,
            0.0,
        );

        let measured = ctrl.measured_state(1.0, 0.5);
        assert!(measured.angle_rad.abs() < TOL);

        let target = ModuleState { speed_ms: 1.0, angle_rad: 0.0 };
        let (demand, _) = ctrl.drive_to(&target, &measured);
        assert!((demand.steer_raw_pos_rad - 0.5).abs() < TOL);
    }
}
