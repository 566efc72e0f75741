//! Simulated mechanisms
//!
//! A simple dynamic model of the chassis hardware, good enough to exercise
//! the full control loop without a robot: the steering axis slews towards
//! its demand at a fixed rate and the wheel speed responds to the drive
//! voltage as a first order lag. The gyro integrates the chassis angular
//! velocity recovered from the simulated module states.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
use super::{HeadingSensor, ModuleActuator};
use crate::swerve_ctrl::ModuleDemand;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Simulated swerve module.
pub struct SimModule {
    /// Units: meters/second
    speed_ms: f64,

    /// Steering angle in the raw encoder frame.
    ///
    /// Units: radians
    angle_rad: f64,

    demand: ModuleDemand,

    /// Units: meters/second
    max_speed_ms: f64,

    /// Units: volts
    max_voltage_v: f64,

    /// Steering slew rate.
    ///
    /// Units: radians/second
    steer_rate_rads: f64,

    /// Time constant of the wheel speed response.
    ///
    /// Units: seconds
    speed_tau_s: f64,
}

/// Simulated heading sensor, integrating an externally supplied angular
/// velocity.
pub struct SimGyro {
    /// Units: radians
    heading_rad: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimModule {
    pub fn new(max_speed_ms: f64, max_voltage_v: f64) -> Self {
        Self {
            speed_ms: 0.0,
            angle_rad: 0.0,
            demand: ModuleDemand::default(),
            max_speed_ms,
            max_voltage_v,
            steer_rate_rads: 20.0,
            speed_tau_s: 0.1,
        }
    }

    /// Advance the module dynamics by one timestep.
    pub fn step(&mut self, dt_s: f64) {
        // Steering slews towards the demand at the fixed rate
        let steer_err_rad = self.demand.steer_raw_pos_rad - self.angle_rad;
        let max_step_rad = self.steer_rate_rads * dt_s;
        self.angle_rad += steer_err_rad.clamp(-max_step_rad, max_step_rad);

        // Wheel speed is a first order lag towards the steady state speed
        // for the applied voltage
        let target_ms = self.demand.drive_voltage_v / self.max_voltage_v * self.max_speed_ms;
        let alpha = (dt_s / self.speed_tau_s).min(1.0);
        self.speed_ms += (target_ms - self.speed_ms) * alpha;
    }
}

impl ModuleActuator for SimModule {
    fn command(&mut self, demand: &ModuleDemand) {
        self.demand = *demand;
    }

    fn read_speed_ms(&self) -> f64 {
        self.speed_ms
    }

    fn read_angle_rad(&self) -> f64 {
        self.angle_rad
    }
}

impl SimGyro {
    pub fn new() -> Self {
        Self { heading_rad: 0.0 }
    }

    /// Integrate the chassis angular velocity over one timestep.
    pub fn integrate(&mut self, angular_rads: f64, dt_s: f64) {
        self.heading_rad += angular_rads * dt_s;
    }
}

impl Default for SimGyro {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadingSensor for SimGyro {
    fn heading_rad(&self) -> Option<f64> {
        Some(self.heading_rad)
    }

    fn reset(&mut self) {
        self.heading_rad = 0.0;
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_module_settles_on_demand() {
        let mut module = SimModule::new(4.0, 12.0);

        module.command(&ModuleDemand {
            drive_voltage_v: 6.0,
            steer_raw_pos_rad: 0.5,
        });

        // Plenty of time for both axes to settle
        for _ in 0..200 {
            module.step(0.02);
        }

        assert!((module.read_angle_rad() - 0.5).abs() < 1e-9);
        assert!((module.read_speed_ms() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_steer_rate_limited() {
        let mut module = SimModule::new(4.0, 12.0);

        module.command(&ModuleDemand {
            drive_voltage_v: 0.0,
            steer_raw_pos_rad: 10.0,
        });
        module.step(0.02);

        // One step can only cover steer_rate * dt
        assert!((module.read_angle_rad() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_gyro_integrates() {
        let mut gyro = SimGyro::new();

        for _ in 0..50 {
            gyro.integrate(1.0, 0.02);
        }
        assert!((gyro.heading_rad().unwrap() - 1.0).abs() < 1e-9);

        gyro.reset();
        assert_eq!(gyro.heading_rad(), Some(0.0));
    }
}
