//! Implementations for the SwerveCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::Serialize;

// Internal
use super::{
    ChassisVelocity, DriveCmd, ModuleCtrl, ModuleDemand, ModuleState, Params,
    SwerveCtrlError, SwerveKinematics, NUM_MODULES,
};
use crate::chassis::ChassisGeometry;
use util::{module::State, params, session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Swerve drive control module state
#[derive(Default)]
pub struct SwerveCtrl {
    params: Params,

    geom: Option<ChassisGeometry>,
    kinematics: Option<SwerveKinematics>,
    module_ctrls: Option<[ModuleCtrl; NUM_MODULES]>,

    report: StatusReport,

    pub(crate) output: Option<OutputData>,
}

/// Input data to swerve control.
#[derive(Clone, Copy, Default)]
pub struct InputData {
    /// The drive command to be executed, or `None` if there is no new
    /// command on this cycle.
    pub cmd: Option<DriveCmd>,

    /// Measured module states, in body-frame calibrated form.
    pub measured: [ModuleState; NUM_MODULES],
}

/// Output demands that the actuator driver must execute.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct OutputData {
    /// Per-module actuator demands.
    pub demands: [ModuleDemand; NUM_MODULES],

    /// The desaturated module states the demands were derived from.
    pub target_states: [ModuleState; NUM_MODULES],
}

/// Status report for SwerveCtrl processing.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct StatusReport {
    /// True if the module speeds were scaled down to the chassis capability.
    pub desaturated: bool,

    /// Per-module flag raised when the drive voltage demand hit the
    /// physical limit.
    pub drive_voltage_limited: [bool; NUM_MODULES],
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for SwerveCtrl {
    type InitData = (&'static str, ChassisGeometry);
    type InitError = SwerveCtrlError;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = SwerveCtrlError;

    /// Initialise the SwerveCtrl module.
    ///
    /// Expected init data is the path to the parameter file and the validated
    /// chassis geometry.
    fn init(
        &mut self,
        (params_path, geom): Self::InitData,
        _session: &Session,
    ) -> Result<(), Self::InitError> {
        self.params = params::load(params_path).map_err(SwerveCtrlError::ParamLoadError)?;

        self.kinematics = Some(SwerveKinematics::new(&geom)?);

        let mk = |i: usize| {
            ModuleCtrl::new(
                geom.modules[i],
                geom.max_module_speed_ms,
                self.params.max_voltage_v,
                self.params.speed_kp_v_per_ms,
            )
        };
        self.module_ctrls = Some([mk(0), mk(1), mk(2), mk(3)]);

        self.geom = Some(geom);

        Ok(())
    }

    /// Perform cyclic processing of swerve control.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        // Clear the status report
        self.report = StatusReport::default();

        let geom = self.geom.as_ref().ok_or(SwerveCtrlError::NotInitialised)?;
        let kinematics = self
            .kinematics
            .as_mut()
            .ok_or(SwerveCtrlError::NotInitialised)?;
        let module_ctrls = self
            .module_ctrls
            .as_ref()
            .ok_or(SwerveCtrlError::NotInitialised)?;

        let output = match input_data.cmd {
            Some(cmd) => {
                if !cmd.is_valid() {
                    return Err(SwerveCtrlError::InvalidCmd(cmd));
                }

                let vel = match cmd {
                    DriveCmd::Stop => ChassisVelocity::zero(),
                    DriveCmd::Velocity(v) => v,
                };

                // Inverse kinematics then desaturation. Desaturation is not
                // an error path, it is the defined policy whenever the
                // demand exceeds the chassis capability.
                let mut target_states = kinematics.inverse(&vel);
                self.report.desaturated = SwerveKinematics::desaturate(
                    &mut target_states,
                    geom.max_module_speed_ms,
                );

                let mut demands = [ModuleDemand::default(); NUM_MODULES];
                for i in 0..NUM_MODULES {
                    let (demand, limited) = module_ctrls[i]
                        .drive_to(&target_states[i], &input_data.measured[i]);
                    demands[i] = demand;
                    self.report.drive_voltage_limited[i] = limited;
                }

                OutputData {
                    demands,
                    target_states,
                }
            }
            None => {
                // No new command: keep the previous steering demands with the
                // drive voltages zeroed. If there is no previous output use
                // the default (zero) demands.
                match self.output {
                    Some(prev) => {
                        let mut o = prev;
                        for demand in o.demands.iter_mut() {
                            demand.drive_voltage_v = 0.0;
                        }
                        for state in o.target_states.iter_mut() {
                            state.speed_ms = 0.0;
                        }
                        o
                    }
                    None => OutputData::default(),
                }
            }
        };

        trace!(
            "SwerveCtrl output:\n    drv: {:?}\n    str: {:?}",
            output.demands.iter().map(|d| d.drive_voltage_v).collect::<Vec<_>>(),
            output.demands.iter().map(|d| d.steer_raw_pos_rad).collect::<Vec<_>>()
        );

        // Update the output in self
        self.output = Some(output);

        Ok((output, self.report))
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

    fn test_geom() -> ChassisGeometry {
        chassis::ChassisGeometry::from_params(&chassis::Params {
            track_width_m: 0.6,
            wheelbase_m: 0.6,
            wheel_diameter_m: 0.1,
            drive_motor_free_speed_rpm: 6380.0,
            drive_reduction: 0.25,
            encoder_zero_offsets_rad: [0.0; 4],
        })
        .unwrap()
    }

    /// Build a SwerveCtrl without going through parameter file loading.
    fn test_ctrl() -> SwerveCtrl {
        let geom = test_geom();
        let params = Params {
            max_voltage_v: 12.0,
            speed_kp_v_per_ms: 0.0,
        };

        let mk = |i: usize| {
            ModuleCtrl::new(
                geom.modules[i],
                geom.max_module_speed_ms,
                params.max_voltage_v,
                params.speed_kp_v_per_ms,
            )
        };

        SwerveCtrl {
            kinematics: Some(SwerveKinematics::new(&geom).unwrap()),
            module_ctrls: Some([mk(0), mk(1), mk(2), mk(3)]),
            geom: Some(geom),
            params,
            ..Default::default()
        }
    }

    #[test]
    fn test_forward_drive_demands() {
        let mut ctrl = test_ctrl();

        let input = InputData {
            cmd: Some(DriveCmd::Velocity(ChassisVelocity {
                forward_ms: 1.0,
                strafe_ms: 0.0,
                angular_rads: 0.0,
            })),
            measured: [ModuleState::default(); NUM_MODULES],
        };

        let (output, report) = ctrl.proc(&input).unwrap();

        assert!(!report.desaturated);
        for demand in output.demands.iter() {
            assert!(demand.drive_voltage_v > 0.0);
            assert!(demand.steer_raw_pos_rad.abs() < TOL);
        }
    }

    #[test]
    fn test_stop_holds_steering() {
        let mut ctrl = test_ctrl();

        // Drive diagonally so the wheels steer away from zero
        let moving = InputData {
            cmd: Some(DriveCmd::Velocity(ChassisVelocity {
                forward_ms: 1.0,
                strafe_ms: 1.0,
                angular_rads: 0.0,
            })),
            measured: [ModuleState::default(); NUM_MODULES],
        };
        let (moving_out, _) = ctrl.proc(&moving).unwrap();

        let stop = InputData {
            cmd: Some(DriveCmd::Stop),
            measured: moving_out.target_states,
        };
        let (stop_out, _) = ctrl.proc(&stop).unwrap();

        for i in 0..NUM_MODULES {
            assert_eq!(stop_out.target_states[i].speed_ms, 0.0);
            assert!(
                (stop_out.target_states[i].angle_rad
                    - moving_out.target_states[i].angle_rad)
                    .abs()
                    < TOL
            );
        }
    }

    #[test]
    fn test_no_cmd_zeroes_drive() {
        let mut ctrl = test_ctrl();

        let moving = InputData {
            cmd: Some(DriveCmd::Velocity(ChassisVelocity {
                forward_ms: 1.0,
                strafe_ms: 0.0,
                angular_rads: 0.0,
            })),
            measured: [ModuleState::default(); NUM_MODULES],
        };
        ctrl.proc(&moving).unwrap();

        let idle = InputData {
            cmd: None,
            measured: [ModuleState::default(); NUM_MODULES],
        };
        let (output, _) = ctrl.proc(&idle).unwrap();

        for demand in output.demands.iter() {
            assert_eq!(demand.drive_voltage_v, 0.0);
        }
    }

    #[test]
    fn test_invalid_cmd_rejected() {
        let mut ctrl = test_ctrl();

        let input = InputData {
            cmd: Some(DriveCmd::Velocity(ChassisVelocity {
                forward_ms: f64::NAN,
                strafe_ms: 0.0,
                angular_rads: 0.0,
            })),
            measured: [ModuleState::default(); NUM_MODULES],
        };

        assert!(matches!(
            ctrl.proc(&input),
            Err(SwerveCtrlError::InvalidCmd(_))
        ));
    }

    #[test]
    fn test_invalid_cmd_then_idle_holds_steering() {
        let mut ctrl = test_ctrl();

        // Drive diagonally so the wheels steer away from zero
        let moving = InputData {
            cmd: Some(DriveCmd::Velocity(ChassisVelocity {
                forward_ms: 1.0,
                strafe_ms: 1.0,
                angular_rads: 0.0,
            })),
            measured: [ModuleState::default(); NUM_MODULES],
        };
        let (moving_out, _) = ctrl.proc(&moving).unwrap();

        // A malformed command is rejected without touching the held output
        let bad = InputData {
            cmd: Some(DriveCmd::Velocity(ChassisVelocity {
                forward_ms: f64::NAN,
                strafe_ms: 0.0,
                angular_rads: 0.0,
            })),
            measured: moving_out.target_states,
        };
        assert!(ctrl.proc(&bad).is_err());

        // Falling back to no command keeps the steering demands with the
        // drive voltages zeroed, rather than slewing the wheels back to zero
        let idle = InputData {
            cmd: None,
            measured: moving_out.target_states,
        };
        let (idle_out, _) = ctrl.proc(&idle).unwrap();

        for i in 0..NUM_MODULES {
            assert_eq!(idle_out.demands[i].drive_voltage_v, 0.0);
            assert!(
                (idle_out.demands[i].steer_raw_pos_rad
                    - moving_out.demands[i].steer_raw_pos_rad)
                    .abs()
                    < TOL
            );
        }
    }

    #[test]
    fn test_excessive_demand_desaturated() {
        let mut ctrl = test_ctrl();
        let max_speed = test_geom().max_module_speed_ms;

        let input = InputData {
            cmd: Some(DriveCmd::Velocity(ChassisVelocity {
                forward_ms: max_speed * 2.0,
                strafe_ms: 0.0,
                angular_rads: 0.0,
            })),
            measured: [ModuleState::default(); NUM_MODULES],
        };

        let (output, report) = ctrl.proc(&input).unwrap();

        assert!(report.desaturated);
        for state in output.target_states.iter() {
            assert!(state.speed_ms.abs() <= max_speed + TOL);
        }
    }
}
