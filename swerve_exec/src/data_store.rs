//! # Data Store

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// Internal
use crate::{loc, loc::Pose, swerve_ctrl, traj_ctrl};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
///
/// Holds the module states and the per-cycle inputs, outputs and status
/// reports, so one struct can be handed to the telemetry writer at the end
/// of each cycle.
#[derive(Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u128,

    /// True if this cycle falls on a 1Hz boundary
    pub is_1_hz_cycle: bool,

    /// Session elapsed time at the start of this cycle
    pub cycle_start_time_s: f64,

    // SwerveCtrl
    pub swerve_ctrl: swerve_ctrl::SwerveCtrl,
    pub swerve_ctrl_input: swerve_ctrl::InputData,
    pub swerve_ctrl_output: swerve_ctrl::OutputData,
    pub swerve_ctrl_status_rpt: swerve_ctrl::StatusReport,

    // Localisation
    pub pose: Option<Pose>,
    pub loc_status_rpt: loc::StatusReport,

    // TrajCtrl
    pub traj_ctrl_status_rpt: traj_ctrl::StatusReport,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,
}

/// The telemetry snapshot written at the end of each cycle.
#[derive(Serialize)]
pub struct TmSnapshot<'a> {
    pub num_cycles: u128,
    pub cycle_start_time_s: f64,
    pub swerve_ctrl_output: &'a swerve_ctrl::OutputData,
    pub swerve_ctrl_status_rpt: &'a swerve_ctrl::StatusReport,
    pub pose: &'a Option<Pose>,
    pub loc_status_rpt: &'a loc::StatusReport,
    pub traj_ctrl_status_rpt: &'a traj_ctrl::StatusReport,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Perform actions required at the start of a cycle.
    ///
    /// Clears those items that need clearing at the start of a cycle, and
    /// sets the 1Hz cycle flag.
    pub fn cycle_start(&mut self, cycle_frequency_hz: f64) {
        self.is_1_hz_cycle = self.num_cycles % (cycle_frequency_hz as u128) == 0;

        self.swerve_ctrl_input = swerve_ctrl::InputData::default();
        self.swerve_ctrl_output = swerve_ctrl::OutputData::default();
        self.swerve_ctrl_status_rpt = swerve_ctrl::StatusReport::default();
        self.loc_status_rpt = loc::StatusReport::default();
        self.traj_ctrl_status_rpt = traj_ctrl::StatusReport::default();

        self.cycle_start_time_s = util::session::get_elapsed_seconds();
    }

    /// Build the telemetry snapshot for this cycle.
    pub fn tm_snapshot(&self) -> TmSnapshot<'_> {
        TmSnapshot {
            num_cycles: self.num_cycles,
            cycle_start_time_s: self.cycle_start_time_s,
            swerve_ctrl_output: &self.swerve_ctrl_output,
            swerve_ctrl_status_rpt: &self.swerve_ctrl_status_rpt,
            pose: &self.pose,
            loc_status_rpt: &self.loc_status_rpt,
            traj_ctrl_status_rpt: &self.traj_ctrl_status_rpt,
        }
    }
}
