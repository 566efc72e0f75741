//! # Trajectory controllers module
//!
//! This module provides the feedback controllers used by TrajCtrl: an
//! independent proportional controller on each of the x and y position
//! errors, and a profiled proportional controller on the heading error whose
//! output is limited in both rate and acceleration, giving a trapezoidal
//! angular velocity profile.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// Internal
use super::{Params, TrajectorySample};
use crate::loc::Pose;
use util::maths::get_ang_dist;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A proportional heading controller with a trapezoidal output profile.
///
/// The raw proportional output is clamped to the maximum angular rate and
/// the change between successive outputs is limited by the maximum angular
/// acceleration over the cycle time.
#[derive(Debug, Serialize, Clone)]
pub struct ProfiledHeadingCtrl {
    k_p: f64,

    /// Units: radians/second
    max_rate_rads: f64,

    /// Units: radians/second^2
    max_accel_radss: f64,

    /// Output of the previous cycle, the profile baseline.
    prev_output_rads: f64,
}

/// The trajectory feedback controllers.
#[derive(Debug, Serialize, Clone)]
pub struct TrajControllers {
    /// Position proportional gain, shared by the x and y axes.
    pos_k_p: f64,

    /// Heading error controller
    head_ctrl: ProfiledHeadingCtrl,
}

/// Field-frame feedback correction produced by the controllers.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Correction {
    /// Units: meters/second
    pub velocity_field_ms: [f64; 2],

    /// Units: radians/second
    pub angular_rads: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ProfiledHeadingCtrl {
    pub fn new(k_p: f64, max_rate_rads: f64, max_accel_radss: f64) -> Self {
        Self {
            k_p,
            max_rate_rads,
            max_accel_radss,
            prev_output_rads: 0.0,
        }
    }

    /// Get the profiled output for the given heading error.
    pub fn get(&mut self, error_rad: f64, dt_s: f64) -> f64 {
        let raw = (self.k_p * error_rad).clamp(-self.max_rate_rads, self.max_rate_rads);

        // Limit the change from the previous output to the acceleration
        // budget for this cycle
        let max_delta = self.max_accel_radss * dt_s;
        let out = self.prev_output_rads
            + (raw - self.prev_output_rads).clamp(-max_delta, max_delta);

        self.prev_output_rads = out;
        out
    }

    /// Reset the profile baseline, used when a new run starts.
    pub fn reset(&mut self) {
        self.prev_output_rads = 0.0;
    }
}

impl TrajControllers {
    /// Create a new instance of the controllers from the parameters
    pub fn new(params: &Params) -> Self {
        Self {
            pos_k_p: params.pos_kp,
            head_ctrl: ProfiledHeadingCtrl::new(
                params.head_kp,
                params.head_max_rate_rads,
                params.head_max_accel_radss,
            ),
        }
    }

    /// Reset controller state for a new run.
    pub fn reset(&mut self) {
        self.head_ctrl.reset();
    }

    /// Compute the feedback correction for the current sample and pose.
    ///
    /// Also returns the raw position and heading errors so the caller can
    /// report them.
    pub fn get_correction(
        &mut self,
        sample: &TrajectorySample,
        pose: &Pose,
        dt_s: f64,
    ) -> (Correction, [f64; 2], f64) {
        let pos_error_m = [
            sample.position_m[0] - pose.position_m[0],
            sample.position_m[1] - pose.position_m[1],
        ];

        let head_error_rad = get_ang_dist(pose.heading_rad, sample.heading_rad);

        let correction = Correction {
            velocity_field_ms: [
                self.pos_k_p * pos_error_m[0],
                self.pos_k_p * pos_error_m[1],
            ],
            angular_rads: self.head_ctrl.get(head_error_rad, dt_s),
        };

        (correction, pos_error_m, head_error_rad)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
