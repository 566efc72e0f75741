//! Drive input shaping parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the drive input shaper.
#[derive(Debug, Deserialize)]
pub struct Params {
    /// Axis magnitudes below this threshold snap to zero, eliminating
    /// controller drift.
    ///
    /// Units: normalised axis value, in [0, 1)
    pub deadband: f64,

    /// Exponent of the signed power curve. Must be a positive odd integer so
    /// the curve preserves sign.
    pub curve_exponent: i32,
}
