//! Time-parameterised trajectory type and sampling

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use std::path::Path;

// Internal
use super::TrajCtrlError;
use util::maths::get_ang_dist;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Segments shorter than this are treated as stationary when deriving the
/// feedforward velocity direction.
const MIN_SEGMENT_LENGTH_M: f64 = 1e-9;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A single time-indexed trajectory record, as produced by the path planning
/// collaborator.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct TrajectoryPoint {
    /// Time offset from the start of the trajectory.
    ///
    /// Units: seconds
    pub time_s: f64,

    /// Position in the field frame.
    ///
    /// Units: meters
    pub position_m: [f64; 2],

    /// Chassis heading in the field frame.
    ///
    /// Units: radians
    pub heading_rad: f64,

    /// Path curvature at this point.
    ///
    /// Units: 1/meters
    pub curvature_per_m: f64,

    /// Target speed along the path.
    ///
    /// Units: meters/second
    pub velocity_ms: f64,
}

/// An ordered, time-indexed sequence of trajectory points.
///
/// Immutable once built - trajectories are generated offline or at startup
/// and never mutated during playback.
#[derive(Clone, Debug)]
pub struct Trajectory {
    points: Vec<TrajectoryPoint>,
}

/// The result of sampling a trajectory at a given time.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct TrajectorySample {
    /// Interpolated target position in the field frame.
    ///
    /// Units: meters
    pub position_m: [f64; 2],

    /// Interpolated target heading.
    ///
    /// Units: radians
    pub heading_rad: f64,

    /// Feedforward velocity in the field frame, directed along the path.
    ///
    /// Units: meters/second
    pub velocity_field_ms: [f64; 2],
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Trajectory {
    /// Build a trajectory from an ordered point sequence, validating it.
    pub fn from_points(points: Vec<TrajectoryPoint>) -> Result<Self, TrajCtrlError> {
        if points.len() < 2 {
            return Err(TrajCtrlError::TooFewPoints(points.len()));
        }

        if points[0].time_s != 0.0 {
            return Err(TrajCtrlError::FirstPointNotAtZero(points[0].time_s));
        }

        for (i, point) in points.iter().enumerate() {
            let finite = point.time_s.is_finite()
                && point.position_m[0].is_finite()
                && point.position_m[1].is_finite()
                && point.heading_rad.is_finite()
                && point.curvature_per_m.is_finite()
                && point.velocity_ms.is_finite();

            if !finite {
                return Err(TrajCtrlError::NonFinitePoint(i));
            }

            if i > 0 && point.time_s <= points[i - 1].time_s {
                return Err(TrajCtrlError::NonMonotonicTime(i));
            }
        }

        Ok(Self { points })
    }

    /// Load a trajectory from a JSON file containing an array of points.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, TrajCtrlError> {
        let json_str = std::fs::read_to_string(path)
            .map_err(TrajCtrlError::TrajFileLoadError)?;

        let points: Vec<TrajectoryPoint> = serde_json::from_str(&json_str)
            .map_err(TrajCtrlError::TrajDeserialiseError)?;

        Self::from_points(points)
    }

    /// Total duration of the trajectory.
    ///
    /// Units: seconds
    pub fn duration_s(&self) -> f64 {
        // from_points guarantees at least two points
        self.points[self.points.len() - 1].time_s
    }

    /// Number of points in the trajectory.
    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    /// Sample the trajectory at the given time offset.
    ///
    /// Times outside `[0, duration]` clamp to the corresponding endpoint
    /// with zero feedforward velocity. Inside the range the position and
    /// speed are interpolated linearly between the bracketing points and the
    /// heading along the shortest angular path. The feedforward direction is
    /// that of the bracketing segment.
    pub fn sample(&self, time_s: f64) -> TrajectorySample {
        if time_s <= 0.0 {
            return Self::end_sample(&self.points[0]);
        }
        if time_s >= self.duration_s() {
            return Self::end_sample(&self.points[self.points.len() - 1]);
        }

        // Find the segment bracketing the requested time. The bounds checks
        // above guarantee one exists.
        let mut upper = 1;
        while self.points[upper].time_s < time_s {
            upper += 1;
        }

        let p0 = &self.points[upper - 1];
        let p1 = &self.points[upper];
        let frac = (time_s - p0.time_s) / (p1.time_s - p0.time_s);

        let position_m = [
            p0.position_m[0] + (p1.position_m[0] - p0.position_m[0]) * frac,
            p0.position_m[1] + (p1.position_m[1] - p0.position_m[1]) * frac,
        ];

        let heading_rad =
            p0.heading_rad + get_ang_dist(p0.heading_rad, p1.heading_rad) * frac;

        let speed_ms = p0.velocity_ms + (p1.velocity_ms - p0.velocity_ms) * frac;

        // Direction of travel comes from the segment geometry
        let dx = p1.position_m[0] - p0.position_m[0];
        let dy = p1.position_m[1] - p0.position_m[1];
        let length = dx.hypot(dy);

        let velocity_field_ms = if length < MIN_SEGMENT_LENGTH_M {
            [0.0, 0.0]
        } else {
            [dx / length * speed_ms, dy / length * speed_ms]
        };

        TrajectorySample {
            position_m,
            heading_rad,
            velocity_field_ms,
        }
    }

    /// A stationary sample pinned to a trajectory endpoint.
    fn end_sample(point: &TrajectoryPoint) -> TrajectorySample {
        TrajectorySample {
            position_m: point.position_m,
            heading_rad: point.heading_rad,
            velocity_field_ms: [0.0, 0.0],
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn point(
        time_s: f64,
        x: f64,
        y: f64,
        heading_rad: f64,
        velocity_ms: f64,
    ) -> TrajectoryPoint {
        TrajectoryPoint {
            time_s,
            position_m: [x, y],
            heading_rad,
            curvature_per_m: 0.0,
            velocity_ms,
        }
    }

    #[test]
    fn test_validation() {
        assert!(matches!(
            Trajectory::from_points(vec![point(0.0, 0.0, 0.0, 0.0, 0.0)]),
            Err(TrajCtrlError::TooFewPoints(1))
        ));

        assert!(matches!(
            Trajectory::from_points(vec![
                point(1.0, 0.0, 0.0, 0.0, 0.0),
                point(2.0, 1.0, 0.0, 0.0, 0.0),
            ]),
            Err(TrajCtrlError::FirstPointNotAtZero(_))
        ));

        assert!(matches!(
            Trajectory::from_points(vec![
                point(0.0, 0.0, 0.0, 0.0, 0.0),
                point(1.0, 1.0, 0.0, 0.0, 0.0),
                point(1.0, 2.0, 0.0, 0.0, 0.0),
            ]),
            Err(TrajCtrlError::NonMonotonicTime(2))
        ));

        assert!(matches!(
            Trajectory::from_points(vec![
                point(0.0, f64::NAN, 0.0, 0.0, 0.0),
                point(1.0, 1.0, 0.0, 0.0, 0.0),
            ]),
            Err(TrajCtrlError::NonFinitePoint(0))
        ));

        let traj = Trajectory::from_points(vec![
            point(0.0, 0.0, 0.0, 0.0, 1.0),
            point(2.0, 2.0, 0.0, 0.0, 1.0),
        ])
        .unwrap();
        assert_eq!(traj.duration_s(), 2.0);
        assert_eq!(traj.num_points(), 2);
    }

    #[test]
    fn test_interpolation() {
        let traj = Trajectory::from_points(vec![
            point(0.0, 0.0, 0.0, 0.0, 1.0),
            point(2.0, 2.0, 0.0, 1.0, 2.0),
        ])
        .unwrap();

        let sample = traj.sample(1.0);

        assert!((sample.position_m[0] - 1.0).abs() < 1e-12);
        assert!(sample.position_m[1].abs() < 1e-12);
        assert!((sample.heading_rad - 0.5).abs() < 1e-12);

        // Speed interpolates, direction follows the segment (field X)
        assert!((sample.velocity_field_ms[0] - 1.5).abs() < 1e-12);
        assert!(sample.velocity_field_ms[1].abs() < 1e-12);
    }

    #[test]
    fn test_heading_interpolates_shortest_path() {
        // From 170 deg to -170 deg: the short way passes through 180 deg
        let traj = Trajectory::from_points(vec![
            point(0.0, 0.0, 0.0, 170f64.to_radians(), 1.0),
            point(2.0, 2.0, 0.0, -170f64.to_radians(), 1.0),
        ])
        .unwrap();

        let sample = traj.sample(1.0);
        assert!((sample.heading_rad - 180f64.to_radians()).abs() < 1e-9);
    }

    #[test]
    fn test_clamping_outside_range() {
        let traj = Trajectory::from_points(vec![
            point(0.0, 0.0, 0.0, 0.0, 1.0),
            point(2.0, 2.0, 1.0, 0.5, 1.0),
        ])
        .unwrap();

        let before = traj.sample(-1.0);
        assert_eq!(before.position_m, [0.0, 0.0]);
        assert_eq!(before.velocity_field_ms, [0.0, 0.0]);

        let after = traj.sample(10.0);
        assert_eq!(after.position_m, [2.0, 1.0]);
        assert_eq!(after.velocity_field_ms, [0.0, 0.0]);
        assert_eq!(after.heading_rad, 0.5);
    }
}
