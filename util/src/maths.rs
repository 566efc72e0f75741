//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Get the shortest signed angular distance from angle `a` to angle `b`.
///
/// The result is in the range `(-pi, pi]`, such that `a + dist` is the same
/// direction as `b`. Ties at exactly pi resolve to the positive rotation, so
/// the choice of turn direction is deterministic.
pub fn get_ang_dist<T>(a: T, b: T) -> T
where
    T: Float + std::ops::Mul + std::ops::Add + std::ops::Sub + std::ops::Rem
{
    let pi_t: T = T::from(std::f64::consts::PI).unwrap();
    let tau_t: T = T::from(std::f64::consts::TAU).unwrap();

    let mut dist = rem_euclid(b - a, tau_t);

    if dist > pi_t {
        dist = dist - tau_t;
    }

    dist
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()`, violating the mathematical definition, if
/// `self` is much smaller than `rhs.abs()` in magnitude and `self < 0.0`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float + std::ops::Mul + std::ops::Add + std::ops::Sub + std::ops::Rem
{
    let r = lhs % rhs;
    if r < T::from(0.0).unwrap() { r + rhs.abs() } else { r }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_get_ang_dist() {
        const TAU: f64 = std::f64::consts::TAU;
        const PI: f64 = std::f64::consts::PI;

        assert_eq!(get_ang_dist(1f64, 2f64), 1f64);
        assert_eq!(get_ang_dist(2f64, 1f64), -1f64);
        assert_eq!(get_ang_dist(0f64, TAU), 0f64);
        assert_eq!(get_ang_dist(TAU, 0f64), 0f64);
        assert_eq!(get_ang_dist(TAU - 1f64, 1f64), 2f64);

        // Ties at exactly pi resolve to the positive rotation
        assert_eq!(get_ang_dist(0f64, PI), PI);

        // 181 degrees of separation resolves to the short way round
        let long_rad = 181f64.to_radians();
        let short_rad = -179f64.to_radians();
        assert!((get_ang_dist(0f64, long_rad) - short_rad).abs() < 1e-12);
    }

    #[test]
    fn test_rem_euclid() {
        const TAU: f64 = std::f64::consts::TAU;

        assert_eq!(rem_euclid(0f64, TAU), 0f64);
        assert_eq!(rem_euclid(TAU, TAU), 0f64);
        assert_eq!(rem_euclid(-1f64, TAU), TAU - 1f64);
        assert!((rem_euclid(TAU + 1f64, TAU) - 1f64).abs() < 1e-12);
    }
}
