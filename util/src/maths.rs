//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::{Float, FloatConst};

/// Wrap an angle into the range (-pi, pi].
pub fn wrap_to_pi<T>(angle: T) -> T
where
    T: Float + FloatConst
{
    let pi_t = T::PI();
    let tau_t = pi_t + pi_t;

    let wrapped = pi_t - rem_euclid(pi_t - angle, tau_t);

    // rem_euclid may round up to exactly tau, which would give -pi
    if wrapped <= -pi_t {
        wrapped + tau_t
    }
    else {
        wrapped
    }
}

/// Returns the sign of the value as -1, 0 or +1, with zero (and NaN) mapping to 0.
pub fn sign<T>(value: T) -> i8
where
    T: Float
{
    if value > T::zero() {
        1
    }
    else if value < T::zero() {
        -1
    }
    else {
        0
    }
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()` if `lhs` is much smaller than `rhs.abs()` in
/// magnitude and `lhs < 0.0`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float
{
    let r = lhs % rhs;
    if r < T::zero() { r + rhs.abs() } else { r }
}
