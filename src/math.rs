//! Small numeric helpers shared by the field sweep and the chord tables.

/// Returns the frequency ratio of `steps` equal steps in an `n`-step octave.
///
/// # Examples
///
/// ```
/// # use assert_approx_eq::assert_approx_eq;
/// # use consonance::math;
/// assert_approx_eq!(math::step_ratio(0, 53), 1.0);
/// assert_approx_eq!(math::step_ratio(53, 53), 2.0);
/// assert_approx_eq!(math::step_ratio(12, 12), 2.0);
/// assert_approx_eq!(math::step_ratio(31, 53), 1.5, 0.002);
/// ```
pub fn step_ratio(steps: i32, n: u16) -> f64 {
    (f64::from(steps) / f64::from(n)).exp2()
}

/// Samples `n` linearly spaced values over `[low, high]`, both endpoints included.
///
/// # Panics
///
/// Panics if `n < 2`.
///
/// # Examples
///
/// ```
/// # use consonance::math;
/// let axis = math::linspace(1.0, 2.0, 5);
/// assert_eq!(axis, [1.0, 1.25, 1.5, 1.75, 2.0]);
/// assert_eq!(math::linspace(1.0, 2.0, 50)[49], 2.0);
/// ```
pub fn linspace(low: f64, high: f64, n: usize) -> Vec<f64> {
    assert!(n >= 2, "linspace requires at least 2 points but got {}", n);
    let step = (high - low) / (n - 1) as f64;
    (0..n)
        .map(|i| if i == n - 1 { high } else { low + i as f64 * step })
        .collect()
}

/// Reduces `value` into `0..modulus`, yielding a *positive* remainder for negative input.
///
/// # Examples
///
/// ```
/// # use consonance::math;
/// assert_eq!(math::rem_positive(57, 53), 4);
/// assert_eq!(math::rem_positive(-4, 53), 49);
/// assert_eq!(math::rem_positive(0, 53), 0);
/// ```
pub fn rem_positive(value: i32, modulus: u16) -> i32 {
    value.rem_euclid(i32::from(modulus))
}
