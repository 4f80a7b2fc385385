//! `range`
//!
//! Clamping and linear remapping between numeric ranges.

/// Restricts a value to lie between two bounds.
///
/// The bounds may be given in either order, `clamp(5.0, 10.0, 0.0)` is the same as
/// `clamp(5.0, 0.0, 10.0)`.
///
/// # Arguments
/// * `value`: The value to restrict.
/// * `a`: One end of the allowed range.
/// * `b`: The other end of the allowed range.
///
/// # Returns
/// `value` if it is inside the range, otherwise whichever bound it is closest to.
#[must_use]
pub fn clamp(value: f64, a: f64, b: f64) -> f64 {
    let low = a.min(b);
    let high = a.max(b);
    value.max(low).min(high)
}

/// Linearly maps a value from one range onto another.
///
/// The value is not clamped, values outside of the input range extrapolate along the same line.
/// The input range must not be empty (`in_low != in_high`), otherwise the result is infinite or NaN.
///
/// # Arguments
/// * `value`: The value to map.
/// * `in_low`: The input value that maps to `out_low`.
/// * `in_high`: The input value that maps to `out_high`.
/// * `out_low`: The output for `in_low`.
/// * `out_high`: The output for `in_high`.
///
/// # Returns
/// The mapped value.
#[must_use]
pub fn remap(value: f64, in_low: f64, in_high: f64, out_low: f64, out_high: f64) -> f64 {
    (value - in_low) * (out_high - out_low) / (in_high - in_low) + out_low
}
