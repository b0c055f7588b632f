//! Interpolation helpers for table lookups.
//!
//! # Usage
//!
//! ```rust
//! use vfx_math::{lerp, sample_linear};
//!
//! assert_eq!(lerp(0.0, 10.0, 0.5), 5.0);
//!
//! let table = [0.0, 0.25, 1.0];
//! assert_eq!(sample_linear(&table, 0.75), 0.625);
//! ```

/// Linear interpolation between two values.
///
/// Returns `a` when `t = 0.0`, and `b` when `t = 1.0`.
/// For values outside [0, 1], the result is extrapolated.
///
/// # Example
///
/// ```rust
/// use vfx_math::lerp;
///
/// assert_eq!(lerp(0.0, 10.0, 0.0), 0.0);
/// assert_eq!(lerp(0.0, 10.0, 1.0), 10.0);
/// ```
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Inverse linear interpolation.
///
/// Given a value between `a` and `b`, returns the corresponding `t` value.
/// Returns 0 when `a` and `b` coincide.
#[inline]
pub fn inverse_lerp(a: f32, b: f32, value: f32) -> f32 {
    if (b - a).abs() < 1e-10 {
        0.0
    } else {
        (value - a) / (b - a)
    }
}

/// Samples a uniformly spaced table over [0, 1] with linear interpolation.
///
/// Inputs outside [0, 1] (and NaN) are clamped to the table ends. An empty
/// table returns `x` unchanged.
pub fn sample_linear(table: &[f32], x: f32) -> f32 {
    let n = table.len();
    if n == 0 {
        return x;
    }
    if n == 1 {
        return table[0];
    }
    let max_idx = (n - 1) as f32;
    let pos = if x.is_nan() { 0.0 } else { x.clamp(0.0, 1.0) * max_idx };
    let lo = (pos.floor() as usize).min(n - 2);
    let t = pos - lo as f32;
    lerp(table[lo], table[lo + 1], t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_clamps_outside_domain() {
        let t = [0.1, 0.5, 0.9];
        assert_eq!(sample_linear(&t, -1.0), 0.1);
        assert_eq!(sample_linear(&t, 2.0), 0.9);
        assert_eq!(sample_linear(&t, 1.0), 0.9);
        assert!((sample_linear(&t, 0.25) - 0.3).abs() < 1e-6);
    }

    #[test]
    fn inverse_lerp_degenerate() {
        assert_eq!(inverse_lerp(1.0, 1.0, 3.0), 0.0);
        assert_eq!(inverse_lerp(0.0, 4.0, 1.0), 0.25);
    }
}
