//! 4x4 matrix with offset for RGBA color transforms.
//!
//! [`MatrixOffset`] is the affine form used by matrix operators in a color
//! pipeline: `out = M * in + offset`, applied to RGBA.
//!
//! # Convention
//!
//! The matrix is stored in **row-major** order and uses **column vectors**.
//! Internally the algebra is done with [`glam::DMat4`] in double precision.
//!
//! # Usage
//!
//! ```rust
//! use vfx_math::MatrixOffset;
//!
//! let gain = MatrixOffset::from_diagonal([2.0, 2.0, 2.0, 1.0]);
//! let half = MatrixOffset::from_diagonal([0.5, 0.5, 0.5, 1.0]);
//!
//! // Apply `gain` first, then `half`.
//! let both = gain.then(&half);
//! assert!(both.is_identity());
//! ```

use glam::{DMat4, DVec4};

/// Affine RGBA transform: a 4x4 matrix (row-major) followed by an offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatrixOffset {
    /// Matrix elements in row-major order.
    pub m: [f64; 16],
    /// Offset added after the matrix product, per RGBA channel.
    pub offset: [f64; 4],
}

const IDENTITY_ARRAY: [f64; 16] = [
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 1.0, 0.0,
    0.0, 0.0, 0.0, 1.0,
];

impl MatrixOffset {
    /// Identity transform.
    pub const IDENTITY: Self = Self {
        m: IDENTITY_ARRAY,
        offset: [0.0; 4],
    };

    /// Creates a transform from a row-major matrix and an offset.
    #[inline]
    pub const fn new(m: [f64; 16], offset: [f64; 4]) -> Self {
        Self { m, offset }
    }

    /// Creates a per-channel scale.
    pub fn from_diagonal(d: [f64; 4]) -> Self {
        let mut m = [0.0; 16];
        for (i, v) in d.iter().enumerate() {
            m[i * 5] = *v;
        }
        Self { m, offset: [0.0; 4] }
    }

    /// Creates a per-channel scale and offset.
    pub fn scale_offset(scale: [f64; 4], offset: [f64; 4]) -> Self {
        Self {
            offset,
            ..Self::from_diagonal(scale)
        }
    }

    /// Returns true if the matrix is the identity and the offset is zero.
    ///
    /// Values produced by composing a matrix with its inverse carry
    /// round-off, so elements are compared with a tight absolute tolerance.
    pub fn is_identity(&self) -> bool {
        self.is_unity_matrix() && self.offset.iter().all(|o| o.abs() <= IDENTITY_TOLERANCE)
    }

    /// Returns true if the matrix part is the identity (offset ignored).
    pub fn is_unity_matrix(&self) -> bool {
        self.m
            .iter()
            .zip(IDENTITY_ARRAY.iter())
            .all(|(a, b)| (a - b).abs() <= IDENTITY_TOLERANCE)
    }

    /// Returns true if every off-diagonal element is zero.
    ///
    /// A diagonal matrix maps each output channel from the same input channel
    /// only.
    pub fn is_diagonal(&self) -> bool {
        (0..4).all(|row| (0..4).all(|col| row == col || self.m[row * 4 + col] == 0.0))
    }

    /// Composes two transforms: `self` is applied first, then `next`.
    ///
    /// `next(self(x)) = Mn * (Ms * x + os) + on`
    pub fn then(&self, next: &Self) -> Self {
        let ms = self.to_glam();
        let mn = next.to_glam();
        let m = mn * ms;
        let offset = mn * DVec4::from_array(self.offset) + DVec4::from_array(next.offset);
        Self::from_glam(m, offset)
    }

    /// Computes the inverse transform.
    ///
    /// Returns `None` if the matrix is singular or the inverse does not fit
    /// in `f64`. Small but regular matrices (a uniform scale of 1e-5, say)
    /// invert fine.
    pub fn inverse(&self) -> Option<Self> {
        let m = self.to_glam();
        let det = m.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let inv = m.inverse();
        let offset = -(inv * DVec4::from_array(self.offset));
        let out = Self::from_glam(inv, offset);
        out.is_finite().then_some(out)
    }

    /// Returns true if every element and offset is finite.
    pub fn is_finite(&self) -> bool {
        self.m.iter().chain(self.offset.iter()).all(|v| v.is_finite())
    }

    /// Applies the transform to an RGBA value.
    #[inline]
    pub fn apply(&self, rgba: [f32; 4]) -> [f32; 4] {
        let v = [rgba[0] as f64, rgba[1] as f64, rgba[2] as f64, rgba[3] as f64];
        let m = &self.m;
        let mut out = [0.0f32; 4];
        for (row, o) in out.iter_mut().enumerate() {
            let r = row * 4;
            *o = (m[r] * v[0] + m[r + 1] * v[1] + m[r + 2] * v[2] + m[r + 3] * v[3]
                + self.offset[row]) as f32;
        }
        out
    }

    /// Converts to glam (column-major).
    #[inline]
    pub fn to_glam(&self) -> DMat4 {
        DMat4::from_cols_array(&self.m).transpose()
    }

    fn from_glam(m: DMat4, offset: DVec4) -> Self {
        Self {
            m: m.transpose().to_cols_array(),
            offset: offset.to_array(),
        }
    }
}

/// Absolute tolerance used by the identity checks.
pub const IDENTITY_TOLERANCE: f64 = 1e-12;

impl Default for MatrixOffset {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SRGB_TO_XYZ: [f64; 16] = [
        0.4124564, 0.3575761, 0.1804375, 0.0,
        0.2126729, 0.7151522, 0.0721750, 0.0,
        0.0193339, 0.1191920, 0.9503041, 0.0,
        0.0, 0.0, 0.0, 1.0,
    ];

    #[test]
    fn identity_is_diagonal_and_identity() {
        assert!(MatrixOffset::IDENTITY.is_identity());
        assert!(MatrixOffset::IDENTITY.is_diagonal());
    }

    #[test]
    fn then_applies_in_order() {
        let a = MatrixOffset::scale_offset([2.0, 2.0, 2.0, 1.0], [0.1, 0.0, 0.0, 0.0]);
        let b = MatrixOffset::scale_offset([1.0, 3.0, 1.0, 1.0], [0.0, 0.0, 0.5, 0.0]);

        let px = [0.25f32, 0.5, 0.75, 1.0];
        let sequential = b.apply(a.apply(px));
        let combined = a.then(&b).apply(px);
        for c in 0..4 {
            assert!((sequential[c] - combined[c]).abs() < 1e-6);
        }
    }

    #[test]
    fn inverse_round_trips_to_identity() {
        let m = MatrixOffset::new(SRGB_TO_XYZ, [0.01, 0.02, 0.03, 0.0]);
        let inv = m.inverse().unwrap();
        assert!(m.then(&inv).is_identity());
        assert!(!m.is_diagonal());
    }

    #[test]
    fn singular_has_no_inverse() {
        let m = MatrixOffset::from_diagonal([1.0, 0.0, 1.0, 1.0]);
        assert!(m.inverse().is_none());
    }

    #[test]
    fn small_scale_inverts() {
        // det = 1e-15
        let m = MatrixOffset::from_diagonal([1e-5, 1e-5, 1e-5, 1.0]);
        let inv = m.inverse().unwrap();
        assert!((inv.m[0] - 1e5).abs() < 1e-6);
        assert!(m.then(&inv).is_identity());

        let px = inv.apply(m.apply([0.5, 0.25, 1.0, 1.0]));
        assert!((px[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn overflowing_inverse_is_rejected() {
        let m = MatrixOffset::from_diagonal([1e-320, 1.0, 1.0, 1.0]);
        assert!(m.inverse().is_none());
    }
}
