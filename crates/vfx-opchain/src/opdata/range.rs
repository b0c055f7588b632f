//! Range op: affine remap of `[min_in, max_in]` onto `[min_out, max_out]`
//! with clamping at the output bounds.
//!
//! Bounds come in pairs. A missing lower pair means no lower clamp, and a
//! missing upper pair means no upper clamp. With a single pair the remap is
//! a pure offset; with both pairs the scale comes from the two intervals.
//!
//! ```text
//! out = clamp(in * scale + offset, min_out, max_out)
//! ```
//!
//! Alpha is never touched.

use vfx_math::MatrixOffset;

use crate::error::{OpError, OpResult};
use crate::op::{OpType, TransformDirection};

use super::{MatrixOpData, OpData};

/// Range op parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeOpData {
    /// Lower input bound.
    pub min_in: Option<f64>,
    /// Upper input bound.
    pub max_in: Option<f64>,
    /// Lower output bound (clamp floor).
    pub min_out: Option<f64>,
    /// Upper output bound (clamp ceiling).
    pub max_out: Option<f64>,
    /// Direction.
    pub direction: TransformDirection,
}

impl RangeOpData {
    /// Creates a forward range from all four bounds.
    pub fn new(
        min_in: Option<f64>,
        max_in: Option<f64>,
        min_out: Option<f64>,
        max_out: Option<f64>,
    ) -> Self {
        Self {
            min_in,
            max_in,
            min_out,
            max_out,
            direction: TransformDirection::Forward,
        }
    }

    /// Remap `[min_in, max_in]` onto `[min_out, max_out]`.
    pub fn remap(min_in: f64, max_in: f64, min_out: f64, max_out: f64) -> Self {
        Self::new(Some(min_in), Some(max_in), Some(min_out), Some(max_out))
    }

    /// Pure clamp to `[lo, hi]` with optional ends.
    pub fn clamp(lo: Option<f64>, hi: Option<f64>) -> Self {
        Self::new(lo, hi, lo, hi)
    }

    /// Sets the direction.
    pub fn with_direction(mut self, direction: TransformDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Equivalent forward range (inverse swaps input and output bounds).
    pub fn as_forward(&self) -> Self {
        match self.direction {
            TransformDirection::Forward => self.clone(),
            TransformDirection::Inverse => {
                Self::new(self.min_out, self.max_out, self.min_in, self.max_in)
            }
        }
    }

    /// Scale of the forward remap.
    pub fn scale(&self) -> f64 {
        match (self.min_in, self.max_in, self.min_out, self.max_out) {
            (Some(min_in), Some(max_in), Some(min_out), Some(max_out)) => {
                (max_out - min_out) / (max_in - min_in)
            }
            _ => 1.0,
        }
    }

    /// Offset of the forward remap.
    pub fn offset(&self) -> f64 {
        match (self.min_in, self.min_out, self.max_in, self.max_out) {
            (Some(min_in), Some(min_out), _, _) => min_out - self.scale() * min_in,
            (None, None, Some(max_in), Some(max_out)) => max_out - max_in,
            _ => 0.0,
        }
    }

    /// True when no bound is set.
    pub fn has_no_bounds(&self) -> bool {
        self.min_in.is_none()
            && self.max_in.is_none()
            && self.min_out.is_none()
            && self.max_out.is_none()
    }

    pub(crate) fn is_identity(&self) -> bool {
        let fwd = self.as_forward();
        fwd.scale() == 1.0 && fwd.offset() == 0.0
    }

    pub(crate) fn is_no_op(&self) -> bool {
        self.has_no_bounds()
    }

    pub(crate) fn identity_replacement(&self) -> OpData {
        if self.has_no_bounds() {
            return OpData::Matrix(MatrixOpData::identity());
        }
        let fwd = self.as_forward();
        OpData::Range(Self::clamp(fwd.min_out, fwd.max_out))
    }

    pub(crate) fn is_inverse(&self, other: &Self) -> bool {
        self.direction != other.direction
            && self.min_in == other.min_in
            && self.max_in == other.max_in
            && self.min_out == other.min_out
            && self.max_out == other.max_out
    }

    /// Composes two ranges exactly.
    ///
    /// The clamp interval of `self` is carried through the affine part of
    /// `other` and intersected with the clamp interval of `other`. The
    /// result is one of: a single range, a pure matrix (no bounds), a clamp
    /// followed by a matrix (one bound with a non-unit scale), or a constant
    /// matrix when the intervals do not overlap.
    pub(crate) fn combine_with(&self, other: &Self) -> OpResult<Vec<OpData>> {
        let a = self.as_forward();
        let b = other.as_forward();
        let (sa, oa) = (a.scale(), a.offset());
        let (sb, ob) = (b.scale(), b.offset());
        let s = sb * sa;
        let o = sb * oa + ob;

        let mapped_lo = a.min_out.map(|v| sb * v + ob);
        let mapped_hi = a.max_out.map(|v| sb * v + ob);
        let lo = max_bound(mapped_lo, b.min_out);
        let hi = min_bound(mapped_hi, b.max_out);

        let affine = |s: f64, o: f64| {
            OpData::Matrix(MatrixOpData::scale_offset([s, s, s, 1.0], [o, o, o, 0.0]))
        };

        match (lo, hi) {
            (Some(l), Some(h)) if l >= h => {
                let mut c = mapped_lo.or(mapped_hi).unwrap_or(0.0);
                if let Some(v) = b.min_out {
                    c = c.max(v);
                }
                if let Some(v) = b.max_out {
                    c = c.min(v);
                }
                let constant = MatrixOffset::scale_offset([0.0, 0.0, 0.0, 1.0], [c, c, c, 0.0]);
                Ok(vec![OpData::Matrix(MatrixOpData::new(constant))])
            }
            (Some(l), Some(h)) => Ok(vec![OpData::Range(Self::remap(
                (l - o) / s,
                (h - o) / s,
                l,
                h,
            ))]),
            (None, None) => Ok(vec![affine(s, o)]),
            (Some(l), None) if s == 1.0 => {
                Ok(vec![OpData::Range(Self::new(Some(l - o), None, Some(l), None))])
            }
            (None, Some(h)) if s == 1.0 => {
                Ok(vec![OpData::Range(Self::new(None, Some(h - o), None, Some(h)))])
            }
            (l, h) => {
                let clamp_lo = l.map(|v| (v - o) / s);
                let clamp_hi = h.map(|v| (v - o) / s);
                Ok(vec![OpData::Range(Self::clamp(clamp_lo, clamp_hi)), affine(s, o)])
            }
        }
    }

    pub(crate) fn inverse(&self) -> Self {
        Self {
            direction: self.direction.inverse(),
            ..self.clone()
        }
    }

    pub(crate) fn validate(&self) -> OpResult<()> {
        let bad = |reason: &str| Err(OpError::param(OpType::Range, reason));
        if self.min_in.is_some() != self.min_out.is_some() {
            return bad("min_in and min_out must both be set or both be empty");
        }
        if self.max_in.is_some() != self.max_out.is_some() {
            return bad("max_in and max_out must both be set or both be empty");
        }
        let bounds = [self.min_in, self.max_in, self.min_out, self.max_out];
        if bounds.iter().flatten().any(|v| !v.is_finite()) {
            return bad("bounds must be finite");
        }
        if let (Some(lo), Some(hi)) = (self.min_in, self.max_in) {
            if lo >= hi {
                return bad("min_in must be less than max_in");
            }
        }
        if let (Some(lo), Some(hi)) = (self.min_out, self.max_out) {
            if lo >= hi {
                return bad("min_out must be less than max_out");
            }
        }
        Ok(())
    }

    pub(crate) fn apply(&self, rgba: &mut [f32; 4]) {
        let fwd = self.as_forward();
        let scale = fwd.scale() as f32;
        let offset = fwd.offset() as f32;
        let lo = fwd.min_out.map(|v| v as f32);
        let hi = fwd.max_out.map(|v| v as f32);
        for c in rgba.iter_mut().take(3) {
            let mut v = *c * scale + offset;
            if let Some(lo) = lo {
                v = v.max(lo);
            }
            if let Some(hi) = hi {
                v = v.min(hi);
            }
            *c = v;
        }
    }

    pub(crate) fn describe(&self) -> String {
        format!(
            "{} in=[{}, {}] out=[{}, {}]",
            self.direction.as_str(),
            fmt_bound(self.min_in),
            fmt_bound(self.max_in),
            fmt_bound(self.min_out),
            fmt_bound(self.max_out)
        )
    }
}

fn max_bound(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

fn min_bound(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

fn fmt_bound(v: Option<f64>) -> String {
    v.map_or_else(|| "-".to_string(), |v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::Op;

    fn eval(ops: &[OpData], v: f32) -> f32 {
        let mut px = [v, v, v, 1.0];
        for op in ops {
            op.apply(&mut px);
        }
        px[0]
    }

    #[test]
    fn clamp_is_identity_but_not_no_op() {
        let r = RangeOpData::clamp(Some(0.0), Some(1.0));
        assert!(r.is_identity());
        assert!(!r.is_no_op());

        let empty = RangeOpData::new(None, None, None, None);
        assert!(empty.is_no_op());
        assert_eq!(empty.identity_replacement().op_type(), OpType::Matrix);
    }

    #[test]
    fn remap_and_clamp() {
        let r = RangeOpData::remap(0.0, 1.0, 0.5, 1.5);
        let mut px = [-1.0, 0.5, 2.0, 7.0];
        r.apply(&mut px);
        assert_eq!(px, [0.5, 1.0, 1.5, 7.0]);
    }

    #[test]
    fn inverse_swaps_bounds() {
        let r = RangeOpData::remap(0.0, 1.0, 0.0, 2.0);
        let inv = r.inverse();
        let mut px = [1.0, 0.5, 2.0, 1.0];
        inv.apply(&mut px);
        assert_eq!(&px[..3], &[0.5, 0.25, 1.0]);
    }

    #[test]
    fn combine_overlapping_clamps_gives_single_range() {
        let a = RangeOpData::clamp(Some(0.0), Some(1.0));
        let b = RangeOpData::clamp(Some(0.25), Some(2.0));
        let out = a.combine_with(&b).unwrap();
        assert_eq!(out.len(), 1);
        for v in [-1.0f32, 0.1, 0.5, 0.9, 3.0] {
            let expected = eval(&[OpData::Range(a.clone()), OpData::Range(b.clone())], v);
            assert_eq!(eval(&out, v), expected);
        }
    }

    #[test]
    fn combine_disjoint_gives_constant() {
        let a = RangeOpData::clamp(Some(0.0), Some(1.0));
        let b = RangeOpData::clamp(Some(2.0), Some(3.0));
        let out = a.combine_with(&b).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].op_type(), OpType::Matrix);
        assert_eq!(eval(&out, -5.0), 2.0);
        assert_eq!(eval(&out, 0.5), 2.0);
    }

    #[test]
    fn combine_lower_clamp_with_remap() {
        let a = RangeOpData::new(Some(0.0), None, Some(0.0), None);
        let b = RangeOpData::remap(0.0, 1.0, 0.0, 2.0);
        let out = a.combine_with(&b).unwrap();
        assert_eq!(out.len(), 1);
        let original = [OpData::Range(a), OpData::Range(b)];
        for v in [-0.5f32, 0.0, 0.25, 0.75, 1.5] {
            assert!((eval(&out, v) - eval(&original, v)).abs() < 1e-6);
        }
        let ops: Vec<Op> = out.into_iter().map(Op::new).collect();
        assert!(ops.iter().all(|op| op.validate().is_ok()));
    }

    #[test]
    fn validation_rejects_unpaired_bounds() {
        let r = RangeOpData::new(Some(0.0), None, None, None);
        assert!(r.validate().is_err());
        let r = RangeOpData::remap(1.0, 0.0, 0.0, 1.0);
        assert!(r.validate().is_err());
    }
}
