//! Exponent op: per-channel power on RGBA with negatives clamped to zero.

use crate::error::{OpError, OpResult};
use crate::op::{OpType, TransformDirection};

use super::{MatrixOpData, OpData, RangeOpData};

/// Per-channel power.
///
/// A channel whose exponent is exactly 1 passes through untouched
/// (negatives included), which keeps an all-ones exponent a true no-op.
#[derive(Debug, Clone, PartialEq)]
pub struct ExponentOpData {
    /// Exponents for R, G, B, A.
    pub exponent: [f64; 4],
    /// Direction.
    pub direction: TransformDirection,
}

impl ExponentOpData {
    /// Creates a forward exponent op.
    pub fn new(exponent: [f64; 4]) -> Self {
        Self {
            exponent,
            direction: TransformDirection::Forward,
        }
    }

    /// Same exponent on RGB, alpha untouched.
    pub fn uniform(exp: f64) -> Self {
        Self::new([exp, exp, exp, 1.0])
    }

    /// Sets the direction.
    pub fn with_direction(mut self, direction: TransformDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Exponents with the direction folded in.
    pub fn forward_exponents(&self) -> [f64; 4] {
        match self.direction {
            TransformDirection::Forward => self.exponent,
            TransformDirection::Inverse => self.exponent.map(|e| 1.0 / e),
        }
    }

    pub(crate) fn is_identity(&self) -> bool {
        self.exponent.iter().all(|e| *e == 1.0)
    }

    pub(crate) fn identity_replacement(&self) -> OpData {
        OpData::Matrix(MatrixOpData::identity())
    }

    pub(crate) fn is_inverse(&self, other: &Self) -> bool {
        self.direction != other.direction && self.exponent == other.exponent
    }

    /// Channels whose product exponent is 1 while one of the pair still
    /// clamps negatives. The fused op would pass those negatives through.
    fn lost_clamps(&self, other: &Self) -> [bool; 4] {
        let a = self.forward_exponents();
        let b = other.forward_exponents();
        std::array::from_fn(|i| a[i] * b[i] == 1.0 && (a[i] != 1.0 || b[i] != 1.0))
    }

    /// A lost clamp is only expressible as a leading RGB range.
    pub(crate) fn can_combine_with(&self, other: &Self) -> bool {
        match self.lost_clamps(other) {
            [false, false, false, false] | [true, true, true, false] => true,
            _ => false,
        }
    }

    /// `pow(max(0, pow(max(0, x), a)), b) = pow(max(0, x), a * b)`.
    ///
    /// Where `a * b` is 1 the clamp is kept as a `[0, inf)` range in front
    /// of the fused exponent.
    pub(crate) fn combine_with(&self, other: &Self) -> OpResult<Vec<OpData>> {
        if !self.can_combine_with(other) {
            return Err(OpError::param(
                OpType::Exponent,
                "fused exponent would drop a per-channel clamp",
            ));
        }
        let a = self.forward_exponents();
        let b = other.forward_exponents();
        let combined = Self::new(std::array::from_fn(|i| a[i] * b[i]));
        if self.lost_clamps(other)[0] {
            let clamp = RangeOpData::new(Some(0.0), None, Some(0.0), None);
            Ok(vec![OpData::Range(clamp), OpData::Exponent(combined)])
        } else {
            Ok(vec![OpData::Exponent(combined)])
        }
    }

    pub(crate) fn inverse(&self) -> Self {
        Self {
            exponent: self.exponent,
            direction: self.direction.inverse(),
        }
    }

    pub(crate) fn validate(&self) -> OpResult<()> {
        if self.exponent.iter().any(|e| !e.is_finite() || *e == 0.0) {
            return Err(OpError::param(
                OpType::Exponent,
                "exponents must be finite and non-zero",
            ));
        }
        Ok(())
    }

    pub(crate) fn apply(&self, rgba: &mut [f32; 4]) {
        let exps = self.forward_exponents();
        for (v, e) in rgba.iter_mut().zip(exps) {
            if e != 1.0 {
                *v = v.max(0.0).powf(e as f32);
            }
        }
    }

    pub(crate) fn describe(&self) -> String {
        format!("{} exponent={:?}", self.direction.as_str(), self.exponent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combine_multiplies_forward_exponents() {
        let a = ExponentOpData::uniform(2.0);
        let b = ExponentOpData::uniform(3.0).with_direction(TransformDirection::Inverse);
        let out = a.combine_with(&b).unwrap();
        match &out[0] {
            OpData::Exponent(e) => {
                assert!((e.exponent[0] - 2.0 / 3.0).abs() < 1e-12);
                assert_eq!(e.exponent[3], 1.0);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn cancelling_pair_keeps_clamp() {
        let a = ExponentOpData::uniform(2.0);
        let b = ExponentOpData::uniform(0.5);
        assert!(a.can_combine_with(&b));
        let out = a.combine_with(&b).unwrap();
        assert_eq!(out.len(), 2);
        assert!(matches!(out[0], OpData::Range(_)));
        assert!(out[1].is_no_op());

        for v in [-0.5f32, 0.0, 0.3, 2.0] {
            let mut expected = [v, v, v, 1.0];
            a.apply(&mut expected);
            b.apply(&mut expected);
            let mut got = [v, v, v, 1.0];
            for op in &out {
                op.apply(&mut got);
            }
            for c in 0..4 {
                assert!((expected[c] - got[c]).abs() < 1e-6, "{v}: {expected:?} vs {got:?}");
            }
        }
    }

    #[test]
    fn partial_clamp_loss_is_not_combined() {
        let a = ExponentOpData::new([2.0, 1.0, 1.0, 1.0]);
        let b = ExponentOpData::new([0.5, 1.0, 1.0, 1.0]);
        assert!(!a.can_combine_with(&b));
        assert!(a.combine_with(&b).is_err());

        let alpha = ExponentOpData::new([1.0, 1.0, 1.0, 2.0]);
        assert!(!alpha.can_combine_with(&alpha.inverse()));
        assert!(a.can_combine_with(&a));
    }

    #[test]
    fn negatives_clamp_unless_unit() {
        let op = ExponentOpData::uniform(2.0);
        let mut px = [-0.5, 0.5, 2.0, -1.0];
        op.apply(&mut px);
        assert_eq!(px, [0.0, 0.25, 4.0, -1.0]);
    }

    #[test]
    fn zero_exponent_is_invalid() {
        assert!(ExponentOpData::uniform(0.0).validate().is_err());
    }
}
