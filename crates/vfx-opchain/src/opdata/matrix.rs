//! Matrix op: `out = M * in + offset` on RGBA.

use vfx_math::MatrixOffset;

use crate::error::{OpError, OpResult};
use crate::op::TransformDirection;

use super::OpData;

/// 4x4 matrix with offset, stored in double precision.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixOpData {
    /// Matrix and offset, as authored (before direction is applied).
    pub matrix: MatrixOffset,
    /// Direction.
    pub direction: TransformDirection,
}

impl MatrixOpData {
    /// Creates a forward matrix op.
    pub fn new(matrix: MatrixOffset) -> Self {
        Self {
            matrix,
            direction: TransformDirection::Forward,
        }
    }

    /// Identity matrix op.
    pub fn identity() -> Self {
        Self::new(MatrixOffset::IDENTITY)
    }

    /// Per-channel scale (alpha scale included).
    pub fn scale(rgba: [f64; 4]) -> Self {
        Self::new(MatrixOffset::from_diagonal(rgba))
    }

    /// Per-channel scale and offset.
    pub fn scale_offset(scale: [f64; 4], offset: [f64; 4]) -> Self {
        Self::new(MatrixOffset::scale_offset(scale, offset))
    }

    /// Sets the direction.
    pub fn with_direction(mut self, direction: TransformDirection) -> Self {
        self.direction = direction;
        self
    }

    /// The transform actually applied, with the direction folded in.
    pub fn effective(&self) -> OpResult<MatrixOffset> {
        match self.direction {
            TransformDirection::Forward => Ok(self.matrix),
            TransformDirection::Inverse => self.matrix.inverse().ok_or(OpError::SingularMatrix),
        }
    }

    pub(crate) fn is_identity(&self) -> bool {
        self.matrix.is_identity()
    }

    pub(crate) fn has_channel_crosstalk(&self) -> bool {
        !self.matrix.is_diagonal()
    }

    pub(crate) fn is_inverse(&self, other: &Self) -> bool {
        self.direction != other.direction && self.matrix == other.matrix
    }

    /// An inverse of a singular matrix has nothing to compose; it is left in
    /// the chain for `validate` to report.
    pub(crate) fn can_combine_with(&self, other: &Self) -> bool {
        self.effective().is_ok() && other.effective().is_ok()
    }

    pub(crate) fn combine_with(&self, other: &Self) -> OpResult<Vec<OpData>> {
        let combined = self.effective()?.then(&other.effective()?);
        if combined.is_identity() {
            return Ok(Vec::new());
        }
        Ok(vec![OpData::Matrix(Self::new(combined))])
    }

    pub(crate) fn inverse(&self) -> Self {
        Self {
            matrix: self.matrix,
            direction: self.direction.inverse(),
        }
    }

    pub(crate) fn validate(&self) -> OpResult<()> {
        if !self.matrix.is_finite() {
            return Err(OpError::param(
                crate::op::OpType::Matrix,
                "matrix and offset values must be finite",
            ));
        }
        self.effective().map(|_| ())
    }

    /// The inverse of a singular matrix is undefined and yields NaN.
    pub(crate) fn apply(&self, rgba: &mut [f32; 4]) {
        *rgba = match self.effective() {
            Ok(m) => m.apply(*rgba),
            Err(_) => [f32::NAN; 4],
        };
    }

    pub(crate) fn describe(&self) -> String {
        let m = &self.matrix.m;
        format!(
            "{} rgb=[{} {} {}; {} {} {}; {} {} {}] offset={:?}",
            self.direction.as_str(),
            m[0],
            m[1],
            m[2],
            m[4],
            m[5],
            m[6],
            m[8],
            m[9],
            m[10],
            self.matrix.offset
        )
    }
}

impl Default for MatrixOpData {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverse_direction_undoes_forward() {
        let fwd = MatrixOpData::scale_offset([2.0, 4.0, 0.5, 1.0], [0.1, 0.0, -0.2, 0.0]);
        let inv = fwd.inverse();
        assert!(fwd.is_inverse(&inv));

        let combined = fwd.combine_with(&inv).unwrap();
        assert!(combined.is_empty());
    }

    #[test]
    fn off_diagonal_is_crosstalk() {
        let mut m = MatrixOffset::IDENTITY;
        assert!(!MatrixOpData::new(m).has_channel_crosstalk());
        m.m[1] = 0.25;
        assert!(MatrixOpData::new(m).has_channel_crosstalk());
    }

    #[test]
    fn singular_inverse_fails_validation() {
        let op = MatrixOpData::scale([1.0, 0.0, 1.0, 1.0]);
        assert!(op.validate().is_ok());
        assert_eq!(op.inverse().validate(), Err(OpError::SingularMatrix));
    }

    #[test]
    fn singular_inverse_is_not_combined() {
        let fwd = MatrixOpData::scale([1.0, 0.0, 1.0, 1.0]);
        let inv = fwd.inverse();
        assert!(fwd.can_combine_with(&fwd));
        assert!(!fwd.can_combine_with(&inv));
        assert!(!inv.can_combine_with(&fwd));

        let mut px = [0.5f32, 0.5, 0.5, 1.0];
        inv.apply(&mut px);
        assert!(px.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn small_scale_inverse_applies() {
        let fwd = MatrixOpData::scale([1e-5, 1e-5, 1e-5, 1.0]);
        let inv = fwd.inverse();
        assert!(inv.validate().is_ok());

        let mut px = [0.5f32, 0.25, 1.0, 1.0];
        fwd.apply(&mut px);
        inv.apply(&mut px);
        assert!((px[0] - 0.5).abs() < 1e-6);
        assert!((px[1] - 0.25).abs() < 1e-6);
        assert!((px[2] - 1.0).abs() < 1e-6);

        assert!(fwd.combine_with(&inv).unwrap().is_empty());
    }
}
