//! Op payloads.
//!
//! [`OpData`] is a closed set: every op type the optimizer reasons about is
//! a variant here, and every query the optimizer makes is answered by a
//! `match` over it. Pair queries (`is_inverse`, `can_combine_with`,
//! `combine_with`) only succeed for two ops of the same type.

mod cdl;
mod exponent;
mod exposure_contrast;
mod fixed_function;
mod gamma;
mod log;
mod lut1d;
mod lut3d;
mod matrix;
mod range;

pub use cdl::{CdlOpData, CdlStyle};
pub use exponent::ExponentOpData;
pub use exposure_contrast::{
    ExposureContrastOpData, ExposureContrastStyle, LOG_EXPOSURE_STEP_DEFAULT, LOG_MIDGRAY_DEFAULT,
    MIN_CONTRAST, MIN_PIVOT, VIDEO_OETF_POWER,
};
pub use fixed_function::{FixedFunctionOpData, FixedFunctionStyle};
pub use gamma::{GammaOpData, GammaParams, GammaStyle};
pub use log::{LogOpData, LogParams};
pub use lut1d::{HALF_DOMAIN_SIZE, HueAdjust, Lut1DOpData};
pub use lut3d::{Lut3DInterpolation, Lut3DOpData, MAX_GRID_SIZE};
pub use matrix::MatrixOpData;
pub use range::RangeOpData;

pub(crate) use lut1d::{half_ramp, identity_ramp};

use crate::error::{OpError, OpResult};
use crate::op::OpType;

/// Payload of a single op.
#[derive(Debug, Clone, PartialEq)]
pub enum OpData {
    /// Structural placeholder that never changes a value.
    NoOp,
    /// Matrix with offset.
    Matrix(MatrixOpData),
    /// Range remap and clamp.
    Range(RangeOpData),
    /// Per-channel power.
    Exponent(ExponentOpData),
    /// Gamma curves.
    Gamma(GammaOpData),
    /// Parametric log.
    Log(LogOpData),
    /// Per-channel 1D LUT.
    Lut1D(Lut1DOpData),
    /// 3D LUT.
    Lut3D(Lut3DOpData),
    /// ASC CDL.
    Cdl(CdlOpData),
    /// Exposure/contrast.
    ExposureContrast(ExposureContrastOpData),
    /// Hard-coded function.
    FixedFunction(FixedFunctionOpData),
}

macro_rules! impl_from {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(impl From<$ty> for OpData {
            fn from(data: $ty) -> Self {
                OpData::$variant(data)
            }
        })*
    };
}

impl_from!(
    Matrix(MatrixOpData),
    Range(RangeOpData),
    Exponent(ExponentOpData),
    Gamma(GammaOpData),
    Log(LogOpData),
    Lut1D(Lut1DOpData),
    Lut3D(Lut3DOpData),
    Cdl(CdlOpData),
    ExposureContrast(ExposureContrastOpData),
    FixedFunction(FixedFunctionOpData),
);

impl OpData {
    /// Type tag.
    pub fn op_type(&self) -> OpType {
        match self {
            Self::NoOp => OpType::NoOp,
            Self::Matrix(_) => OpType::Matrix,
            Self::Range(_) => OpType::Range,
            Self::Exponent(_) => OpType::Exponent,
            Self::Gamma(_) => OpType::Gamma,
            Self::Log(_) => OpType::Log,
            Self::Lut1D(_) => OpType::Lut1D,
            Self::Lut3D(_) => OpType::Lut3D,
            Self::Cdl(_) => OpType::Cdl,
            Self::ExposureContrast(_) => OpType::ExposureContrast,
            Self::FixedFunction(_) => OpType::FixedFunction,
        }
    }

    pub(crate) fn is_identity(&self) -> bool {
        match self {
            Self::NoOp => true,
            Self::Matrix(d) => d.is_identity(),
            Self::Range(d) => d.is_identity(),
            Self::Exponent(d) => d.is_identity(),
            Self::Gamma(d) => d.is_identity(),
            Self::Log(_) => false,
            Self::Lut1D(d) => d.is_identity(),
            Self::Lut3D(d) => d.is_identity(),
            Self::Cdl(d) => d.is_identity(),
            Self::ExposureContrast(d) => d.is_identity(),
            Self::FixedFunction(d) => d.is_identity(),
        }
    }

    pub(crate) fn is_no_op(&self) -> bool {
        match self {
            Self::NoOp => true,
            Self::Matrix(d) => d.is_identity(),
            Self::Range(d) => d.is_no_op(),
            Self::Exponent(d) => d.is_identity(),
            Self::Gamma(d) => d.is_no_op(),
            Self::Lut1D(d) => d.is_no_op(),
            Self::Cdl(d) => d.is_no_op(),
            Self::ExposureContrast(d) => d.is_identity(),
            Self::Log(_) | Self::Lut3D(_) | Self::FixedFunction(_) => false,
        }
    }

    pub(crate) fn identity_replacement(&self) -> OpData {
        match self {
            Self::NoOp => Self::NoOp,
            Self::Matrix(_) => Self::Matrix(MatrixOpData::identity()),
            Self::Range(d) => d.identity_replacement(),
            Self::Exponent(d) => d.identity_replacement(),
            Self::Gamma(d) => d.identity_replacement(),
            Self::Log(d) => d.identity_replacement(),
            Self::Lut1D(d) => d.identity_replacement(),
            Self::Lut3D(d) => d.identity_replacement(),
            Self::Cdl(d) => d.identity_replacement(),
            Self::ExposureContrast(d) => d.identity_replacement(),
            Self::FixedFunction(d) => d.identity_replacement(),
        }
    }

    pub(crate) fn is_inverse(&self, other: &OpData) -> bool {
        match (self, other) {
            (Self::NoOp, Self::NoOp) => true,
            (Self::Matrix(a), Self::Matrix(b)) => a.is_inverse(b),
            (Self::Range(a), Self::Range(b)) => a.is_inverse(b),
            (Self::Exponent(a), Self::Exponent(b)) => a.is_inverse(b),
            (Self::Gamma(a), Self::Gamma(b)) => a.is_inverse(b),
            (Self::Log(a), Self::Log(b)) => a.is_inverse(b),
            (Self::Lut1D(a), Self::Lut1D(b)) => a.is_inverse(b),
            (Self::Lut3D(a), Self::Lut3D(b)) => a.is_inverse(b),
            (Self::Cdl(a), Self::Cdl(b)) => a.is_inverse(b),
            (Self::ExposureContrast(a), Self::ExposureContrast(b)) => a.is_inverse(b),
            (Self::FixedFunction(a), Self::FixedFunction(b)) => a.is_inverse(b),
            _ => false,
        }
    }

    pub(crate) fn can_combine_with(&self, other: &OpData) -> bool {
        match (self, other) {
            (Self::Matrix(a), Self::Matrix(b)) => a.can_combine_with(b),
            (Self::Range(_), Self::Range(_)) => true,
            (Self::Exponent(a), Self::Exponent(b)) => a.can_combine_with(b),
            (Self::Gamma(a), Self::Gamma(b)) => a.can_combine_with(b),
            (Self::Lut1D(a), Self::Lut1D(b)) => a.can_combine_with(b),
            (Self::Lut3D(a), Self::Lut3D(b)) => a.can_combine_with(b),
            _ => false,
        }
    }

    /// Fuses two ops. Results that are no-ops are dropped, so an empty
    /// vector means the pair cancelled out.
    pub(crate) fn combine_with(&self, other: &OpData) -> OpResult<Vec<OpData>> {
        let combined = match (self, other) {
            (Self::Matrix(a), Self::Matrix(b)) => a.combine_with(b)?,
            (Self::Range(a), Self::Range(b)) => a.combine_with(b)?,
            (Self::Exponent(a), Self::Exponent(b)) => a.combine_with(b)?,
            (Self::Gamma(a), Self::Gamma(b)) => a.combine_with(b)?,
            (Self::Lut1D(a), Self::Lut1D(b)) => a.combine_with(b)?,
            (Self::Lut3D(a), Self::Lut3D(b)) => a.combine_with(b)?,
            _ => {
                return Err(OpError::param(
                    self.op_type(),
                    format!("cannot combine with {}", other.op_type()),
                ));
            }
        };
        Ok(combined.into_iter().filter(|d| !d.is_no_op()).collect())
    }

    pub(crate) fn has_channel_crosstalk(&self) -> bool {
        match self {
            Self::Matrix(d) => d.has_channel_crosstalk(),
            Self::Lut1D(d) => d.has_channel_crosstalk(),
            Self::Cdl(d) => d.has_channel_crosstalk(),
            Self::Lut3D(_) | Self::FixedFunction(_) => true,
            _ => false,
        }
    }

    pub(crate) fn is_dynamic(&self) -> bool {
        match self {
            Self::ExposureContrast(d) => d.is_dynamic(),
            _ => false,
        }
    }

    pub(crate) fn remove_dynamic_properties(&mut self) {
        if let Self::ExposureContrast(d) = self {
            d.remove_dynamic_properties();
        }
    }

    pub(crate) fn inverse(&self) -> OpData {
        match self {
            Self::NoOp => Self::NoOp,
            Self::Matrix(d) => Self::Matrix(d.inverse()),
            Self::Range(d) => Self::Range(d.inverse()),
            Self::Exponent(d) => Self::Exponent(d.inverse()),
            Self::Gamma(d) => Self::Gamma(d.inverse()),
            Self::Log(d) => Self::Log(d.inverse()),
            Self::Lut1D(d) => Self::Lut1D(d.inverse()),
            Self::Lut3D(d) => Self::Lut3D(d.inverse()),
            Self::Cdl(d) => Self::Cdl(d.inverse()),
            Self::ExposureContrast(d) => Self::ExposureContrast(d.inverse()),
            Self::FixedFunction(d) => Self::FixedFunction(d.inverse()),
        }
    }

    pub(crate) fn validate(&self) -> OpResult<()> {
        match self {
            Self::NoOp => Ok(()),
            Self::Matrix(d) => d.validate(),
            Self::Range(d) => d.validate(),
            Self::Exponent(d) => d.validate(),
            Self::Gamma(d) => d.validate(),
            Self::Log(d) => d.validate(),
            Self::Lut1D(d) => d.validate(),
            Self::Lut3D(d) => d.validate(),
            Self::Cdl(d) => d.validate(),
            Self::ExposureContrast(d) => d.validate(),
            Self::FixedFunction(d) => d.validate(),
        }
    }

    #[inline]
    pub(crate) fn apply(&self, rgba: &mut [f32; 4]) {
        match self {
            Self::NoOp => {}
            Self::Matrix(d) => d.apply(rgba),
            Self::Range(d) => d.apply(rgba),
            Self::Exponent(d) => d.apply(rgba),
            Self::Gamma(d) => d.apply(rgba),
            Self::Log(d) => d.apply(rgba),
            Self::Lut1D(d) => d.apply(rgba),
            Self::Lut3D(d) => d.apply(rgba),
            Self::Cdl(d) => d.apply(rgba),
            Self::ExposureContrast(d) => d.apply(rgba),
            Self::FixedFunction(d) => d.apply(rgba),
        }
    }

    pub(crate) fn describe(&self) -> String {
        match self {
            Self::NoOp => String::new(),
            Self::Matrix(d) => d.describe(),
            Self::Range(d) => d.describe(),
            Self::Exponent(d) => d.describe(),
            Self::Gamma(d) => d.describe(),
            Self::Log(d) => d.describe(),
            Self::Lut1D(d) => d.describe(),
            Self::Lut3D(d) => d.describe(),
            Self::Cdl(d) => d.describe(),
            Self::ExposureContrast(d) => d.describe(),
            Self::FixedFunction(d) => d.describe(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatched_types_never_pair() {
        let m = OpData::from(MatrixOpData::identity());
        let r = OpData::from(RangeOpData::clamp(Some(0.0), Some(1.0)));
        assert!(!m.is_inverse(&r));
        assert!(!m.can_combine_with(&r));
        assert!(m.combine_with(&r).is_err());
    }

    #[test]
    fn combine_drops_no_op_results() {
        let a = OpData::from(MatrixOpData::scale([2.0, 2.0, 2.0, 1.0]));
        let b = OpData::from(MatrixOpData::scale([0.5, 0.5, 0.5, 1.0]));
        assert!(a.combine_with(&b).unwrap().is_empty());
    }

    #[test]
    fn only_exposure_contrast_is_dynamic() {
        let mut ec = OpData::from(ExposureContrastOpData::default().with_dynamic_contrast());
        assert!(ec.is_dynamic());
        ec.remove_dynamic_properties();
        assert!(!ec.is_dynamic());
        assert!(!OpData::from(MatrixOpData::identity()).is_dynamic());
    }

    #[test]
    fn no_op_placeholder() {
        let n = OpData::NoOp;
        assert!(n.is_no_op());
        assert_eq!(n.op_type(), OpType::NoOp);
        assert!(n.is_inverse(&OpData::NoOp));
        let mut px = [0.1, 0.2, 0.3, 0.4];
        n.apply(&mut px);
        assert_eq!(px, [0.1, 0.2, 0.3, 0.4]);
    }
}
