//! Error types for operator construction, validation and optimization.

use thiserror::Error;
use vfx_core::BitDepth;

use crate::op::OpType;

/// Result type for operator chain operations.
pub type OpResult<T> = Result<T, OpError>;

/// Errors that can occur while building, validating or optimizing ops.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OpError {
    /// An op that mixes channels was found inside a run classified as
    /// separable. The optimizer cannot continue safely.
    #[error("Non-separable op: {op_type} reports channel crosstalk inside a separable prefix")]
    NonSeparableOp {
        /// Type of the offending op.
        op_type: OpType,
    },

    /// Invalid parameter on an op.
    #[error("invalid {op_type} parameter: {reason}")]
    InvalidParameter {
        /// Op type being built or validated.
        op_type: OpType,
        /// Description of what's wrong.
        reason: String,
    },

    /// Matrix cannot be inverted.
    #[error("matrix is singular and cannot be inverted")]
    SingularMatrix,

    /// Malformed LUT data.
    #[error("invalid {op_type} data: {reason}")]
    InvalidLut {
        /// `Lut1D` or `Lut3D`.
        op_type: OpType,
        /// Description of what's wrong.
        reason: String,
    },

    /// Bit depth cannot be used to build a lookup domain.
    #[error("bit depth {depth} cannot be tabulated as a lookup domain")]
    UnsupportedBitDepth {
        /// Offending bit depth.
        depth: BitDepth,
    },
}

impl OpError {
    pub(crate) fn param(op_type: OpType, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            op_type,
            reason: reason.into(),
        }
    }

    pub(crate) fn lut(op_type: OpType, reason: impl Into<String>) -> Self {
        Self::InvalidLut {
            op_type,
            reason: reason.into(),
        }
    }
}

/// Text that is not a preset name, an integer or a list of flag names.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid optimization flags: {0:?}")]
pub struct ParseFlagsError(pub String);
