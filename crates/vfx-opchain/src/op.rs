//! Operator instances and the shared handles chains hold.
//!
//! An [`Op`] pairs an [`OpData`] payload with [`FormatMetadata`]. Chains
//! store [`OpRcPtr`] handles; rewriting an entry goes through
//! [`Arc::make_mut`], so another chain sharing the same handle keeps seeing
//! the original op.

use std::fmt;
use std::sync::Arc;

use crate::error::OpResult;
use crate::opdata::OpData;

/// Shared, copy-on-write handle to an op.
pub type OpRcPtr = Arc<Op>;

/// Direction in which an op is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransformDirection {
    /// Apply the op as defined.
    #[default]
    Forward,
    /// Apply the inverse of the op.
    Inverse,
}

impl TransformDirection {
    /// Returns the opposite direction.
    #[inline]
    pub const fn inverse(self) -> Self {
        match self {
            Self::Forward => Self::Inverse,
            Self::Inverse => Self::Forward,
        }
    }

    /// Whether this is [`TransformDirection::Forward`].
    #[inline]
    pub const fn is_forward(self) -> bool {
        matches!(self, Self::Forward)
    }

    /// Short lowercase name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Inverse => "inverse",
        }
    }
}

/// Type tag of an op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpType {
    /// Structural placeholder, removed before optimization.
    NoOp,
    /// 4x4 matrix with offset.
    Matrix,
    /// Affine remap with optional clamping.
    Range,
    /// Per-channel power.
    Exponent,
    /// Parametric gamma curve.
    Gamma,
    /// Parametric logarithm.
    Log,
    /// Per-channel 1D lookup table.
    Lut1D,
    /// 3D lookup table.
    Lut3D,
    /// ASC CDL.
    Cdl,
    /// Viewing exposure/contrast.
    ExposureContrast,
    /// Hard-coded color science function.
    FixedFunction,
}

impl OpType {
    /// Name used in logs and errors.
    pub const fn name(self) -> &'static str {
        match self {
            Self::NoOp => "NoOp",
            Self::Matrix => "Matrix",
            Self::Range => "Range",
            Self::Exponent => "Exponent",
            Self::Gamma => "Gamma",
            Self::Log => "Log",
            Self::Lut1D => "Lut1D",
            Self::Lut3D => "Lut3D",
            Self::Cdl => "CDL",
            Self::ExposureContrast => "ExposureContrast",
            Self::FixedFunction => "FixedFunction",
        }
    }
}

impl fmt::Display for OpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Name and id carried from the file an op was read from.
///
/// Only used for debug output. It never affects op algebra.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatMetadata {
    /// Human-readable name.
    pub name: String,
    /// Unique id within the source document.
    pub id: String,
}

impl FormatMetadata {
    /// Creates metadata with a name and id.
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }

    /// True when neither name nor id is set.
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.id.is_empty()
    }
}

/// A single color operator.
#[derive(Debug, Clone, PartialEq)]
pub struct Op {
    data: OpData,
    metadata: FormatMetadata,
}

impl Op {
    /// Creates an op from its payload.
    pub fn new(data: impl Into<OpData>) -> Self {
        Self {
            data: data.into(),
            metadata: FormatMetadata::default(),
        }
    }

    /// Creates the structural no-op placeholder.
    pub fn no_op() -> Self {
        Self::new(OpData::NoOp)
    }

    /// Attaches metadata.
    pub fn with_metadata(mut self, metadata: FormatMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Wraps the op in a shared handle.
    #[inline]
    pub fn into_rc(self) -> OpRcPtr {
        Arc::new(self)
    }

    /// Op payload.
    #[inline]
    pub fn data(&self) -> &OpData {
        &self.data
    }

    /// Mutable op payload.
    #[inline]
    pub fn data_mut(&mut self) -> &mut OpData {
        &mut self.data
    }

    /// Metadata.
    #[inline]
    pub fn metadata(&self) -> &FormatMetadata {
        &self.metadata
    }

    /// Type tag.
    #[inline]
    pub fn op_type(&self) -> OpType {
        self.data.op_type()
    }

    /// True if applying the op leaves every value unchanged.
    pub fn is_no_op(&self) -> bool {
        self.data.is_no_op()
    }

    /// True if the op is an identity, possibly apart from clamping.
    pub fn is_identity(&self) -> bool {
        self.data.is_identity()
    }

    /// The cheapest op equivalent to this one when it is an identity.
    pub fn identity_replacement(&self) -> OpRcPtr {
        Op::new(self.data.identity_replacement()).into_rc()
    }

    /// True if `other` undoes this op exactly.
    pub fn is_inverse(&self, other: &Op) -> bool {
        self.data.is_inverse(&other.data)
    }

    /// True if this op can be fused with `other` (which follows it).
    pub fn can_combine_with(&self, other: &Op) -> bool {
        self.data.can_combine_with(&other.data)
    }

    /// Fuses this op with `other`, returning zero or more ops.
    ///
    /// An empty result means the pair collapsed to a no-op.
    pub fn combine_with(&self, other: &Op) -> OpResult<Vec<OpRcPtr>> {
        Ok(self
            .data
            .combine_with(&other.data)?
            .into_iter()
            .map(|data| Op::new(data).into_rc())
            .collect())
    }

    /// True if an output channel depends on more than one input channel.
    pub fn has_channel_crosstalk(&self) -> bool {
        self.data.has_channel_crosstalk()
    }

    /// True if a parameter may change after the chain is built.
    pub fn is_dynamic(&self) -> bool {
        self.data.is_dynamic()
    }

    /// Freezes dynamic parameters at their current values.
    pub fn remove_dynamic_properties(&mut self) {
        self.data.remove_dynamic_properties();
    }

    /// Returns the op applied in the opposite direction.
    pub fn inverse(&self) -> Op {
        Self {
            data: self.data.inverse(),
            metadata: self.metadata.clone(),
        }
    }

    /// Checks the op parameters.
    pub fn validate(&self) -> OpResult<()> {
        self.data.validate()
    }

    /// Evaluates the op on one RGBA value.
    #[inline]
    pub fn apply(&self, rgba: &mut [f32; 4]) {
        self.data.apply(rgba);
    }

    /// One-line human-readable description.
    pub fn serialize(&self) -> String {
        if self.metadata.is_empty() {
            format!("<{}> {}", self.op_type(), self.data.describe())
        } else {
            format!(
                "<{} name={:?} id={:?}> {}",
                self.op_type(),
                self.metadata.name,
                self.metadata.id,
                self.data.describe()
            )
        }
    }
}
