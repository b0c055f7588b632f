//! Processor front-end over an op chain.
//!
//! A [`Processor`] owns a chain and evaluates it on pixels. Optimizing
//! returns a new processor; the ops are shared with the original until the
//! optimizer rewrites them, so the original stays untouched.
//!
//! # Example
//!
//! ```
//! use vfx_core::BitDepth;
//! use vfx_opchain::{MatrixOpData, Op, OpVec, OptimizationLevel, Processor};
//!
//! let mut ops = OpVec::new();
//! ops.push(Op::new(MatrixOpData::scale([2.0, 2.0, 2.0, 1.0])));
//! ops.push(Op::new(MatrixOpData::scale([0.5, 0.5, 0.5, 1.0])));
//!
//! let proc = Processor::new(ops);
//! let fast = proc.optimized(BitDepth::F32, BitDepth::F32, OptimizationLevel::Lossless.flags())?;
//! assert!(fast.is_no_op());
//! assert_eq!(proc.num_ops(), 2);
//! # Ok::<(), vfx_opchain::OpError>(())
//! ```

use serde::{Deserialize, Serialize};
use tracing::trace;
use vfx_core::BitDepth;

use crate::error::OpResult;
use crate::flags::OptimizationFlags;
use crate::optimizer::{OptimizeReport, optimize_op_vec};
use crate::opvec::OpVec;

/// Optimization level for processors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizationLevel {
    /// No optimization.
    None,
    /// Lossless optimization only (identity removal, inverse pairs,
    /// matrix/range/exponent/gamma combination).
    #[default]
    Lossless,
    /// Good quality (also combines 1D and 3D LUTs).
    Good,
    /// Best quality that still bakes 1D LUTs.
    Best,
    /// Draft quality (faster, less accurate).
    Draft,
}

impl OptimizationLevel {
    /// Flags for this level.
    pub const fn flags(self) -> OptimizationFlags {
        match self {
            Self::None => OptimizationFlags::NONE,
            Self::Lossless => OptimizationFlags::LOSSLESS,
            Self::Good => OptimizationFlags::GOOD,
            Self::Best => OptimizationFlags::VERY_GOOD,
            Self::Draft => OptimizationFlags::DRAFT,
        }
    }
}

impl From<OptimizationLevel> for OptimizationFlags {
    fn from(level: OptimizationLevel) -> Self {
        level.flags()
    }
}

/// Everything the optimizer needs besides the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerSettings {
    /// Enabled optimizations.
    pub flags: OptimizationFlags,
    /// Pixel format entering the chain.
    pub input_bit_depth: BitDepth,
    /// Pixel format leaving the chain.
    pub output_bit_depth: BitDepth,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            flags: OptimizationFlags::DEFAULT,
            input_bit_depth: BitDepth::F32,
            output_bit_depth: BitDepth::F32,
        }
    }
}

impl OptimizerSettings {
    /// Settings with the flags replaced by `OCIO_OPTIMIZATION_FLAGS` when set.
    pub fn with_env_override(self) -> Self {
        Self {
            flags: OptimizationFlags::from_env_or(self.flags),
            ..self
        }
    }
}

/// Compiled op chain ready for pixel application.
#[derive(Debug, Clone, Default)]
pub struct Processor {
    ops: OpVec,
    /// Input bit depth hint.
    input_bit_depth: BitDepth,
    /// Output bit depth hint.
    output_bit_depth: BitDepth,
}

impl Processor {
    /// Wraps a chain, with float boundaries.
    pub fn new(ops: OpVec) -> Self {
        Self {
            ops,
            input_bit_depth: BitDepth::F32,
            output_bit_depth: BitDepth::F32,
        }
    }

    /// Returns an optimized processor for the given boundary depths.
    pub fn optimized(
        &self,
        input_bit_depth: BitDepth,
        output_bit_depth: BitDepth,
        flags: OptimizationFlags,
    ) -> OpResult<Self> {
        self.optimized_with(&OptimizerSettings {
            flags,
            input_bit_depth,
            output_bit_depth,
        })
        .map(|(proc, _)| proc)
    }

    /// Returns an optimized processor and what the optimizer did.
    pub fn optimized_with(&self, settings: &OptimizerSettings) -> OpResult<(Self, OptimizeReport)> {
        let mut ops = self.ops.clone();
        let report = optimize_op_vec(
            &mut ops,
            settings.input_bit_depth,
            settings.output_bit_depth,
            settings.flags,
        )?;
        trace!(before = self.ops.len(), after = ops.len(), "Processor::optimized");
        let proc = Self {
            ops,
            input_bit_depth: settings.input_bit_depth,
            output_bit_depth: settings.output_bit_depth,
        };
        Ok((proc, report))
    }

    /// Applies the chain to RGB pixels in-place.
    pub fn apply_rgb(&self, pixels: &mut [[f32; 3]]) {
        self.ops.apply_rgb(pixels);
    }

    /// Applies the chain to RGBA pixels in-place.
    pub fn apply_rgba(&self, pixels: &mut [[f32; 4]]) {
        self.ops.apply_rgba_slice(pixels);
    }

    /// Returns the number of operations.
    #[inline]
    pub fn num_ops(&self) -> usize {
        self.ops.len()
    }

    /// True if the processor leaves every pixel unchanged.
    pub fn is_no_op(&self) -> bool {
        self.ops.is_no_op()
    }

    /// The op chain.
    #[inline]
    pub fn ops(&self) -> &OpVec {
        &self.ops
    }

    /// Returns input bit depth hint.
    #[inline]
    pub fn input_bit_depth(&self) -> BitDepth {
        self.input_bit_depth
    }

    /// Returns output bit depth hint.
    #[inline]
    pub fn output_bit_depth(&self) -> BitDepth {
        self.output_bit_depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::Op;
    use crate::opdata::{GammaOpData, GammaStyle, MatrixOpData, RangeOpData};

    fn sample() -> OpVec {
        let mut ops = OpVec::new();
        ops.push(Op::new(MatrixOpData::scale([0.5, 0.5, 0.5, 1.0])));
        ops.push(Op::new(GammaOpData::basic(GammaStyle::Basic, 2.2)));
        ops.push(Op::new(MatrixOpData::scale([2.0, 2.0, 2.0, 1.0])));
        ops.push(Op::new(RangeOpData::clamp(Some(0.0), Some(1.0))));
        ops
    }

    #[test]
    fn optimizing_keeps_original() {
        let proc = Processor::new(sample());
        let opt = proc
            .optimized(BitDepth::F32, BitDepth::U8, OptimizationFlags::DEFAULT)
            .unwrap();
        assert_eq!(proc.num_ops(), 4);
        // Trailing clamp dropped for the integer output.
        assert_eq!(opt.num_ops(), 3);
        assert_eq!(opt.output_bit_depth(), BitDepth::U8);
    }

    #[test]
    fn optimized_matches_original() {
        let proc = Processor::new(sample());
        let opt = proc
            .optimized(BitDepth::F32, BitDepth::F32, OptimizationLevel::Draft.flags())
            .unwrap();
        let mut a = [[0.1f32, 0.4, 0.9], [0.0, 0.25, 1.0]];
        let mut b = a;
        proc.apply_rgb(&mut a);
        opt.apply_rgb(&mut b);
        for (pa, pb) in a.iter().zip(&b) {
            for c in 0..3 {
                assert!((pa[c] - pb[c]).abs() < 1e-6, "{pa:?} vs {pb:?}");
            }
        }
    }

    #[test]
    fn levels_map_to_presets() {
        assert_eq!(OptimizationLevel::default().flags(), OptimizationFlags::LOSSLESS);
        assert_eq!(OptimizationFlags::from(OptimizationLevel::None), OptimizationFlags::NONE);
        assert!(OptimizationLevel::Good.flags().contains(OptimizationFlags::COMP_LUT3D));
        assert!(!OptimizationLevel::Best.flags().contains(OptimizationFlags::COMP_LUT3D));
    }
}
