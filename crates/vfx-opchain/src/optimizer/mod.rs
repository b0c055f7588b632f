//! Op chain optimizer.
//!
//! The optimizer rewrites a chain in place into a shorter chain that gives
//! the same results (within the loss allowed by the flags):
//!
//! 1. Structural placeholders are always removed.
//! 2. Dynamic ops are frozen when `NO_DYNAMIC_PROPERTIES` is set.
//! 3. The rewrite passes run in rounds until a round changes nothing or
//!    [`MAX_OPTIMIZATION_PASSES`] rounds have made changes.
//! 4. Identity clamps at an integer input or output boundary are trimmed.
//! 5. A leading separable run is baked into a 1D LUT.
//!
//! # Example
//!
//! ```
//! use vfx_core::BitDepth;
//! use vfx_opchain::{MatrixOpData, Op, OpVec, OptimizationFlags, optimize_op_vec};
//!
//! let mut ops = OpVec::new();
//! ops.push(Op::new(MatrixOpData::scale([2.0, 2.0, 2.0, 1.0])));
//! ops.push(Op::new(MatrixOpData::scale([0.5, 0.5, 0.5, 1.0])));
//!
//! let report =
//!     optimize_op_vec(&mut ops, BitDepth::F32, BitDepth::F32, OptimizationFlags::DEFAULT)?;
//! assert!(ops.is_empty());
//! assert_eq!(report.original_len, 2);
//! # Ok::<(), vfx_opchain::OpError>(())
//! ```

mod rules;
mod separable;

pub use rules::{
    CombineOps, RemoveInverseOps, RemoveNoOps, ReplaceIdentityOps, remove_dynamic_properties,
    remove_leading_clamp_identity, remove_no_op_types, remove_trailing_clamp_identity,
};
pub use separable::{find_separable_prefix, optimize_separable_prefix};

use tracing::{Level, debug};
use vfx_core::BitDepth;

use crate::error::OpResult;
use crate::flags::OptimizationFlags;
use crate::opvec::OpVec;

/// Most rounds of rewrite passes that may make changes.
pub const MAX_OPTIMIZATION_PASSES: usize = 8;

/// A rewrite pass run once per optimization round.
///
/// `run` returns the number of rewrites it made. A round in which every
/// pass returns 0 ends the loop.
pub trait Pass: Send + Sync {
    /// Name used in logs and in [`OptimizeReport::rewrites`].
    fn name(&self) -> &'static str;

    /// Rewrites `ops` in place.
    fn run(&self, ops: &mut OpVec, flags: OptimizationFlags) -> OpResult<usize>;
}

/// What an optimization did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptimizeReport {
    /// Chain length on entry.
    pub original_len: usize,
    /// Chain length on return.
    pub final_len: usize,
    /// Rounds that made at least one rewrite.
    pub passes: usize,
    /// Rewrites per pass name, in pass order.
    pub rewrites: Vec<(&'static str, usize)>,
    /// Leading identity clamps removed.
    pub leading_clamps_removed: usize,
    /// Trailing identity clamps removed.
    pub trailing_clamps_removed: usize,
    /// Ops baked into a 1D LUT.
    pub prefix_ops_baked: usize,
    /// The loop stopped at the round cap rather than at a fixed point.
    pub hit_pass_limit: bool,
}

impl OptimizeReport {
    /// Total rewrites made by the pass called `name`.
    pub fn rewrites_by(&self, name: &str) -> usize {
        self.rewrites
            .iter()
            .filter(|(n, _)| *n == name)
            .map(|(_, count)| count)
            .sum()
    }
}

/// Runs a list of passes to a fixed point, then the boundary steps.
pub struct Optimizer {
    passes: Vec<Box<dyn Pass>>,
    max_passes: usize,
}

impl Default for Optimizer {
    fn default() -> Self {
        Self::with_passes(vec![
            Box::new(RemoveNoOps),
            Box::new(ReplaceIdentityOps),
            Box::new(RemoveInverseOps),
            Box::new(CombineOps),
        ])
    }
}

impl Optimizer {
    /// Optimizer with the standard passes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Optimizer running `passes` in order each round.
    pub fn with_passes(passes: Vec<Box<dyn Pass>>) -> Self {
        Self {
            passes,
            max_passes: MAX_OPTIMIZATION_PASSES,
        }
    }

    /// Optimizes `ops` in place for the given boundary bit depths.
    ///
    /// The only error is an op misreporting its channel crosstalk while the
    /// separable prefix is baked; the chain is still valid in that case.
    pub fn optimize(
        &self,
        ops: &mut OpVec,
        in_depth: BitDepth,
        out_depth: BitDepth,
        flags: OptimizationFlags,
    ) -> OpResult<OptimizeReport> {
        let mut report = OptimizeReport {
            original_len: ops.len(),
            rewrites: self.passes.iter().map(|p| (p.name(), 0)).collect(),
            ..Default::default()
        };
        if ops.is_empty() {
            return Ok(report);
        }

        let debug_enabled = tracing::enabled!(Level::DEBUG);
        if debug_enabled {
            debug!(
                "Optimizing op chain ({in_depth} -> {out_depth}, flags {flags}):\n{}",
                ops.serialize("    ")
            );
        }

        remove_no_op_types(ops);

        if flags.is_empty() {
            report.final_len = ops.len();
            return Ok(report);
        }

        if flags.contains(OptimizationFlags::NO_DYNAMIC_PROPERTIES) {
            remove_dynamic_properties(ops);
        }

        while report.passes < self.max_passes {
            let mut changed = 0;
            for (pass, total) in self.passes.iter().zip(report.rewrites.iter_mut()) {
                let n = pass.run(ops, flags)?;
                total.1 += n;
                changed += n;
            }
            if changed == 0 {
                break;
            }
            report.passes += 1;
        }
        report.hit_pass_limit = report.passes == self.max_passes;

        if !ops.is_empty() {
            if !in_depth.is_float() {
                report.leading_clamps_removed = remove_leading_clamp_identity(ops);
            }
            if !out_depth.is_float() {
                report.trailing_clamps_removed = remove_trailing_clamp_identity(ops);
            }
            if flags.contains(OptimizationFlags::COMP_SEPARABLE_PREFIX) {
                report.prefix_ops_baked = optimize_separable_prefix(ops, in_depth)?;
            }
        }
        report.final_len = ops.len();

        if report.hit_pass_limit {
            debug!(
                passes = report.passes,
                "The max number of passes was reached during optimization. Either the \
                 transform is very complex or some passes undo each other's results."
            );
        }
        if debug_enabled {
            debug!(
                original = report.original_len,
                final_len = report.final_len,
                passes = report.passes,
                rewrites = ?report.rewrites,
                "Optimized op chain:\n{}",
                ops.serialize("    ")
            );
        }
        Ok(report)
    }
}

/// Optimizes `ops` in place with the standard passes.
///
/// `in_bit_depth` and `out_bit_depth` describe the pixel formats at the
/// chain's boundaries: identity clamps are only trimmed next to integer
/// formats, and the separable prefix is only baked for integer and half
/// inputs.
pub fn optimize_op_vec(
    ops: &mut OpVec,
    in_bit_depth: BitDepth,
    out_bit_depth: BitDepth,
    flags: OptimizationFlags,
) -> OpResult<OptimizeReport> {
    Optimizer::default().optimize(ops, in_bit_depth, out_bit_depth, flags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::Op;
    use crate::opdata::{ExponentOpData, MatrixOpData};

    #[test]
    fn empty_chain_is_untouched() {
        let mut ops = OpVec::new();
        let report = optimize_op_vec(
            &mut ops,
            BitDepth::U8,
            BitDepth::U8,
            OptimizationFlags::DRAFT,
        )
        .unwrap();
        assert!(ops.is_empty());
        assert_eq!(report.passes, 0);
        assert!(!report.hit_pass_limit);
    }

    #[test]
    fn none_flags_only_drop_placeholders() {
        let mut ops: OpVec = vec![
            Op::no_op(),
            Op::new(MatrixOpData::identity()),
            Op::new(MatrixOpData::identity()),
        ]
        .into_iter()
        .collect();
        let report = optimize_op_vec(
            &mut ops,
            BitDepth::F32,
            BitDepth::F32,
            OptimizationFlags::NONE,
        )
        .unwrap();
        assert_eq!(ops.len(), 2);
        assert_eq!(report.original_len, 3);
        assert_eq!(report.final_len, 2);
    }

    #[test]
    fn report_counts_rewrites() {
        let mut ops: OpVec = vec![
            Op::new(MatrixOpData::identity()),
            Op::new(ExponentOpData::uniform(2.0)),
            Op::new(ExponentOpData::uniform(3.0)),
        ]
        .into_iter()
        .collect();
        let report = optimize_op_vec(
            &mut ops,
            BitDepth::F32,
            BitDepth::F32,
            OptimizationFlags::LOSSLESS,
        )
        .unwrap();
        assert_eq!(ops.len(), 1);
        assert_eq!(report.rewrites_by("remove_no_ops"), 1);
        assert_eq!(report.rewrites_by("combine_ops"), 1);
        assert_eq!(report.passes, 1);
        assert!(!report.hit_pass_limit);
    }
}
