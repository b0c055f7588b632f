//! Rewrite rules run by the optimizer.
//!
//! The pair rules walk the chain with a cursor. After a pair at `i, i+1`
//! is rewritten the cursor steps back to `i - 1`, so a nested run such as
//! `A, B, B', A'` collapses in a single call.

use crate::error::OpResult;
use crate::flags::OptimizationFlags;
use crate::op::{Op, OpType};
use crate::opdata::OpData;
use crate::opvec::OpVec;

use super::Pass;

/// Deletes structural placeholder ops. Returns how many were removed.
pub fn remove_no_op_types(ops: &mut OpVec) -> usize {
    let before = ops.len();
    ops.retain(|op| op.op_type() != OpType::NoOp);
    before - ops.len()
}

/// Freezes every dynamic op at its current values.
///
/// Shared ops are copied first, so other chains holding them are left alone.
pub fn remove_dynamic_properties(ops: &mut OpVec) -> usize {
    let mut count = 0;
    for i in 0..ops.len() {
        if ops[i].is_dynamic() {
            ops.make_mut(i).remove_dynamic_properties();
            count += 1;
        }
    }
    count
}

fn is_identity_range(op: &Op) -> bool {
    matches!(op.data(), OpData::Range(r) if r.is_identity())
}

/// Removes the run of identity ranges at the head of the chain.
pub fn remove_leading_clamp_identity(ops: &mut OpVec) -> usize {
    let n = ops.iter().take_while(|op| is_identity_range(op)).count();
    ops.erase_range(0..n);
    n
}

/// Removes the run of identity ranges at the tail of the chain.
pub fn remove_trailing_clamp_identity(ops: &mut OpVec) -> usize {
    let n = ops.iter().rev().take_while(|op| is_identity_range(op)).count();
    let len = ops.len();
    ops.erase_range(len - n..len);
    n
}

/// Deletes ops that leave every value unchanged. Needs `IDENTITY`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveNoOps;

impl Pass for RemoveNoOps {
    fn name(&self) -> &'static str {
        "remove_no_ops"
    }

    fn run(&self, ops: &mut OpVec, flags: OptimizationFlags) -> OpResult<usize> {
        if !flags.contains(OptimizationFlags::IDENTITY) {
            return Ok(0);
        }
        let before = ops.len();
        ops.retain(|op| !op.is_no_op());
        Ok(before - ops.len())
    }
}

/// Swaps identity ops for their cheaper replacement.
///
/// Ranges are left in place. Gammas follow `IDENTITY_GAMMA`, everything
/// else follows `IDENTITY`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplaceIdentityOps;

impl Pass for ReplaceIdentityOps {
    fn name(&self) -> &'static str {
        "replace_identity_ops"
    }

    fn run(&self, ops: &mut OpVec, flags: OptimizationFlags) -> OpResult<usize> {
        let opt_identity = flags.contains(OptimizationFlags::IDENTITY);
        let opt_gamma = flags.contains(OptimizationFlags::IDENTITY_GAMMA);
        if !opt_identity && !opt_gamma {
            return Ok(0);
        }

        let mut count = 0;
        for i in 0..ops.len() {
            let enabled = match ops[i].op_type() {
                OpType::Range => false,
                OpType::Gamma => opt_gamma,
                _ => opt_identity,
            };
            if enabled && ops[i].is_identity() {
                let replacement = ops[i].identity_replacement();
                ops.set(i, replacement);
                count += 1;
            }
        }
        Ok(count)
    }
}

/// Cancels adjacent ops where the second undoes the first.
///
/// When the pair still clamps, it becomes the first op's identity
/// replacement instead of disappearing.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveInverseOps;

impl Pass for RemoveInverseOps {
    fn name(&self) -> &'static str {
        "remove_inverse_ops"
    }

    fn run(&self, ops: &mut OpVec, flags: OptimizationFlags) -> OpResult<usize> {
        let mut count = 0;
        let mut i = 0;
        while i + 1 < ops.len() {
            let (op1, op2) = (&ops[i], &ops[i + 1]);
            let op_type = op1.op_type();
            if op_type != op2.op_type()
                || !flags.is_pair_inverse_enabled(op_type)
                || !op1.is_inverse(op2)
            {
                i += 1;
                continue;
            }

            let replacement = op1.identity_replacement();
            if replacement.is_no_op() {
                ops.erase_range(i..i + 2);
                i = i.saturating_sub(1);
            } else {
                ops.splice(i..i + 2, [replacement]);
                i += 1;
            }
            count += 1;
        }
        Ok(count)
    }
}

/// Fuses adjacent ops into zero or more cheaper ops.
#[derive(Debug, Clone, Copy, Default)]
pub struct CombineOps;

impl Pass for CombineOps {
    fn name(&self) -> &'static str {
        "combine_ops"
    }

    fn run(&self, ops: &mut OpVec, flags: OptimizationFlags) -> OpResult<usize> {
        let mut count = 0;
        let mut i = 0;
        while i + 1 < ops.len() {
            let (op1, op2) = (&ops[i], &ops[i + 1]);
            if !flags.is_combine_enabled(op1.op_type()) || !op1.can_combine_with(op2) {
                i += 1;
                continue;
            }

            let combined = op1.combine_with(op2)?;
            ops.splice(i..i + 2, combined);
            i = i.saturating_sub(1);
            count += 1;
        }
        Ok(count)
    }
}
