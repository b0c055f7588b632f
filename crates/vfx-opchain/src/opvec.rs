//! Ordered operator chains.
//!
//! [`OpVec`] holds shared op handles. Cloning the vector shares the ops;
//! [`OpVec::deep_clone`] copies them. Rewrites go through
//! [`Arc::make_mut`] so a shallow copy never sees the other's edits.

use std::ops::{Index, Range};
use std::sync::Arc;

use crate::error::OpResult;
use crate::op::{Op, OpRcPtr};

/// Ordered sequence of ops. Position `i` runs before `i + 1`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OpVec {
    ops: Vec<OpRcPtr>,
}

impl OpVec {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of ops.
    #[inline]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// True if the chain holds no ops.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Appends an op.
    pub fn push(&mut self, op: impl Into<OpRcPtr>) {
        self.ops.push(op.into());
    }

    /// Inserts an op at `index`.
    pub fn insert(&mut self, index: usize, op: impl Into<OpRcPtr>) {
        self.ops.insert(index, op.into());
    }

    /// Removes the ops in `range`.
    pub fn erase_range(&mut self, range: Range<usize>) {
        self.ops.drain(range);
    }

    /// Replaces the ops in `range` with `replacement`.
    pub fn splice(&mut self, range: Range<usize>, replacement: impl IntoIterator<Item = OpRcPtr>) {
        self.ops.splice(range, replacement);
    }

    /// Removes every op for which `keep` returns false.
    pub fn retain(&mut self, keep: impl FnMut(&OpRcPtr) -> bool) {
        self.ops.retain(keep);
    }

    /// Iterates over the ops in order.
    pub fn iter(&self) -> std::slice::Iter<'_, OpRcPtr> {
        self.ops.iter()
    }

    /// Op handle at `index`.
    pub fn get(&self, index: usize) -> Option<&OpRcPtr> {
        self.ops.get(index)
    }

    /// Replaces the op at `index`.
    pub fn set(&mut self, index: usize, op: OpRcPtr) {
        self.ops[index] = op;
    }

    /// Mutable access to the op at `index`, unsharing it first if needed.
    pub fn make_mut(&mut self, index: usize) -> &mut Op {
        Arc::make_mut(&mut self.ops[index])
    }

    /// Copies every op into a fresh handle.
    pub fn deep_clone(&self) -> Self {
        self.ops.iter().map(|op| Op::clone(op)).collect()
    }

    /// The chain that undoes this one: reversed order, each op inverted.
    pub fn inverse(&self) -> Self {
        self.ops.iter().rev().map(|op| op.inverse()).collect()
    }

    /// True if every op is a no-op.
    pub fn is_no_op(&self) -> bool {
        self.ops.iter().all(|op| op.is_no_op())
    }

    /// True if any op mixes channels.
    pub fn has_channel_crosstalk(&self) -> bool {
        self.ops.iter().any(|op| op.has_channel_crosstalk())
    }

    /// True if any op has a dynamic parameter.
    pub fn is_dynamic(&self) -> bool {
        self.ops.iter().any(|op| op.is_dynamic())
    }

    /// Validates every op.
    pub fn validate(&self) -> OpResult<()> {
        self.ops.iter().try_for_each(|op| op.validate())
    }

    /// Runs one RGBA value through the chain.
    #[inline]
    pub fn apply_rgba(&self, rgba: &mut [f32; 4]) {
        for op in &self.ops {
            op.apply(rgba);
        }
    }

    /// Runs RGBA values through the chain in place.
    pub fn apply_rgba_slice(&self, pixels: &mut [[f32; 4]]) {
        for px in pixels.iter_mut() {
            self.apply_rgba(px);
        }
    }

    /// Runs RGB values through the chain in place, with alpha held at 1.
    pub fn apply_rgb(&self, pixels: &mut [[f32; 3]]) {
        for px in pixels.iter_mut() {
            let mut rgba = [px[0], px[1], px[2], 1.0];
            self.apply_rgba(&mut rgba);
            *px = [rgba[0], rgba[1], rgba[2]];
        }
    }

    /// Multi-line description, one op per line, each prefixed by `indent`.
    pub fn serialize(&self, indent: &str) -> String {
        let mut out = String::new();
        for (i, op) in self.ops.iter().enumerate() {
            out.push_str(&format!("{indent}Op {i}: {}\n", op.serialize()));
        }
        out
    }
}

impl Index<usize> for OpVec {
    type Output = OpRcPtr;

    fn index(&self, index: usize) -> &OpRcPtr {
        &self.ops[index]
    }
}

impl FromIterator<OpRcPtr> for OpVec {
    fn from_iter<I: IntoIterator<Item = OpRcPtr>>(iter: I) -> Self {
        Self {
            ops: iter.into_iter().collect(),
        }
    }
}

impl FromIterator<Op> for OpVec {
    fn from_iter<I: IntoIterator<Item = Op>>(iter: I) -> Self {
        iter.into_iter().map(Op::into_rc).collect()
    }
}

impl From<Vec<OpRcPtr>> for OpVec {
    fn from(ops: Vec<OpRcPtr>) -> Self {
        Self { ops }
    }
}

impl<'a> IntoIterator for &'a OpVec {
    type Item = &'a OpRcPtr;
    type IntoIter = std::slice::Iter<'a, OpRcPtr>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opdata::{ExponentOpData, MatrixOpData, RangeOpData};

    fn chain() -> OpVec {
        let mut ops = OpVec::new();
        ops.push(Op::new(MatrixOpData::scale([2.0, 2.0, 2.0, 1.0])));
        ops.push(Op::new(ExponentOpData::uniform(2.0)));
        ops.push(Op::new(RangeOpData::clamp(Some(0.0), Some(4.0))));
        ops
    }

    #[test]
    fn shallow_clone_is_copy_on_write() {
        let mut a = chain();
        let b = a.clone();
        assert!(Arc::ptr_eq(&a[0], &b[0]));

        *a.make_mut(0) = Op::new(MatrixOpData::identity());
        assert!(!Arc::ptr_eq(&a[0], &b[0]));
        assert!(!b[0].is_identity());
    }

    #[test]
    fn deep_clone_copies_handles() {
        let a = chain();
        let b = a.deep_clone();
        assert_eq!(a, b);
        assert!(!Arc::ptr_eq(&a[1], &b[1]));
    }

    #[test]
    fn inverse_undoes_chain() {
        let mut ops = OpVec::new();
        ops.push(Op::new(MatrixOpData::scale([2.0, 3.0, 4.0, 1.0])));
        ops.push(Op::new(ExponentOpData::uniform(2.0)));
        let inv = ops.inverse();
        assert_eq!(inv.len(), 2);

        let mut px = [0.2, 0.4, 0.6, 1.0];
        ops.apply_rgba(&mut px);
        inv.apply_rgba(&mut px);
        assert!((px[0] - 0.2).abs() < 1e-6);
        assert!((px[1] - 0.4).abs() < 1e-6);
        assert!((px[2] - 0.6).abs() < 1e-6);
    }

    #[test]
    fn splice_and_erase() {
        let mut ops = chain();
        ops.splice(0..2, [Op::no_op().into_rc()]);
        assert_eq!(ops.len(), 2);
        ops.erase_range(0..1);
        assert_eq!(ops.len(), 1);
        assert!(ops.serialize("  ").starts_with("  Op 0: <Range>"));
    }

    #[test]
    fn apply_rgb_runs_every_op() {
        let ops = chain();
        let mut px = [[0.5f32, 1.0, 1.5]];
        ops.apply_rgb(&mut px);
        assert_eq!(px[0], [1.0, 4.0, 4.0]);
    }
}
