//! Baking a leading run of separable ops into one 1D LUT.
//!
//! When integer or half-float pixels come in, a run of per-channel ops at
//! the head of the chain can be replaced by a lookup table with one entry
//! per possible input code value.

use vfx_core::BitDepth;

use crate::error::{OpError, OpResult};
use crate::op::{Op, OpType};
use crate::opdata::{Lut1DOpData, OpData, half_ramp, identity_ramp};
use crate::opvec::OpVec;

/// Length of the separable run at the head of `ops` worth baking.
///
/// Returns 0 when the run is a single forward 1D LUT, or when it holds
/// only matrices and ranges.
pub fn find_separable_prefix(ops: &OpVec) -> OpResult<usize> {
    let len = ops
        .iter()
        .take_while(|op| !op.has_channel_crosstalk() && !op.is_dynamic())
        .count();

    if len == 1 && matches!(ops[0].data(), OpData::Lut1D(lut) if lut.direction.is_forward()) {
        return Ok(0);
    }

    let mut expensive = 0;
    for op in ops.iter().take(len) {
        if op.has_channel_crosstalk() {
            return Err(OpError::NonSeparableOp {
                op_type: op.op_type(),
            });
        }
        if !matches!(op.op_type(), OpType::Matrix | OpType::Range) {
            expensive += 1;
        }
    }

    Ok(if expensive == 0 { 0 } else { len })
}

/// Replaces the separable prefix with a forward 1D LUT sampled for
/// `in_depth`. Returns the number of ops replaced.
///
/// 32-bit and unknown input depths are left alone.
pub fn optimize_separable_prefix(ops: &mut OpVec, in_depth: BitDepth) -> OpResult<usize> {
    if ops.is_empty() || in_depth.is_32bit() || in_depth.is_unknown() {
        return Ok(0);
    }

    let len = find_separable_prefix(ops)?;
    if len == 0 {
        return Ok(0);
    }

    let half_domain = in_depth == BitDepth::F16;
    let domain = if half_domain {
        half_ramp()
    } else {
        let size = in_depth
            .lut_domain_size()
            .ok_or(OpError::UnsupportedBitDepth { depth: in_depth })?;
        identity_ramp(size)
    };

    let prefix: OpVec = ops.iter().take(len).map(|op| Op::clone(op)).collect();
    let mut channels = [
        Vec::with_capacity(domain.len()),
        Vec::with_capacity(domain.len()),
        Vec::with_capacity(domain.len()),
    ];
    for &x in &domain {
        let mut rgba = [x, x, x, 1.0];
        prefix.apply_rgba(&mut rgba);
        for (c, channel) in channels.iter_mut().enumerate() {
            channel.push(rgba[c]);
        }
    }

    let lut = Lut1DOpData::from_channels(channels).with_half_domain(half_domain);
    ops.splice(0..len, [Op::new(lut).into_rc()]);
    tracing::debug!(len, depth = %in_depth, entries = domain.len(), "baked separable prefix");
    Ok(len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opdata::{ExponentOpData, Lut3DOpData, MatrixOpData, RangeOpData};
    use crate::op::TransformDirection;

    fn vec_of(ops: Vec<Op>) -> OpVec {
        ops.into_iter().collect()
    }

    #[test]
    fn prefix_stops_at_crosstalk() {
        let ops = vec_of(vec![
            Op::new(ExponentOpData::uniform(2.2)),
            Op::new(RangeOpData::clamp(Some(0.0), Some(1.0))),
            Op::new(Lut3DOpData::identity(5)),
            Op::new(ExponentOpData::uniform(0.5)),
        ]);
        assert_eq!(find_separable_prefix(&ops).unwrap(), 2);
    }

    #[test]
    fn single_forward_lut_is_left_alone() {
        let lut = Lut1DOpData::from_fn(16, |x| x * x);
        let ops = vec_of(vec![Op::new(lut.clone())]);
        assert_eq!(find_separable_prefix(&ops).unwrap(), 0);

        let ops = vec_of(vec![Op::new(lut.with_direction(TransformDirection::Inverse))]);
        assert_eq!(find_separable_prefix(&ops).unwrap(), 1);
    }

    #[test]
    fn cheap_ops_alone_are_not_baked() {
        let ops = vec_of(vec![
            Op::new(MatrixOpData::scale([2.0, 2.0, 2.0, 1.0])),
            Op::new(RangeOpData::clamp(Some(0.0), Some(1.0))),
        ]);
        assert_eq!(find_separable_prefix(&ops).unwrap(), 0);
    }

    #[test]
    fn float_depths_skip_baking() {
        let mut ops = vec_of(vec![Op::new(ExponentOpData::uniform(2.0))]);
        assert_eq!(optimize_separable_prefix(&mut ops, BitDepth::F32).unwrap(), 0);
        assert_eq!(optimize_separable_prefix(&mut ops, BitDepth::U32).unwrap(), 0);
        assert_eq!(optimize_separable_prefix(&mut ops, BitDepth::Unknown).unwrap(), 0);
        assert_eq!(ops[0].op_type(), OpType::Exponent);
    }

    #[test]
    fn u8_prefix_becomes_256_entry_lut() {
        let mut ops = vec_of(vec![
            Op::new(ExponentOpData::uniform(2.0)),
            Op::new(Lut3DOpData::identity(3)),
        ]);
        assert_eq!(optimize_separable_prefix(&mut ops, BitDepth::U8).unwrap(), 1);
        assert_eq!(ops.len(), 2);
        match ops[0].data() {
            OpData::Lut1D(lut) => {
                assert_eq!(lut.len(), 256);
                assert!(!lut.half_domain);
                assert!(lut.direction.is_forward());
                assert_eq!(lut.channels[0][255], 1.0);
                assert!((lut.channels[1][128] - (128.0f32 / 255.0).powi(2)).abs() < 1e-6);
            }
            other => panic!("expected Lut1D, got {other:?}"),
        }
        assert_eq!(ops[1].op_type(), OpType::Lut3D);
    }

    #[test]
    fn f16_prefix_uses_half_domain() {
        let mut ops = vec_of(vec![Op::new(ExponentOpData::uniform(2.0))]);
        assert_eq!(optimize_separable_prefix(&mut ops, BitDepth::F16).unwrap(), 1);
        match ops[0].data() {
            OpData::Lut1D(lut) => {
                assert!(lut.half_domain);
                assert_eq!(lut.len(), 65536);
                // 0x3C00 is 1.0 in half.
                assert_eq!(lut.channels[2][0x3C00], 1.0);
                assert_eq!(lut.channels[2][0x4000], 4.0);
            }
            other => panic!("expected Lut1D, got {other:?}"),
        }
    }
}
