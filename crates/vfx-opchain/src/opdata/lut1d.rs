//! Lut1D op: per-channel 1D lookup table.
//!
//! A regular table samples `[0, 1]` uniformly and clamps its input to that
//! interval. A half-domain table has one entry per 16-bit half-float bit
//! pattern (65536 entries) and covers the full half range, so it does not
//! clamp.
//!
//! The optional DW3 hue adjust restores the hue of the input after the
//! per-channel lookup, which couples the channels.

use half::f16;
use vfx_math::{inverse_lerp, lerp, sample_linear};

use crate::error::{OpError, OpResult};
use crate::op::{OpType, TransformDirection};

use super::{MatrixOpData, OpData, RangeOpData};

/// Entry count of a half-domain table.
pub const HALF_DOMAIN_SIZE: usize = 65536;

/// Hue handling after the per-channel lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HueAdjust {
    /// Plain per-channel lookup.
    #[default]
    None,
    /// Restore the input hue (DW3 algorithm).
    Dw3,
}

/// Lut1D op parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Lut1DOpData {
    /// Tables for R, G, B; all the same length.
    pub channels: [Vec<f32>; 3],
    /// Indexed by half-float bit pattern instead of a uniform `[0, 1]` ramp.
    pub half_domain: bool,
    /// Hue handling.
    pub hue_adjust: HueAdjust,
    /// Direction.
    pub direction: TransformDirection,
}

impl Lut1DOpData {
    /// Identity table of `size` entries over `[0, 1]`.
    pub fn identity(size: usize) -> Self {
        let ramp = identity_ramp(size);
        Self::from_channels([ramp.clone(), ramp.clone(), ramp])
    }

    /// Identity half-domain table.
    pub fn identity_half_domain() -> Self {
        let ramp = half_ramp();
        Self {
            half_domain: true,
            ..Self::from_channels([ramp.clone(), ramp.clone(), ramp])
        }
    }

    /// Table from per-channel entries over `[0, 1]`.
    pub fn from_channels(channels: [Vec<f32>; 3]) -> Self {
        Self {
            channels,
            half_domain: false,
            hue_adjust: HueAdjust::None,
            direction: TransformDirection::Forward,
        }
    }

    /// Same table on all channels.
    pub fn from_values(values: Vec<f32>) -> Self {
        Self::from_channels([values.clone(), values.clone(), values])
    }

    /// Builds a table by sampling `f` at each entry's input value.
    pub fn from_fn(size: usize, f: impl Fn(f32) -> f32) -> Self {
        Self::from_values(identity_ramp(size).into_iter().map(f).collect())
    }

    /// Marks the table as half-domain.
    pub fn with_half_domain(mut self, half_domain: bool) -> Self {
        self.half_domain = half_domain;
        self
    }

    /// Sets hue handling.
    pub fn with_hue_adjust(mut self, hue_adjust: HueAdjust) -> Self {
        self.hue_adjust = hue_adjust;
        self
    }

    /// Sets the direction.
    pub fn with_direction(mut self, direction: TransformDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Number of entries per channel.
    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    /// True when the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Input value of entry `i`.
    fn domain_value(&self, i: usize) -> f32 {
        if self.half_domain {
            f16::from_bits(i as u16).to_f32()
        } else {
            i as f32 / (self.len() - 1) as f32
        }
    }

    pub(crate) fn is_identity(&self) -> bool {
        let n = self.len();
        if n < 2 {
            return false;
        }
        (0..n).all(|i| {
            let expected = self.domain_value(i);
            self.channels.iter().all(|ch| same_value(ch[i], expected))
        })
    }

    pub(crate) fn is_no_op(&self) -> bool {
        self.half_domain && self.is_identity()
    }

    pub(crate) fn identity_replacement(&self) -> OpData {
        if self.half_domain {
            OpData::Matrix(MatrixOpData::identity())
        } else {
            OpData::Range(RangeOpData::clamp(Some(0.0), Some(1.0)))
        }
    }

    pub(crate) fn has_channel_crosstalk(&self) -> bool {
        self.hue_adjust != HueAdjust::None
    }

    pub(crate) fn is_inverse(&self, other: &Self) -> bool {
        self.direction != other.direction
            && self.half_domain == other.half_domain
            && self.hue_adjust == other.hue_adjust
            && self.channels == other.channels
    }

    pub(crate) fn can_combine_with(&self, other: &Self) -> bool {
        self.direction.is_forward()
            && other.direction.is_forward()
            && self.hue_adjust == HueAdjust::None
            && other.hue_adjust == HueAdjust::None
    }

    /// Pushes every entry of `self` through `other`, keeping the domain of
    /// `self`.
    pub(crate) fn combine_with(&self, other: &Self) -> OpResult<Vec<OpData>> {
        if !self.can_combine_with(other) {
            return Err(OpError::lut(
                OpType::Lut1D,
                "only forward tables without hue adjust can be combined",
            ));
        }
        let mut channels = self.channels.clone();
        for i in 0..self.len() {
            let mut px = [channels[0][i], channels[1][i], channels[2][i], 1.0];
            other.apply(&mut px);
            for (c, ch) in channels.iter_mut().enumerate() {
                ch[i] = px[c];
            }
        }
        Ok(vec![OpData::Lut1D(Self {
            channels,
            half_domain: self.half_domain,
            hue_adjust: HueAdjust::None,
            direction: TransformDirection::Forward,
        })])
    }

    pub(crate) fn inverse(&self) -> Self {
        Self {
            direction: self.direction.inverse(),
            ..self.clone()
        }
    }

    pub(crate) fn validate(&self) -> OpResult<()> {
        let n = self.len();
        if self.channels.iter().any(|ch| ch.len() != n) {
            return Err(OpError::lut(OpType::Lut1D, "channels must have the same length"));
        }
        if n < 2 {
            return Err(OpError::lut(OpType::Lut1D, "table needs at least 2 entries"));
        }
        if self.half_domain && n != HALF_DOMAIN_SIZE {
            return Err(OpError::lut(
                OpType::Lut1D,
                format!("half-domain table needs {HALF_DOMAIN_SIZE} entries, got {n}"),
            ));
        }
        Ok(())
    }

    pub(crate) fn apply(&self, rgba: &mut [f32; 4]) {
        if self.len() < 2 {
            return;
        }
        let input = [rgba[0], rgba[1], rgba[2]];
        for (c, v) in rgba.iter_mut().take(3).enumerate() {
            *v = if self.direction.is_forward() {
                self.lookup(c, *v)
            } else {
                self.reverse_lookup(c, *v)
            };
        }
        if self.hue_adjust == HueAdjust::Dw3 {
            restore_hue(input, rgba);
        }
    }

    fn lookup(&self, c: usize, x: f32) -> f32 {
        let table = &self.channels[c];
        if !self.half_domain {
            return sample_linear(table, x);
        }
        let h = f16::from_f32(x);
        let hv = h.to_f32();
        if hv == x || x.is_nan() {
            return table[h.to_bits() as usize];
        }
        let (lo, hi) = if hv > x {
            (half_next_down(h.to_bits()), h.to_bits())
        } else {
            (h.to_bits(), half_next_up(h.to_bits()))
        };
        let lo_v = f16::from_bits(lo).to_f32();
        let hi_v = f16::from_bits(hi).to_f32();
        if !lo_v.is_finite() {
            return table[hi as usize];
        }
        if !hi_v.is_finite() {
            return table[lo as usize];
        }
        lerp(table[lo as usize], table[hi as usize], inverse_lerp(lo_v, hi_v, x))
    }

    /// Finds the input that maps to `y`, assuming a monotonic table.
    fn reverse_lookup(&self, c: usize, y: f32) -> f32 {
        let table = &self.channels[c];
        if self.half_domain {
            let count = HALF_FINITE_NEG + HALF_FINITE_POS;
            invert_monotonic(count, |p| table[half_position(p)], |p| domain_at(half_position(p)), y)
        } else {
            let n = table.len();
            invert_monotonic(n, |i| table[i], |i| i as f32 / (n - 1) as f32, y)
        }
    }

    pub(crate) fn describe(&self) -> String {
        format!(
            "{} size={}{}{}",
            self.direction.as_str(),
            self.len(),
            if self.half_domain { " halfDomain" } else { "" },
            if self.hue_adjust == HueAdjust::Dw3 { " hueAdjust=dw3" } else { "" }
        )
    }
}

/// Uniform ramp of `size` entries over `[0, 1]`.
pub(crate) fn identity_ramp(size: usize) -> Vec<f32> {
    if size < 2 {
        return vec![0.0; size];
    }
    let max = (size - 1) as f32;
    (0..size).map(|i| i as f32 / max).collect()
}

/// Value of every half-float bit pattern, in bit order.
pub(crate) fn half_ramp() -> Vec<f32> {
    (0..HALF_DOMAIN_SIZE).map(domain_at).collect()
}

fn domain_at(bits: usize) -> f32 {
    f16::from_bits(bits as u16).to_f32()
}

fn same_value(a: f32, b: f32) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

// Finite negative halves 0xFBFF..=0x8001 (negative zero skipped), then
// finite non-negative halves 0x0000..=0x7BFF, in ascending value order.
const HALF_FINITE_NEG: usize = 0x7BFF;
const HALF_FINITE_POS: usize = 0x7C00;

fn half_position(p: usize) -> usize {
    if p < HALF_FINITE_NEG {
        0xFBFF - p
    } else {
        p - HALF_FINITE_NEG
    }
}

fn half_next_up(bits: u16) -> u16 {
    match bits {
        0x8000 => 0x0001,
        b if b & 0x8000 == 0 => b + 1,
        b => b - 1,
    }
}

fn half_next_down(bits: u16) -> u16 {
    match bits {
        0x0000 => 0x8001,
        b if b & 0x8000 == 0 => b - 1,
        b => b + 1,
    }
}

/// Binary search in a monotonic sequence of `n` samples, interpolating
/// linearly between the bracketing domain values. Out-of-range values clamp
/// to the ends.
fn invert_monotonic(
    n: usize,
    value_at: impl Fn(usize) -> f32,
    domain: impl Fn(usize) -> f32,
    y: f32,
) -> f32 {
    let first = value_at(0);
    let last = value_at(n - 1);
    let increasing = last >= first;
    let key = |i: usize| if increasing { value_at(i) } else { -value_at(i) };
    let target = if increasing { y } else { -y };

    if target.is_nan() || target <= key(0) {
        return domain(0);
    }
    if target >= key(n - 1) {
        return domain(n - 1);
    }

    let (mut lo, mut hi) = (0usize, n - 1);
    while hi - lo > 1 {
        let mid = (lo + hi) / 2;
        if key(mid) <= target {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    let (k0, k1) = (key(lo), key(hi));
    if k1 == k0 {
        return domain(lo);
    }
    lerp(domain(lo), domain(hi), (target - k0) / (k1 - k0))
}

/// DW3 hue restore: the middle channel keeps its relative position between
/// the new min and max.
fn restore_hue(input: [f32; 3], out: &mut [f32; 4]) {
    let (max_i, mid_i, min_i) = order3(input);
    let span = input[max_i] - input[min_i];
    if span == 0.0 {
        return;
    }
    let hue_factor = (input[mid_i] - input[min_i]) / span;
    out[mid_i] = hue_factor * (out[max_i] - out[min_i]) + out[min_i];
}

fn order3(v: [f32; 3]) -> (usize, usize, usize) {
    let mut idx = [0usize, 1, 2];
    idx.sort_by(|a, b| v[*b].total_cmp(&v[*a]));
    (idx[0], idx[1], idx[2])
}
