//! Gamma op: basic power curves and monitor curves (power with a linear
//! toe) on RGBA.

use crate::error::{OpError, OpResult};
use crate::op::{OpType, TransformDirection};

use super::{MatrixOpData, OpData, RangeOpData};

/// How the curve is shaped and how negatives are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GammaStyle {
    /// `pow(max(0, x), g)`.
    #[default]
    Basic,
    /// `sign(x) * pow(|x|, g)`.
    BasicMirror,
    /// Negatives unchanged, positives `pow(x, g)`.
    BasicPassThru,
    /// Power with offset and a linear segment near black.
    MonCurve,
    /// Monitor curve mirrored around zero.
    MonCurveMirror,
}

impl GammaStyle {
    /// Basic power styles (composable).
    pub const fn is_basic(self) -> bool {
        matches!(self, Self::Basic | Self::BasicMirror | Self::BasicPassThru)
    }

    /// Only `Basic` clamps negative values.
    pub const fn clamps(self) -> bool {
        matches!(self, Self::Basic)
    }

    /// Style name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::BasicMirror => "basicMirror",
            Self::BasicPassThru => "basicPassThru",
            Self::MonCurve => "monCurve",
            Self::MonCurveMirror => "monCurveMirror",
        }
    }
}

/// Parameters for one channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GammaParams {
    /// Exponent.
    pub gamma: f64,
    /// Offset (monitor curves only).
    pub offset: f64,
}

impl GammaParams {
    /// Pure power.
    pub const fn power(gamma: f64) -> Self {
        Self { gamma, offset: 0.0 }
    }

    /// Monitor curve.
    pub const fn mon_curve(gamma: f64, offset: f64) -> Self {
        Self { gamma, offset }
    }

    const IDENTITY: Self = Self::power(1.0);
}

/// Gamma op parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct GammaOpData {
    /// Curve style.
    pub style: GammaStyle,
    /// Params for R, G, B, A.
    pub params: [GammaParams; 4],
    /// Direction.
    pub direction: TransformDirection,
}

impl GammaOpData {
    /// Creates a forward gamma op.
    pub fn new(style: GammaStyle, params: [GammaParams; 4]) -> Self {
        Self {
            style,
            params,
            direction: TransformDirection::Forward,
        }
    }

    /// Same basic exponent on RGB, alpha untouched.
    pub fn basic(style: GammaStyle, gamma: f64) -> Self {
        let p = GammaParams::power(gamma);
        Self::new(style, [p, p, p, GammaParams::IDENTITY])
    }

    /// Same monitor curve on RGB, alpha untouched.
    pub fn mon_curve(style: GammaStyle, gamma: f64, offset: f64) -> Self {
        let p = GammaParams::mon_curve(gamma, offset);
        Self::new(style, [p, p, p, GammaParams::IDENTITY])
    }

    /// Sets the direction.
    pub fn with_direction(mut self, direction: TransformDirection) -> Self {
        self.direction = direction;
        self
    }

    pub(crate) fn is_identity(&self) -> bool {
        self.params.iter().all(|p| *p == GammaParams::IDENTITY)
    }

    pub(crate) fn is_no_op(&self) -> bool {
        self.is_identity() && !self.style.clamps()
    }

    /// A clamping identity becomes a `[0, inf)` range on RGB. Ranges never
    /// touch alpha, so a negative alpha the gamma would have clamped now
    /// passes through.
    pub(crate) fn identity_replacement(&self) -> OpData {
        if self.style.clamps() {
            OpData::Range(RangeOpData::new(Some(0.0), None, Some(0.0), None))
        } else {
            OpData::Matrix(MatrixOpData::identity())
        }
    }

    pub(crate) fn is_inverse(&self, other: &Self) -> bool {
        self.style == other.style
            && self.direction != other.direction
            && self.params == other.params
    }

    pub(crate) fn can_combine_with(&self, other: &Self) -> bool {
        self.style.is_basic() && self.style == other.style
    }

    /// Basic curves compose by multiplying their forward exponents.
    pub(crate) fn combine_with(&self, other: &Self) -> OpResult<Vec<OpData>> {
        if !self.can_combine_with(other) {
            return Err(OpError::param(
                OpType::Gamma,
                format!(
                    "cannot combine {} with {}",
                    self.style.as_str(),
                    other.style.as_str()
                ),
            ));
        }
        let a = self.forward_exponents();
        let b = other.forward_exponents();
        let params = std::array::from_fn(|i| GammaParams::power(a[i] * b[i]));
        Ok(vec![OpData::Gamma(Self::new(self.style, params))])
    }

    fn forward_exponents(&self) -> [f64; 4] {
        self.params.map(|p| match self.direction {
            TransformDirection::Forward => p.gamma,
            TransformDirection::Inverse => 1.0 / p.gamma,
        })
    }

    pub(crate) fn inverse(&self) -> Self {
        Self {
            direction: self.direction.inverse(),
            ..self.clone()
        }
    }

    pub(crate) fn validate(&self) -> OpResult<()> {
        for p in &self.params {
            if !p.gamma.is_finite() || p.gamma <= 0.0 {
                return Err(OpError::param(OpType::Gamma, "gamma must be positive"));
            }
            if self.style.is_basic() {
                if p.offset != 0.0 {
                    return Err(OpError::param(OpType::Gamma, "basic styles take no offset"));
                }
            } else {
                if p.gamma < 1.0 {
                    return Err(OpError::param(
                        OpType::Gamma,
                        "monitor curve gamma must be at least 1",
                    ));
                }
                if !(0.0..=0.9).contains(&p.offset) {
                    return Err(OpError::param(
                        OpType::Gamma,
                        "monitor curve offset must be within [0, 0.9]",
                    ));
                }
                if p.gamma == 1.0 && p.offset != 0.0 {
                    return Err(OpError::param(
                        OpType::Gamma,
                        "monitor curve with gamma 1 needs a zero offset",
                    ));
                }
            }
        }
        Ok(())
    }

    pub(crate) fn apply(&self, rgba: &mut [f32; 4]) {
        let forward = self.direction.is_forward();
        for (v, p) in rgba.iter_mut().zip(self.params.iter()) {
            *v = match self.style {
                GammaStyle::Basic => {
                    let g = if forward { p.gamma } else { 1.0 / p.gamma };
                    v.max(0.0).powf(g as f32)
                }
                GammaStyle::BasicMirror => {
                    let g = if forward { p.gamma } else { 1.0 / p.gamma };
                    v.signum() * v.abs().powf(g as f32)
                }
                GammaStyle::BasicPassThru => {
                    let g = if forward { p.gamma } else { 1.0 / p.gamma };
                    if *v < 0.0 { *v } else { v.powf(g as f32) }
                }
                GammaStyle::MonCurve => mon_curve(*v as f64, p, forward) as f32,
                GammaStyle::MonCurveMirror => {
                    let m = mon_curve(v.abs() as f64, p, forward) as f32;
                    if *v < 0.0 { -m } else { m }
                }
            };
        }
    }

    pub(crate) fn describe(&self) -> String {
        let g: Vec<String> = self
            .params
            .iter()
            .map(|p| {
                if self.style.is_basic() {
                    p.gamma.to_string()
                } else {
                    format!("{}/{}", p.gamma, p.offset)
                }
            })
            .collect();
        format!("{} {} params=[{}]", self.direction.as_str(), self.style.as_str(), g.join(", "))
    }
}

/// Monitor curve.
///
/// Forward maps encoded values to linear:
/// `((x + offset) / (1 + offset))^gamma` above the break point, a line
/// through the origin below it. Inverse maps linear back to encoded.
fn mon_curve(x: f64, p: &GammaParams, forward: bool) -> f64 {
    let (g, off) = (p.gamma, p.offset);
    if g == 1.0 && off == 0.0 {
        return x;
    }
    let brk = off / (g - 1.0);
    let slope = (off * g / ((g - 1.0) * (1.0 + off))).powf(g) / brk;
    if forward {
        if x > brk {
            ((x + off) / (1.0 + off)).powf(g)
        } else {
            x * slope
        }
    } else {
        let lin_brk = brk * slope;
        if x > lin_brk {
            (1.0 + off) * x.powf(1.0 / g) - off
        } else {
            x / slope
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_identity_clamps() {
        let op = GammaOpData::basic(GammaStyle::Basic, 1.0);
        assert!(op.is_identity());
        assert!(!op.is_no_op());
        assert!(matches!(op.identity_replacement(), OpData::Range(_)));

        let mirror = GammaOpData::basic(GammaStyle::BasicMirror, 1.0);
        assert!(mirror.is_no_op());
    }

    #[test]
    fn clamp_replacement_leaves_alpha() {
        let op = GammaOpData::basic(GammaStyle::Basic, 1.0);
        let mut gamma_px = [-0.5f32, 0.5, 2.0, -0.25];
        let mut range_px = gamma_px;
        op.apply(&mut gamma_px);
        op.identity_replacement().apply(&mut range_px);
        assert_eq!(gamma_px[..3], range_px[..3]);
        assert_eq!(gamma_px[3], 0.0);
        assert_eq!(range_px[3], -0.25);
    }

    #[test]
    fn srgb_mon_curve_round_trips() {
        let fwd = GammaOpData::mon_curve(GammaStyle::MonCurve, 2.4, 0.055);
        fwd.validate().unwrap();
        let inv = fwd.inverse();
        for v in [0.0f32, 0.01, 0.2, 0.5, 1.0] {
            let mut px = [v, v, v, 1.0];
            fwd.apply(&mut px);
            inv.apply(&mut px);
            assert!((px[0] - v).abs() < 1e-5, "{v} -> {}", px[0]);
        }
    }

    #[test]
    fn srgb_mon_curve_toe_slope() {
        let fwd = GammaOpData::mon_curve(GammaStyle::MonCurve, 2.4, 0.055);
        let mut px = [0.01f32, 0.0, 0.0, 1.0];
        fwd.apply(&mut px);
        assert!((px[0] - 0.01 / 12.92).abs() < 1e-5);
    }

    #[test]
    fn combine_needs_same_basic_style() {
        let a = GammaOpData::basic(GammaStyle::Basic, 2.2);
        let b = GammaOpData::basic(GammaStyle::BasicMirror, 2.2);
        assert!(!a.can_combine_with(&b));
        assert!(a.combine_with(&b).is_err());

        let mc = GammaOpData::mon_curve(GammaStyle::MonCurve, 2.4, 0.055);
        assert!(!mc.can_combine_with(&mc));
    }
}
