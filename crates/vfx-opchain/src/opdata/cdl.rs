//! ASC CDL op: slope, offset, power and saturation.
//!
//! ```text
//! out = (in * slope + offset) ^ power
//! ```
//!
//! followed by a saturation around Rec.709 luma. The v1.2 style clamps to
//! `[0, 1]` after SOP and after saturation; the no-clamp style mirrors the
//! power for negative values instead.

use crate::error::{OpError, OpResult};
use crate::op::{OpType, TransformDirection};

use super::{MatrixOpData, OpData, RangeOpData};

/// Rec.709 luminance weights.
const LUMA: [f32; 3] = [0.2126, 0.7152, 0.0722];

/// CDL evaluation style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CdlStyle {
    /// ASC CDL v1.2, clamping to `[0, 1]`.
    #[default]
    V1_2,
    /// No clamping, negative values mirrored through the power.
    NoClamp,
}

/// CDL op parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CdlOpData {
    /// Slope per RGB channel.
    pub slope: [f64; 3],
    /// Offset per RGB channel.
    pub offset: [f64; 3],
    /// Power per RGB channel.
    pub power: [f64; 3],
    /// Saturation (1 = unchanged).
    pub saturation: f64,
    /// Style.
    pub style: CdlStyle,
    /// Direction.
    pub direction: TransformDirection,
}

impl Default for CdlOpData {
    fn default() -> Self {
        Self {
            slope: [1.0; 3],
            offset: [0.0; 3],
            power: [1.0; 3],
            saturation: 1.0,
            style: CdlStyle::V1_2,
            direction: TransformDirection::Forward,
        }
    }
}

impl CdlOpData {
    /// Creates a forward v1.2 CDL.
    pub fn new(slope: [f64; 3], offset: [f64; 3], power: [f64; 3], saturation: f64) -> Self {
        Self {
            slope,
            offset,
            power,
            saturation,
            ..Self::default()
        }
    }

    /// Sets the style.
    pub fn with_style(mut self, style: CdlStyle) -> Self {
        self.style = style;
        self
    }

    /// Sets the direction.
    pub fn with_direction(mut self, direction: TransformDirection) -> Self {
        self.direction = direction;
        self
    }

    pub(crate) fn is_identity(&self) -> bool {
        self.slope == [1.0; 3]
            && self.offset == [0.0; 3]
            && self.power == [1.0; 3]
            && self.saturation == 1.0
    }

    pub(crate) fn is_no_op(&self) -> bool {
        self.is_identity() && self.style == CdlStyle::NoClamp
    }

    pub(crate) fn identity_replacement(&self) -> OpData {
        match self.style {
            CdlStyle::V1_2 => OpData::Range(RangeOpData::clamp(Some(0.0), Some(1.0))),
            CdlStyle::NoClamp => OpData::Matrix(MatrixOpData::identity()),
        }
    }

    pub(crate) fn has_channel_crosstalk(&self) -> bool {
        self.saturation != 1.0
    }

    pub(crate) fn is_inverse(&self, other: &Self) -> bool {
        self.direction != other.direction
            && self.style == other.style
            && self.slope == other.slope
            && self.offset == other.offset
            && self.power == other.power
            && self.saturation == other.saturation
    }

    pub(crate) fn inverse(&self) -> Self {
        Self {
            direction: self.direction.inverse(),
            ..self.clone()
        }
    }

    pub(crate) fn validate(&self) -> OpResult<()> {
        let all = self.slope.iter().chain(&self.offset).chain(&self.power);
        if all.chain(std::iter::once(&self.saturation)).any(|v| !v.is_finite()) {
            return Err(OpError::param(OpType::Cdl, "values must be finite"));
        }
        if self.slope.iter().any(|s| *s < 0.0) {
            return Err(OpError::param(OpType::Cdl, "slope cannot be negative"));
        }
        if self.power.iter().any(|p| *p <= 0.0) {
            return Err(OpError::param(OpType::Cdl, "power must be positive"));
        }
        if self.saturation < 0.0 {
            return Err(OpError::param(OpType::Cdl, "saturation cannot be negative"));
        }
        if !self.direction.is_forward()
            && (self.slope.iter().any(|s| *s == 0.0) || self.saturation == 0.0)
        {
            return Err(OpError::param(
                OpType::Cdl,
                "inverse needs non-zero slope and saturation",
            ));
        }
        Ok(())
    }

    pub(crate) fn apply(&self, rgba: &mut [f32; 4]) {
        let clamp = self.style == CdlStyle::V1_2;
        let mut rgb = [rgba[0], rgba[1], rgba[2]];
        match self.direction {
            TransformDirection::Forward => {
                for c in 0..3 {
                    let v = rgb[c] * self.slope[c] as f32 + self.offset[c] as f32;
                    rgb[c] = if clamp {
                        v.clamp(0.0, 1.0).powf(self.power[c] as f32)
                    } else {
                        mirror_pow(v, self.power[c] as f32)
                    };
                }
                rgb = saturate(rgb, self.saturation as f32);
                if clamp {
                    rgb = rgb.map(|v| v.clamp(0.0, 1.0));
                }
            }
            TransformDirection::Inverse => {
                if clamp {
                    rgb = rgb.map(|v| v.clamp(0.0, 1.0));
                }
                rgb = saturate(rgb, 1.0 / self.saturation as f32);
                for c in 0..3 {
                    let v = if clamp { rgb[c].clamp(0.0, 1.0) } else { rgb[c] };
                    let v = mirror_pow(v, 1.0 / self.power[c] as f32);
                    rgb[c] = (v - self.offset[c] as f32) / self.slope[c] as f32;
                }
            }
        }
        rgba[..3].copy_from_slice(&rgb);
    }

    pub(crate) fn describe(&self) -> String {
        format!(
            "{} {:?} slope={:?} offset={:?} power={:?} sat={}",
            self.direction.as_str(),
            self.style,
            self.slope,
            self.offset,
            self.power,
            self.saturation
        )
    }
}

fn mirror_pow(v: f32, p: f32) -> f32 {
    if v >= 0.0 { v.powf(p) } else { -(-v).powf(p) }
}

fn saturate(rgb: [f32; 3], sat: f32) -> [f32; 3] {
    if sat == 1.0 {
        return rgb;
    }
    let lum = rgb[0] * LUMA[0] + rgb[1] * LUMA[1] + rgb[2] * LUMA[2];
    rgb.map(|v| lum + (v - lum) * sat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_style_decides_replacement() {
        let clamping = CdlOpData::default();
        assert!(clamping.is_identity());
        assert!(!clamping.is_no_op());
        assert!(matches!(clamping.identity_replacement(), OpData::Range(_)));

        let free = CdlOpData::default().with_style(CdlStyle::NoClamp);
        assert!(free.is_no_op());
    }

    #[test]
    fn saturation_is_crosstalk() {
        let cdl = CdlOpData::new([1.0; 3], [0.0; 3], [1.0; 3], 0.8);
        assert!(cdl.has_channel_crosstalk());
        assert!(!CdlOpData::default().has_channel_crosstalk());
    }

    #[test]
    fn no_clamp_round_trip() {
        let fwd = CdlOpData::new([1.2, 0.9, 1.1], [0.01, -0.02, 0.0], [1.1, 0.95, 1.0], 0.9)
            .with_style(CdlStyle::NoClamp);
        let inv = fwd.inverse();
        inv.validate().unwrap();
        let mut px = [0.3, 0.5, 0.7, 1.0];
        fwd.apply(&mut px);
        inv.apply(&mut px);
        assert!((px[0] - 0.3).abs() < 1e-5);
        assert!((px[1] - 0.5).abs() < 1e-5);
        assert!((px[2] - 0.7).abs() < 1e-5);
    }
}
