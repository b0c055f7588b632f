//! FixedFunction op: hard-coded color science functions.
//!
//! Every style mixes channels. Only the Rec.2100 surround correction has a
//! parameter, and with gamma 1 it is an identity.

use crate::error::{OpError, OpResult};
use crate::op::{OpType, TransformDirection};

use super::{MatrixOpData, OpData};

/// Fixed function style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FixedFunctionStyle {
    /// ACES red modifier 0.3/0.7.
    AcesRedMod03,
    /// ACES red modifier 1.0.
    AcesRedMod10,
    /// ACES glow 0.3/0.7.
    AcesGlow03,
    /// ACES glow 1.0.
    AcesGlow10,
    /// ACES dark to dim surround 1.0.
    AcesDarkToDim10,
    /// Rec.2100 surround correction (one param: gamma).
    Rec2100Surround,
    /// CIE XYZ to xyY.
    XyzToXyy,
    /// CIE XYZ to u'v'Y.
    XyzToUvy,
    /// CIE XYZ to L*u*v*.
    XyzToLuv,
}

impl FixedFunctionStyle {
    /// Number of params the style takes.
    pub const fn param_count(self) -> usize {
        match self {
            Self::Rec2100Surround => 1,
            _ => 0,
        }
    }
}

/// FixedFunction op parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedFunctionOpData {
    /// Style.
    pub style: FixedFunctionStyle,
    /// Style parameters.
    pub params: Vec<f64>,
    /// Direction.
    pub direction: TransformDirection,
}

impl FixedFunctionOpData {
    /// Creates a forward op.
    pub fn new(style: FixedFunctionStyle, params: Vec<f64>) -> Self {
        Self {
            style,
            params,
            direction: TransformDirection::Forward,
        }
    }

    /// Rec.2100 surround correction.
    pub fn rec2100_surround(gamma: f64) -> Self {
        Self::new(FixedFunctionStyle::Rec2100Surround, vec![gamma])
    }

    /// Sets the direction.
    pub fn with_direction(mut self, direction: TransformDirection) -> Self {
        self.direction = direction;
        self
    }

    pub(crate) fn is_identity(&self) -> bool {
        self.style == FixedFunctionStyle::Rec2100Surround && self.params == [1.0]
    }

    pub(crate) fn identity_replacement(&self) -> OpData {
        OpData::Matrix(MatrixOpData::identity())
    }

    pub(crate) fn is_inverse(&self, other: &Self) -> bool {
        self.style == other.style
            && self.direction != other.direction
            && self.params == other.params
    }

    pub(crate) fn inverse(&self) -> Self {
        Self {
            direction: self.direction.inverse(),
            ..self.clone()
        }
    }

    pub(crate) fn validate(&self) -> OpResult<()> {
        let expected = self.style.param_count();
        if self.params.len() != expected {
            return Err(OpError::param(
                OpType::FixedFunction,
                format!("{:?} takes {expected} params, got {}", self.style, self.params.len()),
            ));
        }
        if self.style == FixedFunctionStyle::Rec2100Surround && !(self.params[0] > 0.0) {
            return Err(OpError::param(OpType::FixedFunction, "surround gamma must be positive"));
        }
        Ok(())
    }

    pub(crate) fn apply(&self, rgba: &mut [f32; 4]) {
        let mut rgb = [rgba[0], rgba[1], rgba[2]];
        let fwd = self.direction.is_forward();
        use FixedFunctionStyle::*;
        match self.style {
            AcesRedMod03 => red_mod(&mut rgb, &RED_MOD_03, fwd),
            AcesRedMod10 => red_mod(&mut rgb, &RED_MOD_10, fwd),
            AcesGlow03 => glow(&mut rgb, &GLOW_03, fwd),
            AcesGlow10 => glow(&mut rgb, &GLOW_10, fwd),
            AcesDarkToDim10 => dark_to_dim(&mut rgb, fwd),
            Rec2100Surround => {
                let gamma = self.params.first().copied().unwrap_or(1.0) as f32;
                rec2100_surround(&mut rgb, gamma, fwd);
            }
            XyzToXyy => rgb = if fwd { xyz_to_xyy(rgb) } else { xyy_to_xyz(rgb) },
            XyzToUvy => rgb = if fwd { xyz_to_uvy(rgb) } else { uvy_to_xyz(rgb) },
            XyzToLuv => rgb = if fwd { xyz_to_luv(rgb) } else { luv_to_xyz(rgb) },
        }
        rgba[..3].copy_from_slice(&rgb);
    }

    pub(crate) fn describe(&self) -> String {
        format!("{} {:?} params={:?}", self.direction.as_str(), self.style, self.params)
    }
}

// ============================================================================
// ACES red modifier
// ============================================================================

struct RedModParams {
    one_minus_scale: f32,
    pivot: f32,
    inv_width: f32,
    noise_limit: f32,
    restore_hue: bool,
}

const RED_MOD_03: RedModParams = RedModParams {
    one_minus_scale: 1.0 - 0.85,
    pivot: 0.03,
    inv_width: 1.9098593171027443,
    noise_limit: 1e-2,
    restore_hue: true,
};

const RED_MOD_10: RedModParams = RedModParams {
    one_minus_scale: 1.0 - 0.82,
    pivot: 0.03,
    inv_width: 1.6976527263135504,
    noise_limit: 1e-2,
    restore_hue: false,
};

const HUE_BSPLINE_M: [[f32; 4]; 4] = [
    [0.25, 0.00, 0.00, 0.00],
    [-0.75, 0.75, 0.75, 0.25],
    [0.75, -1.50, 0.00, 1.00],
    [-0.25, 0.75, -0.75, 0.25],
];

fn calc_sat_weight(rgb: &[f32; 3], noise_limit: f32) -> f32 {
    let min_val = rgb[0].min(rgb[1].min(rgb[2]));
    let max_val = rgb[0].max(rgb[1].max(rgb[2]));
    (max_val.max(1e-10) - min_val.max(1e-10)) / max_val.max(noise_limit)
}

fn calc_hue_weight(rgb: &[f32; 3], inv_width: f32) -> f32 {
    let a = 2.0 * rgb[0] - (rgb[1] + rgb[2]);
    let b = 1.7320508075688772_f32 * (rgb[1] - rgb[2]);
    let knot_coord = b.atan2(a) * inv_width + 2.0;
    let j = knot_coord.floor();
    if (0.0..4.0).contains(&j) {
        let t = knot_coord - j;
        let coefs = &HUE_BSPLINE_M[j as usize];
        coefs[3] + t * (coefs[2] + t * (coefs[1] + t * coefs[0]))
    } else {
        0.0
    }
}

fn red_mod(rgb: &mut [f32; 3], p: &RedModParams, forward: bool) {
    let f_h = calc_hue_weight(rgb, p.inv_width);
    if f_h <= 0.0 {
        return;
    }
    let [red, grn, blu] = *rgb;
    let new_red = if forward {
        let f_s = calc_sat_weight(rgb, p.noise_limit);
        red + f_h * f_s * (p.pivot - red) * p.one_minus_scale
    } else {
        let min_chan = grn.min(blu);
        let a = f_h * p.one_minus_scale - 1.0;
        let b = red - f_h * (p.pivot + min_chan) * p.one_minus_scale;
        let c = f_h * p.pivot * min_chan * p.one_minus_scale;
        (-b - (b * b - 4.0 * a * c).max(0.0).sqrt()) / (2.0 * a)
    };
    if p.restore_hue {
        if grn >= blu {
            let hue_fac = (grn - blu) / (red - blu).max(1e-10);
            rgb[1] = hue_fac * (new_red - blu) + blu;
        } else {
            let hue_fac = (blu - grn) / (red - grn).max(1e-10);
            rgb[2] = hue_fac * (new_red - grn) + grn;
        }
    }
    rgb[0] = new_red;
}

// ============================================================================
// ACES glow
// ============================================================================

struct GlowParams {
    gain: f32,
    mid: f32,
    noise_limit: f32,
}

const GLOW_03: GlowParams = GlowParams {
    gain: 0.075,
    mid: 0.1,
    noise_limit: 1e-2,
};

const GLOW_10: GlowParams = GlowParams {
    gain: 0.05,
    mid: 0.08,
    noise_limit: 1e-2,
};

fn rgb_to_yc(rgb: &[f32; 3]) -> f32 {
    const YC_RADIUS_WEIGHT: f32 = 1.75;
    let [r, g, b] = *rgb;
    let chroma = (b * (b - g) + g * (g - r) + r * (r - b)).max(0.0).sqrt();
    (b + g + r + YC_RADIUS_WEIGHT * chroma) / 3.0
}

fn sigmoid_shaper(sat: f32) -> f32 {
    let x = (sat - 0.4) * 5.0;
    let sign = x.signum();
    let t = (1.0 - 0.5 * sign * x).max(0.0);
    (1.0 + sign * (1.0 - t * t)) * 0.5
}

fn glow(rgb: &mut [f32; 3], p: &GlowParams, forward: bool) {
    let yc = rgb_to_yc(rgb);
    let sat = calc_sat_weight(rgb, p.noise_limit);
    let glow_gain = p.gain * sigmoid_shaper(sat);

    let factor = if forward {
        let out = if yc >= p.mid * 2.0 {
            0.0
        } else if yc <= p.mid * 2.0 / 3.0 {
            glow_gain
        } else {
            glow_gain * (p.mid / yc - 0.5)
        };
        1.0 + out
    } else {
        let out = if yc >= p.mid * 2.0 {
            0.0
        } else if yc <= (1.0 + glow_gain) * p.mid * 2.0 / 3.0 {
            -glow_gain / (1.0 + glow_gain)
        } else {
            glow_gain * (p.mid / yc - 0.5) / (glow_gain * 0.5 - 1.0)
        };
        1.0 + out
    };
    for v in rgb.iter_mut() {
        *v *= factor;
    }
}

// ============================================================================
// Surround corrections
// ============================================================================

const AP1_LUMA: [f32; 3] = [0.27222871678091454, 0.67408176581114831, 0.053689517407937051];
const DARK_TO_DIM_GAMMA: f32 = 0.9811;
const DIM_TO_DARK_GAMMA: f32 = 1.0192640913260627;

fn dark_to_dim(rgb: &mut [f32; 3], forward: bool) {
    const MIN_LUM: f32 = 1e-10;
    let gamma = if forward { DARK_TO_DIM_GAMMA } else { DIM_TO_DARK_GAMMA };
    let y = (AP1_LUMA[0] * rgb[0] + AP1_LUMA[1] * rgb[1] + AP1_LUMA[2] * rgb[2]).max(MIN_LUM);
    let scale = y.powf(gamma - 1.0);
    for v in rgb.iter_mut() {
        *v *= scale;
    }
}

const REC2100_LUMA: [f32; 3] = [0.2627, 0.6780, 0.0593];

fn rec2100_surround(rgb: &mut [f32; 3], gamma: f32, forward: bool) {
    let (g, min_lum) = if forward {
        (gamma, 1e-4_f32)
    } else {
        (1.0 / gamma, 1e-4_f32.powf(gamma))
    };
    let y = (REC2100_LUMA[0] * rgb[0] + REC2100_LUMA[1] * rgb[1] + REC2100_LUMA[2] * rgb[2])
        .abs()
        .max(min_lum);
    let scale = y.powf(g - 1.0);
    for v in rgb.iter_mut() {
        *v *= scale;
    }
}

// ============================================================================
// CIE conversions
// ============================================================================

fn xyz_to_xyy([x, y, z]: [f32; 3]) -> [f32; 3] {
    let d = x + y + z;
    let d = if d == 0.0 { 0.0 } else { 1.0 / d };
    [x * d, y * d, y]
}

fn xyy_to_xyz([x, y, lum]: [f32; 3]) -> [f32; 3] {
    let d = if y == 0.0 { 0.0 } else { 1.0 / y };
    [lum * x * d, lum, lum * (1.0 - x - y) * d]
}

fn xyz_to_uvy([x, y, z]: [f32; 3]) -> [f32; 3] {
    let d = x + 15.0 * y + 3.0 * z;
    let d = if d == 0.0 { 0.0 } else { 1.0 / d };
    [4.0 * x * d, 9.0 * y * d, y]
}

fn uvy_to_xyz([u, v, lum]: [f32; 3]) -> [f32; 3] {
    let d = if v == 0.0 { 0.0 } else { 1.0 / v };
    [
        2.25 * lum * u * d,
        lum,
        0.75 * lum * (4.0 - u - 6.666666666666667 * v) * d,
    ]
}

/// D65 white and L* curve constants, L* scaled to [0, 1].
mod luv {
    pub const U_N: f32 = 0.19783001;
    pub const V_N: f32 = 0.46831999;
    pub const Y_BREAK: f32 = 0.008856451679;
    pub const L_BREAK: f32 = 0.08;
    pub const KAPPA: f32 = 9.0329629629629608;
    pub const INV_KAPPA: f32 = 0.11070564598794539;
    pub const L_SCALE: f32 = 1.16;
    pub const L_OFFSET: f32 = 0.16;
    pub const INV_L_SCALE: f32 = 0.86206896551724144;
    pub const INV_13: f32 = 0.076923076923076927;
}

fn xyz_to_luv(xyz: [f32; 3]) -> [f32; 3] {
    use luv::*;
    let [u, v, y] = xyz_to_uvy(xyz);
    let l_star = if y <= Y_BREAK {
        KAPPA * y
    } else {
        L_SCALE * y.cbrt() - L_OFFSET
    };
    [l_star, 13.0 * l_star * (u - U_N), 13.0 * l_star * (v - V_N)]
}

fn luv_to_xyz([l_star, u_star, v_star]: [f32; 3]) -> [f32; 3] {
    use luv::*;
    let d = if l_star == 0.0 { 0.0 } else { INV_13 / l_star };
    let u = u_star * d + U_N;
    let v = v_star * d + V_N;
    let y = if l_star <= L_BREAK {
        INV_KAPPA * l_star
    } else {
        let t = (l_star + L_OFFSET) * INV_L_SCALE;
        t * t * t
    };
    let dd = if v == 0.0 { 0.0 } else { 0.25 / v };
    [9.0 * y * u * dd, y, y * (12.0 - 3.0 * u - 20.0 * v) * dd]
}
