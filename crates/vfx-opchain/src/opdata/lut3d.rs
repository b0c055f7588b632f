//! Lut3D op: RGB lattice over `[0, 1]^3`.
//!
//! Entries are stored red-major: `index = (r * n + g) * n + b`, blue
//! varying fastest. Inputs are clamped to the cube, and alpha is untouched.

use crate::error::{OpError, OpResult};
use crate::op::{OpType, TransformDirection};

use super::{OpData, RangeOpData};

/// Largest supported grid size.
pub const MAX_GRID_SIZE: usize = 129;

/// Interpolation between lattice points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Lut3DInterpolation {
    /// Trilinear.
    Linear,
    /// Tetrahedral.
    #[default]
    Tetrahedral,
}

/// Lut3D op parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Lut3DOpData {
    /// Points per axis.
    pub grid_size: usize,
    /// `grid_size^3` RGB entries.
    pub data: Vec<[f32; 3]>,
    /// Interpolation.
    pub interpolation: Lut3DInterpolation,
    /// Direction.
    pub direction: TransformDirection,
}

impl Lut3DOpData {
    /// Identity lattice with `grid_size` points per axis.
    pub fn identity(grid_size: usize) -> Self {
        Self::from_fn(grid_size, |rgb| rgb)
    }

    /// Lattice built by sampling `f` at each node.
    pub fn from_fn(grid_size: usize, f: impl Fn([f32; 3]) -> [f32; 3]) -> Self {
        let max = grid_size.saturating_sub(1).max(1) as f32;
        let mut data = Vec::with_capacity(grid_size * grid_size * grid_size);
        for r in 0..grid_size {
            for g in 0..grid_size {
                for b in 0..grid_size {
                    data.push(f([r as f32 / max, g as f32 / max, b as f32 / max]));
                }
            }
        }
        Self {
            grid_size,
            data,
            interpolation: Lut3DInterpolation::default(),
            direction: TransformDirection::Forward,
        }
    }

    /// Sets interpolation.
    pub fn with_interpolation(mut self, interpolation: Lut3DInterpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    /// Sets the direction.
    pub fn with_direction(mut self, direction: TransformDirection) -> Self {
        self.direction = direction;
        self
    }

    #[inline]
    fn at(&self, r: usize, g: usize, b: usize) -> [f32; 3] {
        let n = self.grid_size;
        self.data[(r * n + g) * n + b]
    }

    pub(crate) fn is_identity(&self) -> bool {
        if self.grid_size < 2 || self.data.len() != self.grid_size.pow(3) {
            return false;
        }
        let max = (self.grid_size - 1) as f32;
        let n = self.grid_size;
        (0..n).all(|r| {
            (0..n).all(|g| {
                (0..n).all(|b| self.at(r, g, b) == [r as f32 / max, g as f32 / max, b as f32 / max])
            })
        })
    }

    pub(crate) fn identity_replacement(&self) -> OpData {
        OpData::Range(RangeOpData::clamp(Some(0.0), Some(1.0)))
    }

    pub(crate) fn is_inverse(&self, other: &Self) -> bool {
        self.direction != other.direction
            && self.grid_size == other.grid_size
            && self.data == other.data
    }

    pub(crate) fn can_combine_with(&self, other: &Self) -> bool {
        self.direction.is_forward() && other.direction.is_forward()
    }

    /// Samples `other(self(x))` on the finer of the two lattices.
    pub(crate) fn combine_with(&self, other: &Self) -> OpResult<Vec<OpData>> {
        if !self.can_combine_with(other) {
            return Err(OpError::lut(OpType::Lut3D, "only forward lattices can be combined"));
        }
        let size = self.grid_size.max(other.grid_size);
        let combined = Self::from_fn(size, |rgb| {
            let mid = self.eval(rgb);
            other.eval(mid)
        });
        Ok(vec![OpData::Lut3D(combined.with_interpolation(self.interpolation))])
    }

    pub(crate) fn inverse(&self) -> Self {
        Self {
            direction: self.direction.inverse(),
            ..self.clone()
        }
    }

    pub(crate) fn validate(&self) -> OpResult<()> {
        if !(2..=MAX_GRID_SIZE).contains(&self.grid_size) {
            return Err(OpError::lut(
                OpType::Lut3D,
                format!("grid size must be within 2..={MAX_GRID_SIZE}, got {}", self.grid_size),
            ));
        }
        let expected = self.grid_size.pow(3);
        if self.data.len() != expected {
            return Err(OpError::lut(
                OpType::Lut3D,
                format!("expected {expected} entries, got {}", self.data.len()),
            ));
        }
        Ok(())
    }

    pub(crate) fn apply(&self, rgba: &mut [f32; 4]) {
        if self.grid_size < 2 || self.data.len() != self.grid_size.pow(3) {
            return;
        }
        let rgb = [rgba[0], rgba[1], rgba[2]];
        let out = match self.direction {
            TransformDirection::Forward => self.eval(rgb),
            TransformDirection::Inverse => self.eval_inverse(rgb),
        };
        rgba[..3].copy_from_slice(&out);
    }

    /// Forward evaluation.
    pub fn eval(&self, rgb: [f32; 3]) -> [f32; 3] {
        match self.interpolation {
            Lut3DInterpolation::Linear => self.eval_trilinear(rgb),
            Lut3DInterpolation::Tetrahedral => self.eval_tetrahedral(rgb),
        }
    }

    fn cell(&self, rgb: [f32; 3]) -> ([usize; 3], [f32; 3]) {
        let max_idx = (self.grid_size - 1) as f32;
        let mut base = [0usize; 3];
        let mut frac = [0.0f32; 3];
        for c in 0..3 {
            let v = if rgb[c].is_nan() { 0.0 } else { rgb[c].clamp(0.0, 1.0) };
            let pos = v * max_idx;
            let i = (pos.floor() as usize).min(self.grid_size - 2);
            base[c] = i;
            frac[c] = pos - i as f32;
        }
        (base, frac)
    }

    fn eval_trilinear(&self, rgb: [f32; 3]) -> [f32; 3] {
        let ([r0, g0, b0], [fr, fg, fb]) = self.cell(rgb);
        let mut out = [0.0f32; 3];
        for (i, o) in out.iter_mut().enumerate() {
            let c = |r: usize, g: usize, b: usize| self.at(r0 + r, g0 + g, b0 + b)[i];
            let x00 = c(0, 0, 0) + (c(1, 0, 0) - c(0, 0, 0)) * fr;
            let x10 = c(0, 1, 0) + (c(1, 1, 0) - c(0, 1, 0)) * fr;
            let x01 = c(0, 0, 1) + (c(1, 0, 1) - c(0, 0, 1)) * fr;
            let x11 = c(0, 1, 1) + (c(1, 1, 1) - c(0, 1, 1)) * fr;
            let y0 = x00 + (x10 - x00) * fg;
            let y1 = x01 + (x11 - x01) * fg;
            *o = y0 + (y1 - y0) * fb;
        }
        out
    }

    fn eval_tetrahedral(&self, rgb: [f32; 3]) -> [f32; 3] {
        let ([r0, g0, b0], [fr, fg, fb]) = self.cell(rgb);
        let c000 = self.at(r0, g0, b0);
        let c100 = self.at(r0 + 1, g0, b0);
        let c010 = self.at(r0, g0 + 1, b0);
        let c110 = self.at(r0 + 1, g0 + 1, b0);
        let c001 = self.at(r0, g0, b0 + 1);
        let c101 = self.at(r0 + 1, g0, b0 + 1);
        let c011 = self.at(r0, g0 + 1, b0 + 1);
        let c111 = self.at(r0 + 1, g0 + 1, b0 + 1);

        let mut out = [0.0f32; 3];
        for (i, o) in out.iter_mut().enumerate() {
            *o = if fr > fg {
                if fg > fb {
                    (1.0 - fr) * c000[i] + (fr - fg) * c100[i] + (fg - fb) * c110[i] + fb * c111[i]
                } else if fr > fb {
                    (1.0 - fr) * c000[i] + (fr - fb) * c100[i] + (fb - fg) * c101[i] + fg * c111[i]
                } else {
                    (1.0 - fb) * c000[i] + (fb - fr) * c001[i] + (fr - fg) * c101[i] + fg * c111[i]
                }
            } else if fr > fb {
                (1.0 - fg) * c000[i] + (fg - fr) * c010[i] + (fr - fb) * c110[i] + fb * c111[i]
            } else if fg > fb {
                (1.0 - fg) * c000[i] + (fg - fb) * c010[i] + (fb - fr) * c011[i] + fr * c111[i]
            } else {
                (1.0 - fb) * c000[i] + (fb - fg) * c001[i] + (fg - fr) * c011[i] + fr * c111[i]
            };
        }
        out
    }

    /// Damped Newton iteration on the forward lattice, starting from the
    /// target itself.
    fn eval_inverse(&self, target: [f32; 3]) -> [f32; 3] {
        const MAX_ITERS: usize = 30;
        const TOLERANCE: f32 = 1e-6;
        const DELTA: f32 = 1e-4;
        const DAMPING: f32 = 0.8;

        let mut guess = target.map(|v| if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) });
        for _ in 0..MAX_ITERS {
            let eval = self.eval(guess);
            let err = [eval[0] - target[0], eval[1] - target[1], eval[2] - target[2]];
            if (err[0] * err[0] + err[1] * err[1] + err[2] * err[2]).sqrt() < TOLERANCE {
                break;
            }

            let mut jacobian = [[0.0f32; 3]; 3];
            for j in 0..3 {
                let mut step = guess;
                let d = if step[j] + DELTA > 1.0 { -DELTA } else { DELTA };
                step[j] += d;
                let eval_step = self.eval(step);
                for i in 0..3 {
                    jacobian[i][j] = (eval_step[i] - eval[i]) / d;
                }
            }

            let Some(dx) = solve_3x3(&jacobian, &[-err[0], -err[1], -err[2]]) else {
                break;
            };
            for c in 0..3 {
                guess[c] = (guess[c] + DAMPING * dx[c]).clamp(0.0, 1.0);
            }
        }
        guess
    }

    pub(crate) fn describe(&self) -> String {
        format!(
            "{} grid={} interpolation={:?}",
            self.direction.as_str(),
            self.grid_size,
            self.interpolation
        )
    }
}

/// Cramer's rule. `None` for a singular system.
fn solve_3x3(a: &[[f32; 3]; 3], b: &[f32; 3]) -> Option<[f32; 3]> {
    let det3 = |m: [[f32; 3]; 3]| {
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    };
    let det = det3(*a);
    if det.abs() < 1e-10 {
        return None;
    }
    let mut out = [0.0f32; 3];
    for (col, o) in out.iter_mut().enumerate() {
        let mut m = *a;
        for row in 0..3 {
            m[row][col] = b[row];
        }
        *o = det3(m) / det;
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_lattice() {
        let lut = Lut3DOpData::identity(5);
        lut.validate().unwrap();
        assert!(lut.is_identity());

        let out = lut.eval([0.33, 0.66, 0.5]);
        assert!((out[0] - 0.33).abs() < 1e-5);
        assert!((out[1] - 0.66).abs() < 1e-5);
        assert!((out[2] - 0.5).abs() < 1e-5);
    }

    #[test]
    fn trilinear_matches_tetrahedral_on_affine_data() {
        let f = |c: [f32; 3]| [c[0] * 0.5 + 0.1, c[1] * 0.25, 1.0 - c[2]];
        let tet = Lut3DOpData::from_fn(9, f);
        let lin = tet.clone().with_interpolation(Lut3DInterpolation::Linear);
        let p = [0.21, 0.77, 0.4];
        let (a, b) = (tet.eval(p), lin.eval(p));
        for c in 0..3 {
            assert!((a[c] - b[c]).abs() < 1e-5);
        }
    }

    #[test]
    fn inverse_recovers_input() {
        let lut = Lut3DOpData::from_fn(17, |c| c.map(|v| v * 0.5));
        let inv = lut.inverse();
        let mut px = [0.2, 0.3, 0.4, 1.0];
        inv.apply(&mut px);
        assert!((px[0] - 0.4).abs() < 0.01, "R: {}", px[0]);
        assert!((px[1] - 0.6).abs() < 0.01, "G: {}", px[1]);
        assert!((px[2] - 0.8).abs() < 0.01, "B: {}", px[2]);
    }

    #[test]
    fn bad_sizes() {
        let mut lut = Lut3DOpData::identity(3);
        lut.data.pop();
        assert!(lut.validate().is_err());
        assert!(Lut3DOpData::identity(1).validate().is_err());
    }
}
