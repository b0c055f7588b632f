//! Log op: parametric logarithm and its antilog.
//!
//! Forward (linear to log), per RGB channel:
//!
//! ```text
//! out = logSlope * log_base(max(MIN, linSlope * in + linOffset)) + logOffset
//! ```
//!
//! Inverse (log to linear):
//!
//! ```text
//! out = (base ^ ((in - logOffset) / logSlope) - linOffset) / linSlope
//! ```

use crate::error::{OpError, OpResult};
use crate::op::{OpType, TransformDirection};

use super::{MatrixOpData, OpData, RangeOpData};

/// Smallest argument handed to the logarithm.
const MIN_VALUE: f64 = f32::MIN_POSITIVE as f64;

/// Per-channel log parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogParams {
    /// Log side slope.
    pub log_side_slope: f64,
    /// Log side offset.
    pub log_side_offset: f64,
    /// Linear side slope.
    pub lin_side_slope: f64,
    /// Linear side offset.
    pub lin_side_offset: f64,
}

impl Default for LogParams {
    fn default() -> Self {
        Self {
            log_side_slope: 1.0,
            log_side_offset: 0.0,
            lin_side_slope: 1.0,
            lin_side_offset: 0.0,
        }
    }
}

impl LogParams {
    /// Creates log params.
    pub fn new(
        log_side_slope: f64,
        log_side_offset: f64,
        lin_side_slope: f64,
        lin_side_offset: f64,
    ) -> Self {
        Self {
            log_side_slope,
            log_side_offset,
            lin_side_slope,
            lin_side_offset,
        }
    }

    fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Log op parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct LogOpData {
    /// Logarithm base.
    pub base: f64,
    /// Params for R, G, B.
    pub params: [LogParams; 3],
    /// Direction.
    pub direction: TransformDirection,
}

impl LogOpData {
    /// Log with affine params shared by all channels.
    pub fn new(base: f64, params: LogParams) -> Self {
        Self {
            base,
            params: [params; 3],
            direction: TransformDirection::Forward,
        }
    }

    /// Plain base-2 logarithm.
    pub fn log2() -> Self {
        Self::new(2.0, LogParams::default())
    }

    /// Plain base-10 logarithm.
    pub fn log10() -> Self {
        Self::new(10.0, LogParams::default())
    }

    /// Sets per-channel params.
    pub fn with_channel_params(mut self, params: [LogParams; 3]) -> Self {
        self.params = params;
        self
    }

    /// Sets the direction.
    pub fn with_direction(mut self, direction: TransformDirection) -> Self {
        self.direction = direction;
        self
    }

    /// True when R, G and B share the same params.
    pub fn all_components_equal(&self) -> bool {
        self.params[0] == self.params[1] && self.params[0] == self.params[2]
    }

    /// Plain log2 or log10 without affine params.
    pub fn is_simple_log(&self) -> bool {
        (self.base == 2.0 || self.base == 10.0)
            && self.all_components_equal()
            && self.params[0].is_default()
    }

    /// A log pair rebuilt as a simpler op.
    ///
    /// Log followed by antilog clamps at the point where the log argument
    /// reaches zero; antilog followed by log is exact.
    pub(crate) fn identity_replacement(&self) -> OpData {
        match self.direction {
            TransformDirection::Forward => {
                let min = if self.is_simple_log() {
                    0.0
                } else {
                    let p = &self.params[0];
                    -p.lin_side_offset / p.lin_side_slope
                };
                OpData::Range(RangeOpData::new(Some(min), None, Some(min), None))
            }
            TransformDirection::Inverse => OpData::Matrix(MatrixOpData::identity()),
        }
    }

    pub(crate) fn is_inverse(&self, other: &Self) -> bool {
        self.direction != other.direction
            && self.all_components_equal()
            && other.all_components_equal()
            && self.params[0] == other.params[0]
            && self.base == other.base
    }

    pub(crate) fn inverse(&self) -> Self {
        Self {
            direction: self.direction.inverse(),
            ..self.clone()
        }
    }

    pub(crate) fn validate(&self) -> OpResult<()> {
        if !self.base.is_finite() || self.base <= 0.0 {
            return Err(OpError::param(OpType::Log, "base must be positive"));
        }
        if self.base == 1.0 {
            return Err(OpError::param(OpType::Log, "base cannot be 1"));
        }
        for p in &self.params {
            if p.log_side_slope == 0.0 {
                return Err(OpError::param(OpType::Log, "log side slope cannot be zero"));
            }
            if p.lin_side_slope == 0.0 {
                return Err(OpError::param(OpType::Log, "linear side slope cannot be zero"));
            }
        }
        Ok(())
    }

    pub(crate) fn apply(&self, rgba: &mut [f32; 4]) {
        let ln_base = self.base.ln();
        for (v, p) in rgba.iter_mut().zip(self.params.iter()) {
            let x = *v as f64;
            let y = match self.direction {
                TransformDirection::Forward => {
                    let arg = (p.lin_side_slope * x + p.lin_side_offset).max(MIN_VALUE);
                    p.log_side_slope * (arg.ln() / ln_base) + p.log_side_offset
                }
                TransformDirection::Inverse => {
                    let e = (x - p.log_side_offset) / p.log_side_slope;
                    (self.base.powf(e) - p.lin_side_offset) / p.lin_side_slope
                }
            };
            *v = y as f32;
        }
    }

    pub(crate) fn describe(&self) -> String {
        let p = &self.params[0];
        format!(
            "{} base={} logSlope={} logOffset={} linSlope={} linOffset={}{}",
            self.direction.as_str(),
            self.base,
            p.log_side_slope,
            p.log_side_offset,
            p.lin_side_slope,
            p.lin_side_offset,
            if self.all_components_equal() { "" } else { " (per-channel)" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_log_pair_replacement() {
        let fwd = LogOpData::log2();
        let inv = fwd.inverse();
        assert!(fwd.is_inverse(&inv));

        match fwd.identity_replacement() {
            OpData::Range(r) => {
                assert_eq!(r.min_in, Some(0.0));
                assert_eq!(r.max_out, None);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(inv.identity_replacement(), OpData::Matrix(_)));
    }

    #[test]
    fn affine_log_clamps_at_lin_zero() {
        let op = LogOpData::new(10.0, LogParams::new(0.5, 0.1, 2.0, 0.5));
        match op.identity_replacement() {
            OpData::Range(r) => assert_eq!(r.min_out, Some(-0.25)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn per_channel_params_are_not_inverse() {
        let params = [
            LogParams::default(),
            LogParams::new(1.0, 0.0, 2.0, 0.0),
            LogParams::default(),
        ];
        let fwd = LogOpData::log10().with_channel_params(params);
        assert!(!fwd.is_inverse(&fwd.inverse()));
    }

    #[test]
    fn forward_then_inverse_round_trips() {
        let fwd = LogOpData::new(2.0, LogParams::new(0.25, 0.5, 4.0, 0.1));
        let inv = fwd.inverse();
        let mut px = [0.18f32, 1.0, 4.0, 1.0];
        fwd.apply(&mut px);
        inv.apply(&mut px);
        assert!((px[0] - 0.18).abs() < 1e-5);
        assert!((px[2] - 4.0).abs() < 1e-4);
    }

    #[test]
    fn invalid_base() {
        assert!(LogOpData::new(1.0, LogParams::default()).validate().is_err());
        assert!(LogOpData::new(-2.0, LogParams::default()).validate().is_err());
    }
}
