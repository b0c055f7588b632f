//! Exposure/contrast op for viewing controls.
//!
//! Three styles share the same parameters:
//! - Linear: for scene-linear images
//! - Video: for video-encoded images (pivot and exposure pass through a
//!   video OETF approximation)
//! - Logarithmic: for log-encoded images, where exposure is an offset
//!
//! Exposure, contrast and gamma may be marked dynamic, meaning a host can
//! change them after the chain is built. Dynamic ops are never treated as
//! identities or inverse pairs.

use crate::error::{OpError, OpResult};
use crate::op::{OpType, TransformDirection};

use super::{MatrixOpData, OpData};

/// Video OETF power (1 / 1.83).
pub const VIDEO_OETF_POWER: f64 = 0.54644808743169393;

/// Minimum pivot value.
pub const MIN_PIVOT: f64 = 0.001;

/// Minimum contrast value.
pub const MIN_CONTRAST: f64 = 0.001;

/// Default log exposure step.
pub const LOG_EXPOSURE_STEP_DEFAULT: f64 = 0.088;

/// Default log mid-gray.
pub const LOG_MIDGRAY_DEFAULT: f64 = 0.435;

/// Exposure/contrast style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExposureContrastStyle {
    /// Scene-linear.
    #[default]
    Linear,
    /// Video-encoded.
    Video,
    /// Log-encoded.
    Logarithmic,
}

/// Exposure/contrast op parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ExposureContrastOpData {
    /// Style.
    pub style: ExposureContrastStyle,
    /// Exposure in stops.
    pub exposure: f64,
    /// Contrast (1 = unchanged).
    pub contrast: f64,
    /// Gamma, multiplied with contrast (1 = unchanged).
    pub gamma: f64,
    /// Contrast pivot.
    pub pivot: f64,
    /// Log exposure step (Logarithmic style).
    pub log_exposure_step: f64,
    /// Log mid-gray (Logarithmic style).
    pub log_midgray: f64,
    /// Exposure may change after build.
    pub exposure_dynamic: bool,
    /// Contrast may change after build.
    pub contrast_dynamic: bool,
    /// Gamma may change after build.
    pub gamma_dynamic: bool,
    /// Direction.
    pub direction: TransformDirection,
}

impl Default for ExposureContrastOpData {
    fn default() -> Self {
        Self {
            style: ExposureContrastStyle::Linear,
            exposure: 0.0,
            contrast: 1.0,
            gamma: 1.0,
            pivot: 0.18,
            log_exposure_step: LOG_EXPOSURE_STEP_DEFAULT,
            log_midgray: LOG_MIDGRAY_DEFAULT,
            exposure_dynamic: false,
            contrast_dynamic: false,
            gamma_dynamic: false,
            direction: TransformDirection::Forward,
        }
    }
}

impl ExposureContrastOpData {
    /// Creates a forward op with the given style, exposure and contrast.
    pub fn new(style: ExposureContrastStyle, exposure: f64, contrast: f64) -> Self {
        Self {
            style,
            exposure,
            contrast,
            ..Self::default()
        }
    }

    /// Marks exposure as dynamic.
    pub fn with_dynamic_exposure(mut self) -> Self {
        self.exposure_dynamic = true;
        self
    }

    /// Marks contrast as dynamic.
    pub fn with_dynamic_contrast(mut self) -> Self {
        self.contrast_dynamic = true;
        self
    }

    /// Marks gamma as dynamic.
    pub fn with_dynamic_gamma(mut self) -> Self {
        self.gamma_dynamic = true;
        self
    }

    /// Sets the direction.
    pub fn with_direction(mut self, direction: TransformDirection) -> Self {
        self.direction = direction;
        self
    }

    pub(crate) fn is_dynamic(&self) -> bool {
        self.exposure_dynamic || self.contrast_dynamic || self.gamma_dynamic
    }

    pub(crate) fn remove_dynamic_properties(&mut self) {
        self.exposure_dynamic = false;
        self.contrast_dynamic = false;
        self.gamma_dynamic = false;
    }

    pub(crate) fn is_identity(&self) -> bool {
        !self.is_dynamic() && self.exposure == 0.0 && self.contrast == 1.0 && self.gamma == 1.0
    }

    pub(crate) fn identity_replacement(&self) -> OpData {
        OpData::Matrix(MatrixOpData::identity())
    }

    pub(crate) fn is_inverse(&self, other: &Self) -> bool {
        !self.is_dynamic()
            && !other.is_dynamic()
            && self.direction != other.direction
            && self.style == other.style
            && self.exposure == other.exposure
            && self.contrast == other.contrast
            && self.gamma == other.gamma
            && self.pivot == other.pivot
            && self.log_exposure_step == other.log_exposure_step
            && self.log_midgray == other.log_midgray
    }

    pub(crate) fn inverse(&self) -> Self {
        Self {
            direction: self.direction.inverse(),
            ..self.clone()
        }
    }

    pub(crate) fn validate(&self) -> OpResult<()> {
        let values = [
            self.exposure,
            self.contrast,
            self.gamma,
            self.pivot,
            self.log_exposure_step,
            self.log_midgray,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(OpError::param(OpType::ExposureContrast, "values must be finite"));
        }
        Ok(())
    }

    pub(crate) fn apply(&self, rgba: &mut [f32; 4]) {
        let contrast = (self.contrast * self.gamma).max(MIN_CONTRAST);
        let forward = self.direction.is_forward();
        match self.style {
            ExposureContrastStyle::Linear | ExposureContrastStyle::Video => {
                let mut exposure = 2f64.powf(self.exposure);
                let mut pivot = self.pivot.max(MIN_PIVOT);
                if self.style == ExposureContrastStyle::Video {
                    exposure = exposure.powf(VIDEO_OETF_POWER);
                    pivot = pivot.powf(VIDEO_OETF_POWER);
                }
                for v in rgba.iter_mut().take(3) {
                    let x = *v as f64;
                    let y = match (forward, contrast == 1.0) {
                        (true, true) => x * exposure,
                        (true, false) => (x * exposure / pivot).max(0.0).powf(contrast) * pivot,
                        (false, true) => x / exposure,
                        (false, false) => {
                            (x / pivot).max(0.0).powf(1.0 / contrast) * pivot / exposure
                        }
                    };
                    *v = y as f32;
                }
            }
            ExposureContrastStyle::Logarithmic => {
                let pivot = self.pivot.max(MIN_PIVOT);
                let log_pivot =
                    ((pivot / 0.18).log2() * self.log_exposure_step + self.log_midgray).max(0.0);
                let exposure = self.exposure * self.log_exposure_step;
                for v in rgba.iter_mut().take(3) {
                    let x = *v as f64;
                    let y = if forward {
                        (x + exposure - log_pivot) * contrast + log_pivot
                    } else {
                        (x - log_pivot) / contrast + log_pivot - exposure
                    };
                    *v = y as f32;
                }
            }
        }
    }

    pub(crate) fn describe(&self) -> String {
        format!(
            "{} {:?} exposure={}{} contrast={}{} gamma={}{} pivot={}",
            self.direction.as_str(),
            self.style,
            self.exposure,
            if self.exposure_dynamic { "(dyn)" } else { "" },
            self.contrast,
            if self.contrast_dynamic { "(dyn)" } else { "" },
            self.gamma,
            if self.gamma_dynamic { "(dyn)" } else { "" },
            self.pivot
        )
    }
}
