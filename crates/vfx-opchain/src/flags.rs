//! Optimization flags.
//!
//! Each bit enables one family of rewrites. Bit values match the ones
//! used by OpenColorIO config and environment settings, so a value taken
//! from `OCIO_OPTIMIZATION_FLAGS` means the same thing here.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::error::ParseFlagsError;
use crate::op::OpType;

/// Environment variable that overrides the caller's flags.
pub const OPTIMIZATION_FLAGS_ENV: &str = "OCIO_OPTIMIZATION_FLAGS";

bitflags! {
    /// Set of enabled optimizations.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct OptimizationFlags: u32 {
        /// Remove no-ops and replace identities.
        const IDENTITY = 0x0000_0001;
        /// Replace identity gammas.
        const IDENTITY_GAMMA = 0x0000_0002;

        /// Cancel inverse CDL pairs.
        const PAIR_IDENTITY_CDL = 0x0000_0040;
        /// Cancel inverse exposure/contrast pairs.
        const PAIR_IDENTITY_EXPOSURE_CONTRAST = 0x0000_0080;
        /// Cancel inverse fixed function pairs.
        const PAIR_IDENTITY_FIXED_FUNCTION = 0x0000_0100;
        /// Cancel inverse gamma pairs.
        const PAIR_IDENTITY_GAMMA = 0x0000_0200;
        /// Cancel inverse 1D LUT pairs.
        const PAIR_IDENTITY_LUT1D = 0x0000_0400;
        /// Cancel inverse 3D LUT pairs.
        const PAIR_IDENTITY_LUT3D = 0x0000_0800;
        /// Cancel inverse log pairs.
        const PAIR_IDENTITY_LOG = 0x0000_1000;

        /// Combine adjacent exponents.
        const COMP_EXPONENT = 0x0004_0000;
        /// Combine adjacent gammas.
        const COMP_GAMMA = 0x0008_0000;
        /// Combine adjacent matrices.
        const COMP_MATRIX = 0x0010_0000;
        /// Combine adjacent 1D LUTs.
        const COMP_LUT1D = 0x0020_0000;
        /// Combine adjacent 3D LUTs.
        const COMP_LUT3D = 0x0040_0000;
        /// Combine adjacent ranges.
        const COMP_RANGE = 0x0080_0000;
        /// Bake a leading run of separable ops into one 1D LUT.
        const COMP_SEPARABLE_PREFIX = 0x0100_0000;

        /// Freeze dynamic parameters so they can be optimized.
        const NO_DYNAMIC_PROPERTIES = 0x1000_0000;
    }
}

impl OptimizationFlags {
    /// No optimization.
    pub const NONE: Self = Self::empty();

    /// Every pair-inverse flag.
    pub const PAIR_IDENTITIES: Self = Self::PAIR_IDENTITY_CDL
        .union(Self::PAIR_IDENTITY_EXPOSURE_CONTRAST)
        .union(Self::PAIR_IDENTITY_FIXED_FUNCTION)
        .union(Self::PAIR_IDENTITY_GAMMA)
        .union(Self::PAIR_IDENTITY_LUT1D)
        .union(Self::PAIR_IDENTITY_LUT3D)
        .union(Self::PAIR_IDENTITY_LOG);

    /// Rewrites that never change a result.
    pub const LOSSLESS: Self = Self::IDENTITY
        .union(Self::IDENTITY_GAMMA)
        .union(Self::PAIR_IDENTITIES)
        .union(Self::COMP_EXPONENT)
        .union(Self::COMP_GAMMA)
        .union(Self::COMP_MATRIX)
        .union(Self::COMP_RANGE);

    /// Lossless plus 1D LUT resampling.
    pub const VERY_GOOD: Self = Self::LOSSLESS
        .union(Self::COMP_LUT1D)
        .union(Self::COMP_SEPARABLE_PREFIX);

    /// Very good plus 3D LUT resampling.
    pub const GOOD: Self = Self::VERY_GOOD.union(Self::COMP_LUT3D);

    /// Everything.
    pub const DRAFT: Self = Self::all();

    /// Flags used when the caller has no preference.
    pub const DEFAULT: Self = Self::VERY_GOOD;

    const PRESETS: [(&'static str, Self); 6] = [
        ("none", Self::NONE),
        ("lossless", Self::LOSSLESS),
        ("very_good", Self::VERY_GOOD),
        ("good", Self::GOOD),
        ("draft", Self::DRAFT),
        ("default", Self::DEFAULT),
    ];

    /// Whether adjacent inverse pairs of `op_type` may be cancelled.
    ///
    /// Matrix, Range and Exponent are left to composition. Types without a
    /// flag of their own are always allowed.
    pub fn is_pair_inverse_enabled(self, op_type: OpType) -> bool {
        let flag = match op_type {
            OpType::Cdl => Self::PAIR_IDENTITY_CDL,
            OpType::ExposureContrast => Self::PAIR_IDENTITY_EXPOSURE_CONTRAST,
            OpType::FixedFunction => Self::PAIR_IDENTITY_FIXED_FUNCTION,
            OpType::Gamma => Self::PAIR_IDENTITY_GAMMA,
            OpType::Lut1D => Self::PAIR_IDENTITY_LUT1D,
            OpType::Lut3D => Self::PAIR_IDENTITY_LUT3D,
            OpType::Log => Self::PAIR_IDENTITY_LOG,
            OpType::Exponent | OpType::Matrix | OpType::Range => return false,
            OpType::NoOp => return true,
        };
        self.contains(flag)
    }

    /// Whether adjacent ops of `op_type` may be combined.
    pub fn is_combine_enabled(self, op_type: OpType) -> bool {
        let flag = match op_type {
            OpType::Exponent => Self::COMP_EXPONENT,
            OpType::Gamma => Self::COMP_GAMMA,
            OpType::Lut1D => Self::COMP_LUT1D,
            OpType::Lut3D => Self::COMP_LUT3D,
            OpType::Matrix => Self::COMP_MATRIX,
            OpType::Range => Self::COMP_RANGE,
            _ => return false,
        };
        self.contains(flag)
    }

    /// Returns the flags from [`OPTIMIZATION_FLAGS_ENV`] if it is set and
    /// parses, otherwise `default`.
    pub fn from_env_or(default: Self) -> Self {
        match std::env::var(OPTIMIZATION_FLAGS_ENV) {
            Ok(value) => Self::from_override(&value, default),
            Err(_) => default,
        }
    }

    fn from_override(value: &str, default: Self) -> Self {
        match value.parse::<Self>() {
            Ok(flags) => {
                tracing::debug!(
                    %flags,
                    "optimization flags overridden from {OPTIMIZATION_FLAGS_ENV}"
                );
                flags
            }
            Err(e) => {
                tracing::warn!("ignoring {OPTIMIZATION_FLAGS_ENV}: {e}");
                default
            }
        }
    }
}

impl Default for OptimizationFlags {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl FromStr for OptimizationFlags {
    type Err = ParseFlagsError;

    /// Accepts a preset name, a decimal or `0x` hex integer, or flag names
    /// joined by `|`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let lower = s.to_ascii_lowercase();
        if let Some((_, flags)) = Self::PRESETS.iter().find(|(name, _)| *name == lower) {
            return Ok(*flags);
        }
        let bits = match lower.strip_prefix("0x") {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => lower.parse::<u32>().ok(),
        };
        if let Some(bits) = bits {
            return Ok(Self::from_bits_truncate(bits));
        }
        bitflags::parser::from_str::<Self>(s).map_err(|_| ParseFlagsError(s.to_string()))
    }
}

impl fmt::Display for OptimizationFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // "default" aliases "very_good"; the first match wins.
        match Self::PRESETS.iter().find(|(_, flags)| flags == self) {
            Some((name, _)) => f.write_str(name),
            None => write!(f, "{:#010x}", self.bits()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_values() {
        assert_eq!(OptimizationFlags::IDENTITY.bits(), 0x1);
        assert_eq!(OptimizationFlags::PAIR_IDENTITY_LOG.bits(), 0x1000);
        assert_eq!(OptimizationFlags::COMP_SEPARABLE_PREFIX.bits(), 0x0100_0000);
        assert_eq!(OptimizationFlags::NO_DYNAMIC_PROPERTIES.bits(), 0x1000_0000);
    }

    #[test]
    fn presets_nest() {
        use OptimizationFlags as F;
        assert!(F::VERY_GOOD.contains(F::LOSSLESS));
        assert!(F::GOOD.contains(F::VERY_GOOD));
        assert!(F::DRAFT.contains(F::GOOD));
        assert!(!F::LOSSLESS.contains(F::COMP_LUT1D));
        assert!(!F::VERY_GOOD.contains(F::COMP_LUT3D));
        assert!(!F::GOOD.contains(F::NO_DYNAMIC_PROPERTIES));
        assert_eq!(F::default(), F::VERY_GOOD);
    }

    #[test]
    fn pair_gating() {
        use OptimizationFlags as F;
        let all = F::all();
        assert!(!all.is_pair_inverse_enabled(OpType::Matrix));
        assert!(!all.is_pair_inverse_enabled(OpType::Range));
        assert!(!all.is_pair_inverse_enabled(OpType::Exponent));
        assert!(all.is_pair_inverse_enabled(OpType::Log));
        assert!(F::NONE.is_pair_inverse_enabled(OpType::NoOp));
        assert!(!F::PAIR_IDENTITY_LUT1D.is_pair_inverse_enabled(OpType::Lut3D));
    }

    #[test]
    fn combine_gating() {
        use OptimizationFlags as F;
        assert!(F::COMP_MATRIX.is_combine_enabled(OpType::Matrix));
        assert!(!F::COMP_MATRIX.is_combine_enabled(OpType::Range));
        assert!(!F::all().is_combine_enabled(OpType::Cdl));
        assert!(!F::all().is_combine_enabled(OpType::Log));
    }

    #[test]
    fn parse_and_display() {
        use OptimizationFlags as F;
        assert_eq!("lossless".parse::<F>().unwrap(), F::LOSSLESS);
        assert_eq!(" Draft ".parse::<F>().unwrap(), F::DRAFT);
        assert_eq!("0x100000".parse::<F>().unwrap(), F::COMP_MATRIX);
        assert_eq!("1".parse::<F>().unwrap(), F::IDENTITY);
        assert_eq!(
            "IDENTITY | COMP_RANGE".parse::<F>().unwrap(),
            F::IDENTITY | F::COMP_RANGE
        );
        assert!("fastest".parse::<F>().is_err());

        assert_eq!(F::GOOD.to_string(), "good");
        assert_eq!(F::DEFAULT.to_string(), "very_good");
        assert_eq!(F::COMP_MATRIX.to_string(), "0x00100000");
    }

    #[test]
    fn bad_override_keeps_default() {
        let f = OptimizationFlags::from_override("not-a-flag", OptimizationFlags::LOSSLESS);
        assert_eq!(f, OptimizationFlags::LOSSLESS);
        let f = OptimizationFlags::from_override("0x1", OptimizationFlags::LOSSLESS);
        assert_eq!(f, OptimizationFlags::IDENTITY);
    }
}
