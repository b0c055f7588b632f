//! Bit depth formats.
//!
//! This module provides the canonical bit depth definition used across
//! all vfx-rs crates.
//!
//! # Usage
//!
//! ```rust
//! use vfx_core::format::BitDepth;
//!
//! // DPX uses 10-bit packed
//! let dpx_depth = BitDepth::U10;
//! assert!(dpx_depth.is_integer());
//! assert_eq!(dpx_depth.lut_domain_size(), Some(1024));
//!
//! // Half-float is tabulated over its full 16-bit pattern space
//! assert_eq!(BitDepth::F16.lut_domain_size(), Some(65536));
//! assert_eq!(BitDepth::F32.lut_domain_size(), None);
//! ```

use std::str::FromStr;

/// Bit depth specification for pixel data.
///
/// Represents the precision of pixel values, including packed formats
/// commonly used in film/broadcast (10-bit, 12-bit DPX).
///
/// # Variants
///
/// Integer formats:
/// - `U8` - 8-bit unsigned [0, 255]
/// - `U10` - 10-bit unsigned [0, 1023] (DPX, broadcast)
/// - `U12` - 12-bit unsigned [0, 4095] (cinema cameras)
/// - `U14` - 14-bit unsigned [0, 16383] (raw sensors)
/// - `U16` - 16-bit unsigned [0, 65535]
/// - `U32` - 32-bit unsigned [0, 4294967295]
///
/// Floating-point formats:
/// - `F16` - 16-bit half-precision IEEE 754
/// - `F32` - 32-bit single-precision IEEE 754
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum BitDepth {
    /// Unknown/auto-detect.
    Unknown,
    /// 8-bit unsigned integer.
    U8,
    /// 10-bit unsigned integer (DPX, broadcast).
    U10,
    /// 12-bit unsigned integer (cinema cameras).
    U12,
    /// 14-bit unsigned integer.
    U14,
    /// 16-bit unsigned integer.
    U16,
    /// 32-bit unsigned integer.
    U32,
    /// 16-bit half-precision float.
    F16,
    /// 32-bit single-precision float (VFX standard).
    #[default]
    F32,
}

impl BitDepth {
    /// All known bit depths, in ascending integer-then-float order.
    pub const ALL: [BitDepth; 8] = [
        Self::U8,
        Self::U10,
        Self::U12,
        Self::U14,
        Self::U16,
        Self::U32,
        Self::F16,
        Self::F32,
    ];

    /// Number of bits per channel.
    /// Returns 0 for Unknown.
    #[inline]
    pub const fn bits(&self) -> u32 {
        match self {
            Self::Unknown => 0,
            Self::U8 => 8,
            Self::U10 => 10,
            Self::U12 => 12,
            Self::U14 => 14,
            Self::U16 => 16,
            Self::U32 => 32,
            Self::F16 => 16,
            Self::F32 => 32,
        }
    }

    /// Whether this is a floating-point format.
    /// Returns false for Unknown.
    #[inline]
    pub const fn is_float(&self) -> bool {
        matches!(self, Self::F16 | Self::F32)
    }

    /// Whether this is unknown/auto-detect.
    #[inline]
    pub const fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    /// Whether this is an integer format.
    #[inline]
    pub const fn is_integer(&self) -> bool {
        !self.is_float() && !self.is_unknown()
    }

    /// Whether this is one of the 32-bit formats (`U32` or `F32`).
    #[inline]
    pub const fn is_32bit(&self) -> bool {
        matches!(self, Self::U32 | Self::F32)
    }

    /// Maximum representable integer value.
    /// Returns 0 for Unknown and the float formats.
    #[inline]
    pub const fn max_value(&self) -> u32 {
        match self {
            Self::Unknown | Self::F16 | Self::F32 => 0,
            Self::U8 => 255,
            Self::U10 => 1023,
            Self::U12 => 4095,
            Self::U14 => 16383,
            Self::U16 => 65535,
            Self::U32 => u32::MAX,
        }
    }

    /// Number of entries a lookup table needs to index every code value
    /// of this depth directly.
    ///
    /// Integer depths up to 16 bits get one entry per code value, `F16`
    /// gets one entry per half-float bit pattern (65536). The 32-bit
    /// formats and Unknown cannot be tabulated and return `None`.
    #[inline]
    pub const fn lut_domain_size(&self) -> Option<usize> {
        match self {
            Self::U8 | Self::U10 | Self::U12 | Self::U14 | Self::U16 => {
                Some(self.max_value() as usize + 1)
            }
            Self::F16 => Some(65536),
            Self::U32 | Self::F32 | Self::Unknown => None,
        }
    }

    /// Returns the short name used by OCIO configs ("8ui", "10ui", ..., "32f").
    ///
    /// # Example
    /// ```rust
    /// use vfx_core::BitDepth;
    /// assert_eq!(BitDepth::U14.as_str(), "14ui");
    /// assert_eq!(BitDepth::F16.as_str(), "16f");
    /// ```
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::U8 => "8ui",
            Self::U10 => "10ui",
            Self::U12 => "12ui",
            Self::U14 => "14ui",
            Self::U16 => "16ui",
            Self::U32 => "32ui",
            Self::F16 => "16f",
            Self::F32 => "32f",
        }
    }
}

impl FromStr for BitDepth {
    type Err = std::convert::Infallible;

    /// Parses an OCIO short name; anything unrecognized is `Unknown`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let depth = match s.trim().to_ascii_lowercase().as_str() {
            "8ui" => Self::U8,
            "10ui" => Self::U10,
            "12ui" => Self::U12,
            "14ui" => Self::U14,
            "16ui" => Self::U16,
            "32ui" => Self::U32,
            "16f" => Self::F16,
            "32f" => Self::F32,
            _ => Self::Unknown,
        };
        Ok(depth)
    }
}

impl std::fmt::Display for BitDepth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::U8 => write!(f, "8-bit"),
            Self::U10 => write!(f, "10-bit"),
            Self::U12 => write!(f, "12-bit"),
            Self::U14 => write!(f, "14-bit"),
            Self::U16 => write!(f, "16-bit"),
            Self::U32 => write!(f, "32-bit"),
            Self::F16 => write!(f, "half"),
            Self::F32 => write!(f, "float"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_and_32bit_predicates() {
        assert!(BitDepth::F16.is_float());
        assert!(BitDepth::F32.is_float());
        assert!(!BitDepth::U16.is_float());
        assert!(!BitDepth::Unknown.is_float());
        assert!(!BitDepth::Unknown.is_integer());

        assert!(BitDepth::U32.is_32bit());
        assert!(BitDepth::F32.is_32bit());
        assert!(!BitDepth::F16.is_32bit());
    }

    #[test]
    fn domain_sizes() {
        assert_eq!(BitDepth::U8.lut_domain_size(), Some(256));
        assert_eq!(BitDepth::U14.lut_domain_size(), Some(16384));
        assert_eq!(BitDepth::U16.lut_domain_size(), Some(65536));
        assert_eq!(BitDepth::U32.lut_domain_size(), None);
        assert_eq!(BitDepth::Unknown.lut_domain_size(), None);
    }

    #[test]
    fn short_names_parse_back() {
        for depth in BitDepth::ALL {
            assert_eq!(depth.as_str().parse::<BitDepth>().unwrap(), depth);
        }
        assert_eq!("bogus".parse::<BitDepth>().unwrap(), BitDepth::Unknown);
    }
}
