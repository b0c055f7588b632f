//! # vfx-math
//!
//! Math utilities for VFX color processing.
//!
//! - [`MatrixOffset`] - 4x4 matrix plus offset for RGBA transforms
//! - Interpolation utilities ([`lerp`], [`sample_linear`])
//!
//! # Design
//!
//! This crate wraps [`glam`] types with VFX-specific functionality.
//! All matrix operations assume **row-major** storage and **column vectors**:
//!
//! ```text
//! result = matrix * vector + offset
//! ```
//!
//! # Usage
//!
//! ```rust
//! use vfx_math::MatrixOffset;
//!
//! let rgb_to_xyz = MatrixOffset::new(
//!     [
//!         0.4124564, 0.3575761, 0.1804375, 0.0,
//!         0.2126729, 0.7151522, 0.0721750, 0.0,
//!         0.0193339, 0.1191920, 0.9503041, 0.0,
//!         0.0, 0.0, 0.0, 1.0,
//!     ],
//!     [0.0; 4],
//! );
//!
//! let xyz = rgb_to_xyz.apply([1.0, 0.5, 0.25, 1.0]);
//! assert!(xyz[1] > 0.0);
//! ```
//!
//! # Used By
//!
//! - `vfx-opchain` - matrix operators and their composition

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod interp;
mod mat4;

pub use interp::*;
pub use mat4::*;
