//! # vfx-core
//!
//! Core types shared by the VFX-RS color pipeline crates.
//!
//! - [`BitDepth`] - pixel precision at the boundaries of a color transform
//!
//! ## Crate Structure
//!
//! This crate has no internal dependencies. The other crates build on it:
//!
//! ```text
//! vfx-core (this crate)
//!    ^
//!    |
//!    +-- vfx-math (matrices, interpolation)
//!    +-- vfx-opchain (op chains and their optimizer)
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` - Enable serialization for [`BitDepth`]

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod format;

pub use format::*;
