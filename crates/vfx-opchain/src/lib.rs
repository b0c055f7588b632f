//! Color operator chains for VFX pipelines.
//!
//! A color transform compiles to an ordered chain of low-level ops
//! (matrices, ranges, gammas, logs, LUTs, CDLs, ...). This crate holds
//! the ops, evaluates chains on the CPU, and optimizes chains into shorter
//! equivalent ones before they are applied to pixels:
//!
//! - identity ops are removed or replaced by a cheaper clamp
//! - adjacent inverse pairs cancel
//! - adjacent compatible ops are fused
//! - identity clamps at integer boundaries are trimmed
//! - a leading per-channel run is baked into a 1D LUT for integer and
//!   half-float inputs
//!
//! Which rewrites run is chosen with [`OptimizationFlags`].
//!
//! # Quick Start
//!
//! ```
//! use vfx_core::BitDepth;
//! use vfx_opchain::{
//!     GammaOpData, GammaStyle, LogOpData, Op, OpVec, OptimizationFlags, optimize_op_vec,
//! };
//!
//! let log = Op::new(LogOpData::log2());
//! let gamma = Op::new(GammaOpData::basic(GammaStyle::BasicMirror, 2.2));
//!
//! let mut ops = OpVec::new();
//! ops.push(log.clone());
//! ops.push(gamma.clone());
//! ops.push(gamma.inverse());
//! ops.push(log.inverse());
//!
//! optimize_op_vec(&mut ops, BitDepth::F32, BitDepth::F32, OptimizationFlags::LOSSLESS)?;
//!
//! // The gammas cancel; the logs leave the clamp at zero they imply.
//! assert_eq!(ops.len(), 1);
//! # Ok::<(), vfx_opchain::OpError>(())
//! ```
//!
//! # Logging
//!
//! The optimizer reports through [`tracing`]. At DEBUG level it dumps the
//! chain before and after optimization; the dumps are only formatted when
//! DEBUG is enabled.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod flags;
mod op;
mod opvec;
mod processor;

pub mod opdata;
pub mod optimizer;

pub use error::{OpError, OpResult, ParseFlagsError};
pub use flags::{OPTIMIZATION_FLAGS_ENV, OptimizationFlags};
pub use op::{FormatMetadata, Op, OpRcPtr, OpType, TransformDirection};
pub use opdata::{
    CdlOpData, CdlStyle, ExponentOpData, ExposureContrastOpData, ExposureContrastStyle,
    FixedFunctionOpData, FixedFunctionStyle, GammaOpData, GammaParams, GammaStyle, HueAdjust,
    LogOpData, LogParams, Lut1DOpData, Lut3DInterpolation, Lut3DOpData, MatrixOpData, OpData,
    RangeOpData,
};
pub use optimizer::{MAX_OPTIMIZATION_PASSES, OptimizeReport, Optimizer, Pass, optimize_op_vec};
pub use opvec::OpVec;
pub use processor::{OptimizationLevel, OptimizerSettings, Processor};
