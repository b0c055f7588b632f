//! Flags taken from `OCIO_OPTIMIZATION_FLAGS`.
//!
//! Kept in its own test binary: it is the only test touching the process
//! environment.

use vfx_core::BitDepth;
use vfx_opchain::{
    ExponentOpData, OPTIMIZATION_FLAGS_ENV, Op, OpVec, OptimizationFlags, OptimizerSettings,
    Processor,
};

fn set_env(value: Option<&str>) {
    // SAFETY: no other thread of this test binary reads the environment.
    unsafe {
        match value {
            Some(v) => std::env::set_var(OPTIMIZATION_FLAGS_ENV, v),
            None => std::env::remove_var(OPTIMIZATION_FLAGS_ENV),
        }
    }
}

#[test]
fn env_variable_overrides_settings() {
    let settings = OptimizerSettings {
        flags: OptimizationFlags::DRAFT,
        input_bit_depth: BitDepth::F32,
        output_bit_depth: BitDepth::F32,
    };

    set_env(None);
    assert_eq!(settings.with_env_override().flags, OptimizationFlags::DRAFT);
    assert_eq!(
        OptimizationFlags::from_env_or(OptimizationFlags::GOOD),
        OptimizationFlags::GOOD
    );

    set_env(Some("none"));
    let overridden = settings.with_env_override();
    assert_eq!(overridden.flags, OptimizationFlags::NONE);
    assert_eq!(overridden.input_bit_depth, BitDepth::F32);

    // The override reaches the processor: nothing is fused under NONE.
    let mut ops = OpVec::new();
    ops.push(Op::new(ExponentOpData::uniform(2.0)));
    ops.push(Op::new(ExponentOpData::uniform(3.0)));
    let proc = Processor::new(ops);
    let (opt, _) = proc.optimized_with(&overridden).unwrap();
    assert_eq!(opt.num_ops(), 2);

    set_env(Some("0x00100000"));
    assert_eq!(
        OptimizationFlags::from_env_or(OptimizationFlags::DEFAULT),
        OptimizationFlags::COMP_MATRIX
    );

    // Unparseable values are ignored.
    set_env(Some("not-a-flag-set"));
    assert_eq!(settings.with_env_override().flags, OptimizationFlags::DRAFT);

    set_env(None);
}
