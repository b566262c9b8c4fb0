//! Per-turn context: the standing instruction sent with every request.

pub mod assembler;

pub use assembler::{AssemblyInput, ContextAssembler, render_weight, render_workouts};
