//! The plan graph: mutable, possibly cyclic, possibly-incomplete
//! expression nodes under construction, the move set that mutates them,
//! and the compiler that reduces them to immutable expressions.

pub mod compiler;
pub mod plan;
pub mod state;

pub use compiler::{compile_sketch, Compilation, CompiledPlan};
pub use plan::{ComponentReference, Connected, ExpressionPlan, PlanId, Slot};
pub use state::{PlugCandidates, Sketch, SketchError, SketchResult, SlotView};
