// Sketchlisp library
// A plan-driven lambda-calculus runtime for program synthesis: a small
// lisp dialect, its evaluator, and the plan graph plus compiler that turn
// incrementally constructed program sketches into evaluable expressions.

pub mod ast;
pub mod driver;
pub mod model;
pub mod naming;
pub mod runtime;
pub mod sketch;

// Re-export the key components so downstream users can reach the common
// surface without spelling out submodule paths.

pub use ast::{Beta, ExprKind, Expression, IfExpr, Lambda, LetExpr, PrimitiveToken, Variable};
pub use model::{model_for, ComponentMetadata, ExpressionModel, PlanKind, ValueCategory};
pub use runtime::{
    validate_expression, Environment, Evaluator, PrimitiveRegistry, RuntimeError, RuntimeResult,
    StandardLibrary, UsableVocabulary,
};
pub use sketch::{
    compile_sketch, Compilation, CompiledPlan, ComponentReference, Connected, PlanId,
    PlugCandidates, Sketch, SketchError, SketchResult, Slot,
};
