// Error handling for the sketchlisp runtime.
//
// Evaluation-time failures are terminal for the `evaluate` call that
// raised them; there is no internal recovery. Structural problems in
// plans never surface here: the plan compiler represents those as data.

use thiserror::Error;

use crate::ast::{Expression, PrimitiveToken, Variable};

pub type RuntimeResult<T> = Result<T, RuntimeError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    #[error("unbound variable: {0}")]
    UnboundVariable(Variable),

    #[error("not callable in application head position: {0}")]
    NonCallableHead(Expression),

    #[error("no native implementation registered for primitive: {0}")]
    UnknownPrimitive(PrimitiveToken),

    #[error("arity mismatch in {function}: expected {expected}, got {actual}")]
    ArityMismatch {
        function: String,
        expected: String,
        actual: usize,
    },

    #[error("recursion limit of {0} exceeded")]
    RecursionLimit(usize),
}
