// Vocabulary check for candidate solutions: a constructed expression may
// only be built from the values and expression kinds the search was
// allowed to use. Failure is a data result carrying the first offending
// sub-expression as a witness, never an error.

use std::collections::HashSet;

use crate::ast::{ExprKind, Expression};

#[derive(Debug, Clone)]
pub struct UsableVocabulary {
    values: Vec<Expression>,
    kinds: HashSet<ExprKind>,
}

impl UsableVocabulary {
    pub fn new(values: Vec<Expression>, kinds: impl IntoIterator<Item = ExprKind>) -> Self {
        UsableVocabulary {
            values,
            kinds: kinds.into_iter().collect(),
        }
    }

    /// Explicitly usable values, compared structurally.
    pub fn permits_value(&self, expr: &Expression) -> bool {
        self.values.iter().any(|v| v == expr)
    }

    pub fn permits_kind(&self, kind: ExprKind) -> bool {
        self.kinds.contains(&kind)
    }

    pub fn values(&self) -> &[Expression] {
        &self.values
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Validation {
    pub ok: bool,
    pub witness: Option<Expression>,
}

impl Validation {
    fn passed() -> Self {
        Validation {
            ok: true,
            witness: None,
        }
    }

    fn failed(witness: &Expression) -> Self {
        Validation {
            ok: false,
            witness: Some(witness.clone()),
        }
    }
}

/// Walk `expr` structurally; every sub-part must be an explicitly usable
/// value or of a permitted kind. The first offender becomes the witness.
pub fn validate_expression(expr: &Expression, vocabulary: &UsableVocabulary) -> Validation {
    if vocabulary.permits_value(expr) {
        return Validation::passed();
    }
    if !vocabulary.permits_kind(expr.kind()) {
        return Validation::failed(expr);
    }
    for sub in sub_expressions(expr) {
        let result = validate_expression(sub, vocabulary);
        if !result.ok {
            return result;
        }
    }
    Validation::passed()
}

fn sub_expressions(expr: &Expression) -> Vec<&Expression> {
    match expr {
        Expression::Beta(beta) => {
            let mut subs = vec![&beta.head];
            subs.extend(beta.args.iter());
            subs.extend(beta.kwargs.values());
            subs
        }
        Expression::Lambda(lambda) => vec![&lambda.body],
        Expression::If(if_expr) => vec![
            &if_expr.condition,
            &if_expr.then_branch,
            &if_expr.else_branch,
        ],
        Expression::Let(let_expr) => {
            let mut subs: Vec<&Expression> = let_expr.bindings.values().collect();
            subs.push(&let_expr.body);
            subs
        }
        Expression::Literal(_) | Expression::Variable(_) | Expression::Primitive(_) => vec![],
    }
}
