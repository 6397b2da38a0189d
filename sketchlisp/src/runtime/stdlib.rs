//! Standard library for the sketchlisp runtime.
//!
//! Provides the fixed native-primitive registry (token identity to host
//! function, built once at startup and read-only thereafter), the built-in
//! lambda targets the search aims for, and the default usable vocabulary.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::ast::{ExprKind, Expression, PrimitiveToken, Variable};
use crate::runtime::error::{RuntimeError, RuntimeResult};
use crate::runtime::validator::UsableVocabulary;

/// How many arguments a native function accepts, counting positional and
/// keyword arguments together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
    Range(usize, usize),
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match self {
            Arity::Exact(n) => count == *n,
            Arity::AtLeast(n) => count >= *n,
            Arity::Range(min, max) => count >= *min && count <= *max,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{}", n),
            Arity::AtLeast(n) => write!(f, "at least {}", n),
            Arity::Range(min, max) => write!(f, "{}-{}", min, max),
        }
    }
}

/// A host-side function callable through a `PrimitiveToken`. Keyword
/// arguments reach the native side keyed by display name, since host code
/// addresses parameters by name rather than by variable identity.
#[derive(Clone)]
pub struct NativeFunction {
    pub name: String,
    pub arity: Arity,
    pub func: Rc<dyn Fn(&[Expression], &HashMap<String, Expression>) -> RuntimeResult<Expression>>,
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

impl PartialEq for NativeFunction {
    fn eq(&self, other: &Self) -> bool {
        // Function pointers are not comparable; name and arity identify a native.
        self.name == other.name && self.arity == other.arity
    }
}

/// Fixed table mapping primitive-token identities to native functions.
/// Populated once at process start; lookups only after that.
#[derive(Debug, Default)]
pub struct PrimitiveRegistry {
    functions: HashMap<String, NativeFunction>,
    tokens: Vec<PrimitiveToken>,
}

impl PrimitiveRegistry {
    pub fn new() -> Self {
        PrimitiveRegistry::default()
    }

    pub fn register(&mut self, token: PrimitiveToken, function: NativeFunction) {
        self.functions.insert(token.name().to_string(), function);
        self.tokens.push(token);
    }

    pub fn lookup(&self, token: &PrimitiveToken) -> Option<&NativeFunction> {
        self.functions.get(token.name())
    }

    pub fn tokens(&self) -> &[PrimitiveToken] {
        &self.tokens
    }
}

/// The standard library: registry construction plus the built-in targets
/// and vocabulary the synthesis search works against.
pub struct StandardLibrary;

impl StandardLibrary {
    /// The boolean NAND primitive token: `nand(a, b) = not (a and b)`.
    pub fn nand_token() -> PrimitiveToken {
        PrimitiveToken::new("nand", vec![Variable::new("a"), Variable::new("b")])
    }

    /// Build the fixed native registry supplied to the evaluator at startup.
    pub fn create_registry() -> PrimitiveRegistry {
        let mut registry = PrimitiveRegistry::new();
        registry.register(
            Self::nand_token(),
            NativeFunction {
                name: "nand".to_string(),
                arity: Arity::Exact(2),
                func: Rc::new(native_nand),
            },
        );
        registry
    }

    /// The built-in OR target: `(lambda (a b) (if a true b))`.
    pub fn or_lambda() -> Expression {
        let a = Variable::new("a");
        let b = Variable::new("b");
        Expression::lambda(
            vec![a.clone(), b.clone()],
            Expression::if_expr(
                Expression::Variable(a),
                Expression::Literal(true),
                Expression::Variable(b),
            ),
            Some("or"),
        )
    }

    /// Expressions the search tries to reproduce.
    pub fn targets() -> Vec<Expression> {
        vec![Self::or_lambda()]
    }

    /// The vocabulary a solution may be built from: the NAND token and the
    /// boolean literals as explicit values, plus variables and lambdas as
    /// permitted kinds.
    pub fn default_vocabulary() -> UsableVocabulary {
        UsableVocabulary::new(
            vec![
                Expression::Primitive(Self::nand_token()),
                Expression::Literal(true),
                Expression::Literal(false),
            ],
            [ExprKind::Variable, ExprKind::Lambda],
        )
    }
}

fn native_nand(
    args: &[Expression],
    kwargs: &HashMap<String, Expression>,
) -> RuntimeResult<Expression> {
    let a = nand_param(args, kwargs, 0, "a")?;
    let b = nand_param(args, kwargs, 1, "b")?;
    Ok(Expression::Literal(!(a.is_truthy() && b.is_truthy())))
}

fn nand_param<'a>(
    args: &'a [Expression],
    kwargs: &'a HashMap<String, Expression>,
    index: usize,
    name: &str,
) -> RuntimeResult<&'a Expression> {
    args.get(index)
        .or_else(|| kwargs.get(name))
        .ok_or_else(|| RuntimeError::ArityMismatch {
            function: "nand".to_string(),
            expected: Arity::Exact(2).to_string(),
            actual: args.len() + kwargs.len(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_resolves_nand_by_token_identity() {
        let registry = StandardLibrary::create_registry();
        // a fresh token with the same name resolves to the same native
        let token = PrimitiveToken::new("nand", vec![]);
        assert!(registry.lookup(&token).is_some());
    }

    #[test]
    fn nand_truth_table() {
        for (a, b) in [(true, true), (true, false), (false, true), (false, false)] {
            let out = native_nand(
                &[Expression::Literal(a), Expression::Literal(b)],
                &HashMap::new(),
            )
            .unwrap();
            assert_eq!(out, Expression::Literal(!(a && b)));
        }
    }
}
