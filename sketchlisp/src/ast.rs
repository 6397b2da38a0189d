// Core expression forms for the sketchlisp dialect.
//
// Scoping is a mix of lexical and dynamic: a variable reference resolves
// against whatever environment is in force when it is evaluated, but a
// lambda seals the ambient environment into its `closed` mapping the moment
// it is evaluated as a value, so an escaped lambda behaves lexically.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use indexmap::IndexMap;
use uuid::Uuid;

use crate::runtime::environment::{unordered_hash, Environment};

/// An identity-bearing binder with a cosmetic display name.
///
/// Two variables with the same display name are distinct; equality and
/// hashing go by the identity allocated at construction time.
#[derive(Debug, Clone)]
pub struct Variable(Rc<VariableInner>);

#[derive(Debug)]
struct VariableInner {
    id: Uuid,
    name: String,
}

impl Variable {
    pub fn new(name: &str) -> Self {
        Variable(Rc::new(VariableInner {
            id: Uuid::new_v4(),
            name: name.to_string(),
        }))
    }

    /// A binder with the placeholder display name `_`.
    pub fn anonymous() -> Self {
        Self::new("_")
    }

    pub fn id(&self) -> Uuid {
        self.0.id
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for Variable {}

impl Hash for Variable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.name)
    }
}

/// An opaque reference to a native function, resolved at evaluation time
/// through the primitive registry. Carries the tuple of parameters the
/// native side expects so plans can check keyword coverage before finishing.
#[derive(Debug, Clone)]
pub struct PrimitiveToken(Rc<TokenInner>);

#[derive(Debug)]
struct TokenInner {
    name: String,
    params: Vec<Variable>,
}

impl PrimitiveToken {
    pub fn new(name: &str, params: Vec<Variable>) -> Self {
        PrimitiveToken(Rc::new(TokenInner {
            name: name.to_string(),
            params,
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn params(&self) -> &[Variable] {
        &self.0.params
    }
}

// Tokens are interned once in the registry; the name is the identity.
impl PartialEq for PrimitiveToken {
    fn eq(&self, other: &Self) -> bool {
        self.0.name == other.0.name
    }
}

impl Eq for PrimitiveToken {}

impl Hash for PrimitiveToken {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.name.hash(state);
    }
}

impl fmt::Display for PrimitiveToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.name)
    }
}

/// A function value. `closed` is the environment sealed into the lambda
/// when it was last evaluated; it is never mutated in place, only replaced
/// wholesale by constructing a new `Lambda`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lambda {
    pub params: Vec<Variable>,
    pub body: Expression,
    pub closed: Environment,
    pub name: Option<String>,
}

impl Hash for Lambda {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.params.hash(state);
        self.body.hash(state);
        self.closed.hash(state);
        self.name.hash(state);
    }
}

/// Function application. Keyword arguments bind by variable identity and
/// shadow positional bindings on conflict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Beta {
    pub head: Expression,
    pub args: Vec<Expression>,
    pub kwargs: IndexMap<Variable, Expression>,
}

impl Hash for Beta {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.head.hash(state);
        self.args.hash(state);
        unordered_hash(self.kwargs.iter(), state);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IfExpr {
    pub condition: Expression,
    pub then_branch: Expression,
    pub else_branch: Expression,
}

/// Parallel binding block. Initializers are evaluated with every sibling
/// binding already in scope, which is what makes recursive bindings work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LetExpr {
    pub bindings: IndexMap<Variable, Expression>,
    pub body: Expression,
}

impl Hash for LetExpr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        unordered_hash(self.bindings.iter(), state);
        self.body.hash(state);
    }
}

/// Discriminant-only view of an expression, used wherever dispatch or
/// vocabulary checks need the kind without the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExprKind {
    Literal,
    Variable,
    Lambda,
    Beta,
    If,
    Let,
    Primitive,
}

/// The closed union of expression forms. Compound payloads live behind
/// `Rc`, so expressions are immutable and cheap to share; two references
/// to the same compiled node stay pointer-identical.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expression {
    Literal(bool),
    Variable(Variable),
    Lambda(Rc<Lambda>),
    Beta(Rc<Beta>),
    If(Rc<IfExpr>),
    Let(Rc<LetExpr>),
    Primitive(PrimitiveToken),
}

impl Expression {
    pub fn lambda(params: Vec<Variable>, body: Expression, name: Option<&str>) -> Self {
        Expression::Lambda(Rc::new(Lambda {
            params,
            body,
            closed: Environment::empty(),
            name: name.map(|n| n.to_string()),
        }))
    }

    pub fn beta(head: Expression, args: Vec<Expression>) -> Self {
        Self::beta_with_kwargs(head, args, IndexMap::new())
    }

    pub fn beta_with_kwargs(
        head: Expression,
        args: Vec<Expression>,
        kwargs: IndexMap<Variable, Expression>,
    ) -> Self {
        Expression::Beta(Rc::new(Beta { head, args, kwargs }))
    }

    pub fn if_expr(condition: Expression, then_branch: Expression, else_branch: Expression) -> Self {
        Expression::If(Rc::new(IfExpr {
            condition,
            then_branch,
            else_branch,
        }))
    }

    pub fn let_expr(bindings: IndexMap<Variable, Expression>, body: Expression) -> Self {
        Expression::Let(Rc::new(LetExpr { bindings, body }))
    }

    pub fn kind(&self) -> ExprKind {
        match self {
            Expression::Literal(_) => ExprKind::Literal,
            Expression::Variable(_) => ExprKind::Variable,
            Expression::Lambda(_) => ExprKind::Lambda,
            Expression::Beta(_) => ExprKind::Beta,
            Expression::If(_) => ExprKind::If,
            Expression::Let(_) => ExprKind::Let,
            Expression::Primitive(_) => ExprKind::Primitive,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self.kind() {
            ExprKind::Literal => "literal",
            ExprKind::Variable => "variable",
            ExprKind::Lambda => "lambda",
            ExprKind::Beta => "application",
            ExprKind::If => "conditional",
            ExprKind::Let => "binding",
            ExprKind::Primitive => "primitive",
        }
    }

    /// A false literal is the only falsy value; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Expression::Literal(b) => *b,
            _ => true,
        }
    }

    /// Whether the value can stand in application head position.
    pub fn is_callable(&self) -> bool {
        matches!(self, Expression::Lambda(_) | Expression::Primitive(_))
    }
}

impl From<bool> for Expression {
    fn from(b: bool) -> Self {
        Expression::Literal(b)
    }
}

impl From<Variable> for Expression {
    fn from(var: Variable) -> Self {
        Expression::Variable(var)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(b) => write!(f, "{}", b),
            Expression::Variable(v) => write!(f, "{}", v),
            Expression::Primitive(token) => write!(f, "{}", token),
            Expression::Lambda(l) => {
                write!(f, "(lambda (")?;
                for (i, p) in l.params.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", p)?;
                }
                write!(f, ") {})", l.body)
            }
            Expression::Beta(b) => {
                write!(f, "({}", b.head)?;
                for arg in &b.args {
                    write!(f, " {}", arg)?;
                }
                for (k, v) in &b.kwargs {
                    write!(f, " :{} {}", k, v)?;
                }
                write!(f, ")")
            }
            Expression::If(i) => write!(
                f,
                "(if {} {} {})",
                i.condition, i.then_branch, i.else_branch
            ),
            Expression::Let(l) => {
                write!(f, "(let (")?;
                for (i, (k, v)) in l.bindings.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "({} {})", k, v)?;
                }
                write!(f, ") {})", l.body)
            }
        }
    }
}
