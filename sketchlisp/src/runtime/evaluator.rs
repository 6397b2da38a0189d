// Sketchlisp evaluator - reduces a closed expression plus an environment
// to a value, with closures and recursive binding.

use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::{Beta, Expression, Lambda, LetExpr, Variable};
use crate::runtime::environment::Environment;
use crate::runtime::error::{RuntimeError, RuntimeResult};
use crate::runtime::stdlib::{PrimitiveRegistry, StandardLibrary};

const DEFAULT_RECURSION_LIMIT: usize = 1000;

pub struct Evaluator {
    registry: Rc<PrimitiveRegistry>,
    recursion_limit: usize,
}

impl Evaluator {
    /// Evaluator with the standard native registry.
    pub fn new() -> Self {
        Self::with_registry(Rc::new(StandardLibrary::create_registry()))
    }

    pub fn with_registry(registry: Rc<PrimitiveRegistry>) -> Self {
        Evaluator {
            registry,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
        }
    }

    /// Synthesized programs can diverge; the depth cap turns runaway
    /// recursion into a terminal error instead of a stack overflow.
    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit;
        self
    }

    /// Reduce `expr` against `env`. Any failure is terminal for this call.
    pub fn evaluate(&self, expr: &Expression, env: &Environment) -> RuntimeResult<Expression> {
        self.eval_expr(expr, env, 0)
    }

    fn eval_expr(
        &self,
        expr: &Expression,
        env: &Environment,
        depth: usize,
    ) -> RuntimeResult<Expression> {
        if depth >= self.recursion_limit {
            return Err(RuntimeError::RecursionLimit(self.recursion_limit));
        }
        match expr {
            Expression::Literal(_) | Expression::Primitive(_) => Ok(expr.clone()),
            Expression::Variable(var) => env.lookup(var),
            Expression::Lambda(lambda) => Ok(self.seal_lambda(lambda, env)),
            Expression::If(if_expr) => {
                let condition = self.eval_expr(&if_expr.condition, env, depth + 1)?;
                if condition.is_truthy() {
                    self.eval_expr(&if_expr.then_branch, env, depth + 1)
                } else {
                    self.eval_expr(&if_expr.else_branch, env, depth + 1)
                }
            }
            Expression::Beta(beta) => self.eval_beta(beta, env, depth),
            Expression::Let(let_expr) => self.eval_let(let_expr, env, depth),
        }
    }

    /// Seal the ambient environment into the lambda. Already-captured
    /// bindings win over ambient ones, and sealing happens exactly once
    /// per evaluation of the lambda as a value, which is what turns the
    /// otherwise dynamic variable lookup into lexical closure behavior.
    fn seal_lambda(&self, lambda: &Lambda, env: &Environment) -> Expression {
        Expression::Lambda(Rc::new(Lambda {
            params: lambda.params.clone(),
            body: lambda.body.clone(),
            closed: env.merged(&lambda.closed),
            name: lambda.name.clone(),
        }))
    }

    fn eval_beta(&self, beta: &Beta, env: &Environment, depth: usize) -> RuntimeResult<Expression> {
        let head = self.eval_expr(&beta.head, env, depth + 1)?;
        let args = beta
            .args
            .iter()
            .map(|arg| self.eval_expr(arg, env, depth + 1))
            .collect::<RuntimeResult<Vec<_>>>()?;
        let kwargs = beta
            .kwargs
            .iter()
            .map(|(k, v)| Ok((k.clone(), self.eval_expr(v, env, depth + 1)?)))
            .collect::<RuntimeResult<Vec<(Variable, Expression)>>>()?;

        match head {
            Expression::Lambda(lambda) => {
                self.check_lambda_arity(&lambda, &args, &kwargs)?;
                let child = lambda
                    .closed
                    .merged_pairs(lambda.params.iter().cloned().zip(args))
                    .merged_pairs(kwargs);
                self.eval_expr(&lambda.body, &child, depth + 1)
            }
            Expression::Primitive(token) => {
                let native = self
                    .registry
                    .lookup(&token)
                    .ok_or_else(|| RuntimeError::UnknownPrimitive(token.clone()))?;
                let supplied = args.len() + kwargs.len();
                if !native.arity.accepts(supplied) {
                    return Err(RuntimeError::ArityMismatch {
                        function: native.name.clone(),
                        expected: native.arity.to_string(),
                        actual: supplied,
                    });
                }
                let by_name: HashMap<String, Expression> = kwargs
                    .into_iter()
                    .map(|(k, v)| (k.name().to_string(), v))
                    .collect();
                (native.func)(&args, &by_name)
            }
            other => Err(RuntimeError::NonCallableHead(other)),
        }
    }

    /// Every parameter must be supplied, positionally or by keyword;
    /// silently truncating or padding would let ill-applied lambdas pass.
    fn check_lambda_arity(
        &self,
        lambda: &Lambda,
        args: &[Expression],
        kwargs: &[(Variable, Expression)],
    ) -> RuntimeResult<()> {
        let unsatisfied = lambda
            .params
            .iter()
            .enumerate()
            .any(|(i, param)| i >= args.len() && !kwargs.iter().any(|(k, _)| k == param));
        if unsatisfied {
            return Err(RuntimeError::ArityMismatch {
                function: lambda
                    .name
                    .clone()
                    .unwrap_or_else(|| "#<lambda>".to_string()),
                expected: lambda.params.len().to_string(),
                actual: args.len() + kwargs.len(),
            });
        }
        Ok(())
    }

    /// A `let` expands to an application of a lambda over its bindings,
    /// evaluated under an environment where every binding is already
    /// visible. Initializers can therefore reference any sibling binding,
    /// including themselves: evaluating a lambda initializer only seals
    /// its environment, it never runs the body eagerly.
    fn eval_let(
        &self,
        let_expr: &LetExpr,
        env: &Environment,
        depth: usize,
    ) -> RuntimeResult<Expression> {
        let params: Vec<Variable> = let_expr.bindings.keys().cloned().collect();
        let inits: Vec<Expression> = let_expr.bindings.values().cloned().collect();
        let let_lambda = Expression::Lambda(Rc::new(Lambda {
            params,
            body: let_expr.body.clone(),
            closed: env.clone(),
            name: Some("let".to_string()),
        }));
        let child = env.merged_pairs(
            let_expr
                .bindings
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        self.eval_expr(&Expression::beta(let_lambda, inits), &child, depth + 1)
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}
