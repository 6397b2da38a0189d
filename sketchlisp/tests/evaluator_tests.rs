// Evaluator behavior: truth tables for the built-in targets, closure
// capture and shadowing, let recursion, and the terminal error taxonomy.

use indexmap::IndexMap;
use pretty_assertions::assert_eq;

use sketchlisp::{
    Environment, Evaluator, Expression, Lambda, PrimitiveToken, RuntimeError, StandardLibrary,
    Variable,
};

const BOOL_PAIRS: [(bool, bool); 4] = [(true, true), (true, false), (false, true), (false, false)];

fn eval(expr: &Expression) -> Result<Expression, RuntimeError> {
    Evaluator::new().evaluate(expr, &Environment::empty())
}

/// The OR target and its parameter variables.
fn or_parts() -> (Expression, Vec<Variable>) {
    let or = StandardLibrary::or_lambda();
    let params = match &or {
        Expression::Lambda(l) => l.params.clone(),
        other => panic!("or target should be a lambda, got {}", other),
    };
    (or, params)
}

#[test]
fn or_truth_table_positional() {
    let (or, _) = or_parts();
    for (a, b) in BOOL_PAIRS {
        let call = Expression::beta(or.clone(), vec![a.into(), b.into()]);
        assert_eq!(eval(&call).unwrap(), Expression::Literal(a || b));
    }
}

#[test]
fn or_truth_table_keyword() {
    let (or, params) = or_parts();
    for (a, b) in BOOL_PAIRS {
        let kwargs: IndexMap<Variable, Expression> = [
            (params[0].clone(), Expression::Literal(a)),
            (params[1].clone(), Expression::Literal(b)),
        ]
        .into_iter()
        .collect();
        let call = Expression::beta_with_kwargs(or.clone(), vec![], kwargs);
        assert_eq!(eval(&call).unwrap(), Expression::Literal(a || b));
    }
}

#[test]
fn nand_truth_table_positional() {
    let nand = Expression::Primitive(StandardLibrary::nand_token());
    for (a, b) in BOOL_PAIRS {
        let call = Expression::beta(nand.clone(), vec![a.into(), b.into()]);
        assert_eq!(eval(&call).unwrap(), Expression::Literal(!(a && b)));
    }
}

#[test]
fn nand_binds_keywords_by_display_name() {
    let nand = Expression::Primitive(StandardLibrary::nand_token());
    // fresh variables; only the display names line up with the native side
    let a = Variable::new("a");
    let b = Variable::new("b");
    for (av, bv) in BOOL_PAIRS {
        let kwargs: IndexMap<Variable, Expression> = [
            (a.clone(), Expression::Literal(av)),
            (b.clone(), Expression::Literal(bv)),
        ]
        .into_iter()
        .collect();
        let call = Expression::beta_with_kwargs(nand.clone(), vec![], kwargs);
        assert_eq!(eval(&call).unwrap(), Expression::Literal(!(av && bv)));
    }
}

#[test]
fn arguments_resolve_through_the_environment() {
    let (or, _) = or_parts();
    let a = Variable::new("a");
    let b = Variable::new("b");
    let call = Expression::beta(
        or,
        vec![Expression::Variable(a.clone()), Expression::Variable(b.clone())],
    );
    let env: Environment = [
        (a, Expression::Literal(true)),
        (b, Expression::Literal(false)),
    ]
    .into_iter()
    .collect();
    let result = Evaluator::new().evaluate(&call, &env).unwrap();
    assert_eq!(result, Expression::Literal(true));
}

/// A lambda escaping its parent application captures the outer parameters
/// it references; calling it later uses the captured bindings.
#[test]
fn escaped_lambda_closes_over_outer_parameters() {
    let (or, _) = or_parts();
    let a = Variable::new("a");
    let b = Variable::new("b");
    let c = Variable::new("c");

    let inner = Expression::lambda(
        vec![c.clone()],
        Expression::beta(
            or.clone(),
            vec![
                Expression::beta(
                    or.clone(),
                    vec![Expression::Variable(a.clone()), Expression::Variable(c.clone())],
                ),
                Expression::Variable(b.clone()),
            ],
        ),
        None,
    );
    let outer = Expression::lambda(vec![a.clone(), b.clone()], inner, None);

    let kwargs: IndexMap<Variable, Expression> =
        [(b.clone(), Expression::Literal(false))].into_iter().collect();
    let escaped = eval(&Expression::beta_with_kwargs(
        outer.clone(),
        vec![Expression::Literal(true)],
        kwargs,
    ))
    .unwrap();
    match &escaped {
        Expression::Lambda(l) => {
            assert!(l.closed.contains(&a));
            assert!(l.closed.contains(&b));
        }
        other => panic!("expected a sealed lambda, got {}", other),
    }

    for (av, bv, cv) in BOOL_PAIRS
        .iter()
        .flat_map(|&(a, b)| [(a, b, true), (a, b, false)])
    {
        let kwargs: IndexMap<Variable, Expression> =
            [(b.clone(), Expression::Literal(bv))].into_iter().collect();
        let call = Expression::beta(
            Expression::beta_with_kwargs(outer.clone(), vec![Expression::Literal(av)], kwargs),
            vec![Expression::Literal(cv)],
        );
        assert_eq!(eval(&call).unwrap(), Expression::Literal(av || bv || cv));
    }
}

/// Rebinding a parameter in an inner lambda shadows the outer binding.
#[test]
fn inner_parameter_shadows_outer_binding() {
    let (or, _) = or_parts();
    let a = Variable::new("a");
    let b = Variable::new("b");
    let c = Variable::new("c");

    let inner = Expression::lambda(
        vec![c.clone()],
        Expression::beta(
            or.clone(),
            vec![
                Expression::beta(
                    or,
                    vec![Expression::Variable(a.clone()), Expression::Variable(c.clone())],
                ),
                Expression::Variable(b.clone()),
            ],
        ),
        None,
    );
    let outer = Expression::lambda(vec![a, b, c], inner, None);

    let call = Expression::beta(
        Expression::beta(
            outer,
            vec![
                Expression::Literal(false),
                Expression::Literal(false),
                Expression::Literal(false),
            ],
        ),
        vec![Expression::Literal(true)],
    );
    assert_eq!(eval(&call).unwrap(), Expression::Literal(true));
}

#[test]
fn let_supports_recursive_bindings() {
    let (or, _) = or_parts();
    let a = Variable::new("a");
    let l = Variable::new("l");

    // l(a) = if a then a else l(or(true, a))
    let recursive = Expression::lambda(
        vec![a.clone()],
        Expression::if_expr(
            Expression::Variable(a.clone()),
            Expression::Variable(a.clone()),
            Expression::beta(
                Expression::Variable(l.clone()),
                vec![Expression::beta(
                    or,
                    vec![Expression::Literal(true), Expression::Variable(a.clone())],
                )],
            ),
        ),
        Some("recursive"),
    );
    let bindings: IndexMap<Variable, Expression> =
        [(l.clone(), recursive)].into_iter().collect();

    let call_in_body = Expression::let_expr(
        bindings.clone(),
        Expression::beta(Expression::Variable(l.clone()), vec![Expression::Literal(false)]),
    );
    assert_eq!(eval(&call_in_body).unwrap(), Expression::Literal(true));

    // returning the binding itself yields a lambda closed over the binding
    let escaped_binding = Expression::let_expr(bindings, Expression::Variable(l.clone()));
    match eval(&escaped_binding).unwrap() {
        Expression::Lambda(sealed) => assert!(sealed.closed.contains(&l)),
        other => panic!("expected a sealed lambda, got {}", other),
    }
    let applied = Expression::beta(escaped_binding, vec![Expression::Literal(false)]);
    assert_eq!(eval(&applied).unwrap(), Expression::Literal(true));
}

#[test]
fn missing_positional_argument_is_an_arity_mismatch() {
    let a = Variable::new("a");
    let b = Variable::new("b");
    let lambda = Expression::lambda(
        vec![a.clone(), b],
        Expression::Variable(a),
        Some("pair"),
    );
    let call = Expression::beta(lambda, vec![Expression::Literal(true)]);
    match eval(&call) {
        Err(RuntimeError::ArityMismatch { function, actual, .. }) => {
            assert_eq!(function, "pair");
            assert_eq!(actual, 1);
        }
        other => panic!("expected arity mismatch, got {:?}", other),
    }
}

#[test]
fn unbound_variable_is_terminal() {
    let ghost = Variable::new("ghost");
    match eval(&Expression::Variable(ghost.clone())) {
        Err(RuntimeError::UnboundVariable(var)) => assert_eq!(var, ghost),
        other => panic!("expected unbound variable, got {:?}", other),
    }
}

#[test]
fn literal_head_is_not_callable() {
    let call = Expression::beta(Expression::Literal(true), vec![]);
    assert!(matches!(
        eval(&call),
        Err(RuntimeError::NonCallableHead(Expression::Literal(true)))
    ));
}

#[test]
fn unregistered_token_is_an_unknown_primitive() {
    let mystery = PrimitiveToken::new("mystery", vec![]);
    let call = Expression::beta(Expression::Primitive(mystery.clone()), vec![]);
    match eval(&call) {
        Err(RuntimeError::UnknownPrimitive(token)) => assert_eq!(token, mystery),
        other => panic!("expected unknown primitive, got {:?}", other),
    }
}

#[test]
fn runaway_recursion_hits_the_depth_cap() {
    // omega: (lambda (f) (f f)) applied to itself
    let f = Variable::new("f");
    let omega = Expression::lambda(
        vec![f.clone()],
        Expression::beta(Expression::Variable(f.clone()), vec![Expression::Variable(f)]),
        Some("omega"),
    );
    let diverging = Expression::beta(omega.clone(), vec![omega]);
    let evaluator = Evaluator::new().with_recursion_limit(64);
    assert_eq!(
        evaluator.evaluate(&diverging, &Environment::empty()),
        Err(RuntimeError::RecursionLimit(64))
    );
}

#[test]
fn evaluating_a_lambda_seals_the_ambient_environment() {
    let a = Variable::new("a");
    let body = Expression::Variable(a.clone());
    let lambda = Expression::lambda(vec![], body, None);
    let env: Environment = [(a.clone(), Expression::Literal(true))].into_iter().collect();
    match Evaluator::new().evaluate(&lambda, &env).unwrap() {
        Expression::Lambda(sealed) => {
            assert_eq!(sealed.closed.get(&a), Some(&Expression::Literal(true)));
        }
        other => panic!("expected a sealed lambda, got {}", other),
    }
}

#[test]
fn sealed_bindings_win_over_ambient_ones() {
    let a = Variable::new("a");
    let sealed_env: Environment = [(a.clone(), Expression::Literal(true))].into_iter().collect();
    let lambda = Expression::Lambda(std::rc::Rc::new(Lambda {
        params: vec![],
        body: Expression::Variable(a.clone()),
        closed: sealed_env,
        name: None,
    }));
    // the ambient environment binds the same variable differently
    let ambient: Environment = [(a.clone(), Expression::Literal(false))].into_iter().collect();
    match Evaluator::new().evaluate(&lambda, &ambient).unwrap() {
        Expression::Lambda(resealed) => {
            assert_eq!(resealed.closed.get(&a), Some(&Expression::Literal(true)));
        }
        other => panic!("expected a sealed lambda, got {}", other),
    }
}
