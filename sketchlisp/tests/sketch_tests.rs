// Sketch move-set behavior: default installation, binding exclusivity,
// slot state machine, finish transitions and side constraints.

use sketchlisp::naming::WordList;
use sketchlisp::sketch::SlotView;
use sketchlisp::{
    ComponentReference, Connected, Expression, PlanKind, Sketch, SketchError, Slot,
    StandardLibrary,
};

fn nand_head() -> Connected {
    Connected::Expression(Expression::Primitive(StandardLibrary::nand_token()))
}

#[test]
fn start_installs_model_defaults() {
    let mut sketch = Sketch::new();

    let lambda = sketch.start(PlanKind::Lambda);
    let plan = sketch.plan(lambda).unwrap();
    assert_eq!(plan.part("variables"), Some(&Slot::Tuple(Vec::new())));
    assert!(matches!(
        plan.part("name"),
        Some(&Slot::Value(Connected::Text(_)))
    ));
    assert!(plan.part("body").is_none());
    assert!(!plan.finished());

    let beta = sketch.start(PlanKind::Beta);
    let plan = sketch.plan(beta).unwrap();
    assert!(matches!(plan.part("kwargs"), Some(&Slot::Mapping(_))));
    assert!(plan.part("head").is_none());
}

#[test]
fn slot_candidates_exclude_cosmetic_components() {
    let mut sketch = Sketch::new();
    let lambda = sketch.start(PlanKind::Lambda);
    let slots = sketch.slot_candidates(lambda).unwrap();
    let names: Vec<&str> = slots.iter().map(|s| s.component()).collect();
    assert_eq!(names, vec!["variables", "body"]);
}

#[test]
fn tuple_connection_binds_variables_exclusively() {
    let mut sketch = Sketch::new();
    let first = sketch.declare_variable();
    let second = sketch.declare_variable();
    let lambda = sketch.start(PlanKind::Lambda);
    let variables_slot = ComponentReference::new(lambda, "variables");

    sketch
        .connect(&variables_slot, vec![Connected::Variable(first.clone())])
        .unwrap();
    assert_eq!(sketch.binding_site(&first), Some(lambda));

    // consumed variables disappear from every unbound pool
    let remaining = sketch.unbound_variables();
    assert!(!remaining.contains(&first));
    assert!(remaining.contains(&second));

    // and cannot be bound a second time
    let let_plan = sketch.start(PlanKind::Let);
    let bindings_slot = ComponentReference::new(let_plan, "bindings");
    let rebind = sketch.connect(
        &bindings_slot,
        vec![Connected::Variable(first.clone()), Connected::Truth(true)],
    );
    assert_eq!(rebind, Err(SketchError::VariableAlreadyBound(first)));
}

#[test]
fn scalar_slot_rejects_reconnection() {
    let mut sketch = Sketch::new();
    let plan = sketch.start(PlanKind::If);
    let condition = ComponentReference::new(plan, "condition");

    sketch.connect(&condition, vec![Connected::Truth(true)]).unwrap();
    let second = sketch.connect(&condition, vec![Connected::Truth(false)]);
    assert_eq!(
        second,
        Err(SketchError::AlreadyConnected {
            plan,
            component: "condition".to_string(),
        })
    );
    // the rejected move changed nothing
    assert_eq!(
        sketch.read(&condition).unwrap(),
        SlotView::Slot(&Slot::Value(Connected::Truth(true)))
    );
}

#[test]
fn if_plan_finishes_in_any_slot_order() {
    let component_orders = [
        ["condition", "then_branch", "else_branch"],
        ["condition", "else_branch", "then_branch"],
        ["then_branch", "condition", "else_branch"],
        ["then_branch", "else_branch", "condition"],
        ["else_branch", "condition", "then_branch"],
        ["else_branch", "then_branch", "condition"],
    ];
    for order in component_orders {
        let mut sketch = Sketch::new();
        let plan = sketch.start(PlanKind::If);
        for (index, component) in order.iter().enumerate() {
            assert!(!sketch.is_finished(plan));
            let slot = ComponentReference::new(plan, *component);
            sketch.connect(&slot, vec![Connected::Truth(index == 0)]).unwrap();
        }
        assert!(sketch.is_finished(plan), "order {:?}", order);
    }
}

#[test]
fn finished_plans_accept_no_further_connections() {
    let mut sketch = Sketch::new();
    let plan = sketch.start(PlanKind::If);
    for component in ["condition", "then_branch", "else_branch"] {
        let slot = ComponentReference::new(plan, component);
        sketch.connect(&slot, vec![Connected::Truth(true)]).unwrap();
    }
    assert!(sketch.is_finished(plan));

    let kwargs_like = ComponentReference::new(plan, "condition");
    assert_eq!(
        sketch.connect(&kwargs_like, vec![Connected::Truth(false)]),
        Err(SketchError::AlreadyFinished(plan))
    );
}

#[test]
fn primitive_callee_finishes_once_keywords_cover_its_parameters() {
    // variable display names line up with the nand parameters
    let mut sketch = Sketch::with_names(Box::new(WordList::from_lines(["a", "b"])));
    let a = sketch.declare_variable();
    let b = sketch.declare_variable();

    let beta = sketch.start(PlanKind::Beta);
    let head = ComponentReference::new(beta, "head");
    let kwargs = ComponentReference::new(beta, "kwargs");

    sketch.connect(&head, vec![nand_head()]).unwrap();
    // structurally full, but the side constraint still fails
    assert!(!sketch.is_finished(beta));
    assert!(sketch.is_stuck(beta));

    sketch
        .connect(&kwargs, vec![Connected::Variable(a), Connected::Truth(true)])
        .unwrap();
    assert!(sketch.is_stuck(beta));

    sketch
        .connect(&kwargs, vec![Connected::Variable(b), Connected::Truth(false)])
        .unwrap();
    assert!(sketch.is_finished(beta));
    assert!(!sketch.is_stuck(beta));
}

#[test]
fn primitive_callee_with_unrelated_keywords_stays_stuck() {
    let mut sketch = Sketch::new(); // built-in cosmetic names, none of them "a"/"b"
    let var = sketch.declare_variable();
    let beta = sketch.start(PlanKind::Beta);

    sketch
        .connect(&ComponentReference::new(beta, "head"), vec![nand_head()])
        .unwrap();
    sketch
        .connect(
            &ComponentReference::new(beta, "kwargs"),
            vec![Connected::Variable(var), Connected::Truth(true)],
        )
        .unwrap();

    assert!(!sketch.is_finished(beta));
    assert!(sketch.is_stuck(beta));
    // the head slot is occupied, so the callee can never be swapped out
    assert_eq!(
        sketch.connect(&ComponentReference::new(beta, "head"), vec![nand_head()]),
        Err(SketchError::AlreadyConnected {
            plan: beta,
            component: "head".to_string(),
        })
    );
}

#[test]
fn nested_references_read_into_tuples_and_mappings() {
    let mut sketch = Sketch::with_names(Box::new(WordList::from_lines(["a", "b"])));
    let a = sketch.declare_variable();
    let b = sketch.declare_variable();

    let lambda = sketch.start(PlanKind::Lambda);
    sketch
        .connect(
            &ComponentReference::new(lambda, "variables"),
            vec![Connected::Variable(a.clone())],
        )
        .unwrap();
    match sketch
        .read(&ComponentReference::nested(
            lambda,
            vec!["variables".to_string(), "0".to_string()],
        ))
        .unwrap()
    {
        SlotView::TupleElement(var) => assert_eq!(var, &a),
        other => panic!("expected a tuple element, got {:?}", other),
    }

    let let_plan = sketch.start(PlanKind::Let);
    sketch
        .connect(
            &ComponentReference::new(let_plan, "bindings"),
            vec![Connected::Variable(b.clone()), Connected::Truth(false)],
        )
        .unwrap();
    match sketch
        .read(&ComponentReference::nested(
            let_plan,
            vec!["bindings".to_string(), "b".to_string()],
        ))
        .unwrap()
    {
        SlotView::MappingEntry(key, value) => {
            assert_eq!(key, &b);
            assert_eq!(value, &Connected::Truth(false));
        }
        other => panic!("expected a mapping entry, got {:?}", other),
    }
}

#[test]
fn callable_pool_offers_only_lambda_shaped_values() {
    let mut sketch = Sketch::new();
    sketch.declare_variable();
    let lambda_plan = sketch.start(PlanKind::Lambda);
    let if_plan = sketch.start(PlanKind::If);
    let beta = sketch.start(PlanKind::Beta);

    let pools = sketch
        .plug_candidates(&ComponentReference::new(beta, "head"))
        .unwrap();
    let values = match pools {
        sketchlisp::PlugCandidates::Value { values } => values,
        other => panic!("head slot should offer a value pool, got {:?}", other),
    };

    assert!(values.contains(&Connected::Plan(lambda_plan)));
    assert!(values.iter().any(
        |v| matches!(v, Connected::Expression(Expression::Primitive(token)) if token.name() == "nand")
    ));
    assert!(!values.contains(&Connected::Plan(if_plan)));
    assert!(!values.contains(&Connected::Truth(true)));
    assert!(!values
        .iter()
        .any(|v| matches!(v, Connected::Variable(_))));
}
