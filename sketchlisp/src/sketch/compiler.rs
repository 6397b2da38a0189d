// Plan compiler: memoized, cycle-safe reduction of the mutable plan graph
// into immutable expressions plus well-formedness flags.
//
// Malformed, incomplete or cyclic plans never raise; they compile to
// `(None, false)` entries. Synthesis search has to be able to walk through
// such states, so failure here is a value, not an error.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use indexmap::IndexMap;

use crate::ast::{Beta, Expression, IfExpr, Lambda, LetExpr, Variable};
use crate::model::{model_for, PlanKind, ValueCategory};
use crate::runtime::environment::Environment;
use crate::sketch::plan::{Connected, PlanId, Slot};
use crate::sketch::state::Sketch;

/// Outcome for a single plan: the expression it materialized into (when
/// construction was possible at all) and whether every sub-part resolved
/// cleanly. An ill-typed but constructible plan keeps its expression as a
/// diagnostic witness alongside `well_formed = false`.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledPlan {
    pub expression: Option<Expression>,
    pub well_formed: bool,
}

impl CompiledPlan {
    fn ill_formed() -> Self {
        CompiledPlan {
            expression: None,
            well_formed: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Compilation {
    /// Every plan the traversal touched, keyed by identity.
    pub memo: HashMap<PlanId, CompiledPlan>,
    /// Expressions of the well-formed finished plans, in finish order.
    pub well_formed: Vec<Expression>,
}

/// Compile every finished plan of the sketch. The traversal is read-only:
/// compiling twice yields structurally equal results.
pub fn compile_sketch(sketch: &Sketch) -> Compilation {
    let mut memo: HashMap<PlanId, CompiledPlan> = HashMap::new();
    let mut trace: HashSet<PlanId> = HashSet::new();
    let finished: Vec<PlanId> = sketch.finished_plans().collect();
    for id in &finished {
        resolve_plan(sketch, *id, &mut memo, &mut trace);
    }
    let well_formed = finished
        .iter()
        .filter_map(|id| memo.get(id))
        .filter(|entry| entry.well_formed)
        .filter_map(|entry| entry.expression.clone())
        .collect();
    Compilation { memo, well_formed }
}

/// Resolve one plan. Shared sub-plans resolve exactly once: every consumer
/// observes the same expression instance, not merely an equal one, which
/// later identity-sensitive evaluation relies on.
fn resolve_plan(
    sketch: &Sketch,
    id: PlanId,
    memo: &mut HashMap<PlanId, CompiledPlan>,
    trace: &mut HashSet<PlanId>,
) -> CompiledPlan {
    if let Some(entry) = memo.get(&id) {
        return entry.clone();
    }
    if trace.contains(&id) {
        // Cycle: terminate here without recursing and without an error.
        // Not memoized; the node's own entry is written when its
        // resolution completes.
        return CompiledPlan::ill_formed();
    }
    if !sketch.is_finished(id) {
        let entry = CompiledPlan::ill_formed();
        memo.insert(id, entry.clone());
        return entry;
    }
    let plan = match sketch.plan(id) {
        Some(plan) => plan,
        None => {
            let entry = CompiledPlan::ill_formed();
            memo.insert(id, entry.clone());
            return entry;
        }
    };

    trace.insert(id);
    let model = model_for(plan.head());

    let mut exprs: HashMap<&str, Expression> = HashMap::new();
    let mut tuples: HashMap<&str, Vec<Variable>> = HashMap::new();
    let mut mappings: HashMap<&str, IndexMap<Variable, Expression>> = HashMap::new();
    let mut texts: HashMap<&str, String> = HashMap::new();
    let mut ok = true;
    let mut complete = true;

    for (name, slot) in plan.parts() {
        let category = match model.component(name) {
            Some(component) => component.category,
            None => {
                ok = false;
                complete = false;
                continue;
            }
        };
        match (category, slot) {
            (ValueCategory::SubExpression, Slot::Value(value))
            | (ValueCategory::CallableRef, Slot::Value(value)) => {
                let (resolved, flag) = resolve_value(sketch, value, memo, trace);
                ok &= flag;
                match resolved {
                    Some(expr) => {
                        if category == ValueCategory::CallableRef && !expr.is_callable() {
                            ok = false;
                        }
                        exprs.insert(name.as_str(), expr);
                    }
                    None => complete = false,
                }
            }
            (ValueCategory::VariableTuple, Slot::Tuple(vars)) => {
                // the typed slot already guarantees every element is a variable
                tuples.insert(name.as_str(), vars.clone());
            }
            (ValueCategory::VariableMapping, Slot::Mapping(mapping)) => {
                let mut rebuilt = IndexMap::new();
                let mut all_resolved = true;
                for (key, value) in mapping {
                    let (resolved, flag) = resolve_value(sketch, value, memo, trace);
                    ok &= flag;
                    match resolved {
                        Some(expr) => {
                            rebuilt.insert(key.clone(), expr);
                        }
                        None => all_resolved = false,
                    }
                }
                if all_resolved {
                    mappings.insert(name.as_str(), rebuilt);
                } else {
                    complete = false;
                }
            }
            (ValueCategory::Text, Slot::Value(Connected::Text(text))) => {
                texts.insert(name.as_str(), text.clone());
            }
            _ => {
                ok = false;
                complete = false;
            }
        }
    }

    let expression = if complete {
        build_expression(plan.head(), &exprs, &tuples, &mappings, &texts)
    } else {
        None
    };
    let entry = CompiledPlan {
        well_formed: ok && expression.is_some(),
        expression,
    };
    memo.insert(id, entry.clone());
    trace.remove(&id);
    entry
}

/// Resolve a connected value. Non-plan references resolve to themselves.
fn resolve_value(
    sketch: &Sketch,
    value: &Connected,
    memo: &mut HashMap<PlanId, CompiledPlan>,
    trace: &mut HashSet<PlanId>,
) -> (Option<Expression>, bool) {
    match value {
        Connected::Truth(b) => (Some(Expression::Literal(*b)), true),
        Connected::Variable(var) => (Some(Expression::Variable(var.clone())), true),
        Connected::Expression(expr) => (Some(expr.clone()), true),
        Connected::Plan(id) => {
            let entry = resolve_plan(sketch, *id, memo, trace);
            (entry.expression, entry.well_formed)
        }
        // a bare display string is not an expression
        Connected::Text(_) => (None, false),
    }
}

/// Invoke the kind's constructor over the resolved components.
fn build_expression(
    kind: PlanKind,
    exprs: &HashMap<&str, Expression>,
    tuples: &HashMap<&str, Vec<Variable>>,
    mappings: &HashMap<&str, IndexMap<Variable, Expression>>,
    texts: &HashMap<&str, String>,
) -> Option<Expression> {
    match kind {
        PlanKind::Lambda => {
            let params = tuples.get("variables")?;
            let body = exprs.get("body")?;
            Some(Expression::Lambda(Rc::new(Lambda {
                params: params.clone(),
                body: body.clone(),
                closed: Environment::empty(),
                name: texts.get("name").cloned(),
            })))
        }
        PlanKind::Beta => {
            let head = exprs.get("head")?;
            Some(Expression::Beta(Rc::new(Beta {
                head: head.clone(),
                args: Vec::new(),
                kwargs: mappings.get("kwargs").cloned().unwrap_or_default(),
            })))
        }
        PlanKind::If => Some(Expression::If(Rc::new(IfExpr {
            condition: exprs.get("condition")?.clone(),
            then_branch: exprs.get("then_branch")?.clone(),
            else_branch: exprs.get("else_branch")?.clone(),
        }))),
        PlanKind::Let => {
            let bindings = mappings.get("bindings")?;
            let body = exprs.get("body")?;
            Some(Expression::Let(Rc::new(LetExpr {
                bindings: bindings.clone(),
                body: body.clone(),
            })))
        }
    }
}
