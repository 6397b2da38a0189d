// The sketch: the single mutable aggregate of the construction state.
// All plan mutation flows through its move set. Moves that are rejected
// leave the state untouched.

use std::collections::HashMap;

use indexmap::{IndexMap, IndexSet};
use thiserror::Error;

use crate::ast::{Expression, Variable};
use crate::model::{model_for, DefaultInit, PlanKind, ValueCategory};
use crate::naming::{NameSource, WordList};
use crate::runtime::stdlib::StandardLibrary;
use crate::runtime::validator::UsableVocabulary;
use crate::sketch::plan::{ComponentReference, Connected, ExpressionPlan, PlanId, Slot};

/// Structural misuse of the move API. Distinct from evaluation errors:
/// these are rejected moves, and a rejected move mutates nothing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SketchError {
    #[error("unknown plan: {0}")]
    UnknownPlan(PlanId),

    #[error("unknown component {component} on {plan}")]
    UnknownComponent { plan: PlanId, component: String },

    #[error("component {component} on {plan} is already connected")]
    AlreadyConnected { plan: PlanId, component: String },

    #[error("{0} is already finished")]
    AlreadyFinished(PlanId),

    #[error("variable {0} is already bound")]
    VariableAlreadyBound(Variable),

    #[error("component {component} expects {expected}")]
    CategoryMismatch {
        component: String,
        expected: String,
    },
}

pub type SketchResult<T> = Result<T, SketchError>;

/// Legal values for a slot, shaped by its declared category. Empty pools
/// signal "no legal move here" to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum PlugCandidates {
    /// One or more of these unbound variables may be appended.
    Tuple { variables: Vec<Variable> },
    /// A key from the unbound-variable pool paired with any general value.
    Mapping {
        keys: Vec<Variable>,
        values: Vec<Connected>,
    },
    /// Exactly one of these values may be connected.
    Value { values: Vec<Connected> },
}

impl PlugCandidates {
    pub fn is_empty(&self) -> bool {
        match self {
            PlugCandidates::Tuple { variables } => variables.is_empty(),
            PlugCandidates::Mapping { keys, values } => keys.is_empty() || values.is_empty(),
            PlugCandidates::Value { values } => values.is_empty(),
        }
    }
}

/// Read view of an addressed slot, covering nested tuple/mapping access.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotView<'a> {
    Slot(&'a Slot),
    TupleElement(&'a Variable),
    MappingEntry(&'a Variable, &'a Connected),
}

#[derive(Debug)]
pub struct Sketch {
    plans: IndexMap<PlanId, ExpressionPlan>,
    next_id: u64,
    unfinished: IndexSet<PlanId>,
    finished: IndexSet<PlanId>,
    variables: Vec<Variable>,
    bound: HashMap<Variable, PlanId>,
    names: Box<dyn NameSource>,
    vocabulary: UsableVocabulary,
}

impl Sketch {
    pub fn new() -> Self {
        Self::with_names(Box::new(WordList::builtin()))
    }

    pub fn with_names(names: Box<dyn NameSource>) -> Self {
        Sketch {
            plans: IndexMap::new(),
            next_id: 0,
            unfinished: IndexSet::new(),
            finished: IndexSet::new(),
            variables: Vec::new(),
            bound: HashMap::new(),
            names,
            vocabulary: StandardLibrary::default_vocabulary(),
        }
    }

    /// Replace the vocabulary offered through the general plug pool.
    pub fn with_vocabulary(mut self, vocabulary: UsableVocabulary) -> Self {
        self.vocabulary = vocabulary;
        self
    }

    /// Allocate a new unfinished plan of the given kind, eagerly
    /// installing every component default the model declares.
    pub fn start(&mut self, kind: PlanKind) -> PlanId {
        let id = PlanId::new(self.next_id);
        self.next_id += 1;
        let mut plan = ExpressionPlan::new(id, kind);
        for component in &model_for(kind).components {
            if let Some(default) = component.default {
                let slot = match default {
                    DefaultInit::EmptyTuple => Slot::Tuple(Vec::new()),
                    DefaultInit::EmptyMapping => Slot::Mapping(IndexMap::new()),
                    DefaultInit::FreshName => Slot::Value(Connected::Text(self.names.fresh_name())),
                };
                plan.insert_part(component.name, slot);
            }
        }
        log::debug!("started {} {}", kind, id);
        self.plans.insert(id, plan);
        self.unfinished.insert(id);
        id
    }

    /// Create a fresh, cosmetically named variable. It is known to the
    /// sketch but bound to nothing yet.
    pub fn declare_variable(&mut self) -> Variable {
        let var = Variable::new(&self.names.fresh_name());
        self.variables.push(var.clone());
        var
    }

    /// Every addressable component of the plan, excluding bookkeeping
    /// ones (cosmetic text scalars), addressed at depth 1. This is the
    /// enumeration surface a construction driver chooses from.
    pub fn slot_candidates(&self, plan: PlanId) -> SketchResult<Vec<ComponentReference>> {
        let node = self.plans.get(&plan).ok_or(SketchError::UnknownPlan(plan))?;
        Ok(model_for(node.head())
            .components
            .iter()
            .filter(|c| c.category != ValueCategory::Text)
            .map(|c| ComponentReference::new(plan, c.name))
            .collect())
    }

    /// Pools of legal values for the slot, shaped by its category.
    pub fn plug_candidates(&self, slot: &ComponentReference) -> SketchResult<PlugCandidates> {
        let node = self
            .plans
            .get(&slot.plan())
            .ok_or(SketchError::UnknownPlan(slot.plan()))?;
        let component = model_for(node.head())
            .component(slot.component())
            .ok_or_else(|| SketchError::UnknownComponent {
                plan: slot.plan(),
                component: slot.component().to_string(),
            })?;
        Ok(match component.category {
            ValueCategory::VariableTuple => PlugCandidates::Tuple {
                variables: self.unbound_variables(),
            },
            ValueCategory::VariableMapping => PlugCandidates::Mapping {
                keys: self.unbound_variables(),
                values: self.general_pool(),
            },
            ValueCategory::CallableRef => PlugCandidates::Value {
                values: self
                    .general_pool()
                    .into_iter()
                    .filter(|v| self.is_lambda_shaped(v))
                    .collect(),
            },
            ValueCategory::SubExpression | ValueCategory::Text => PlugCandidates::Value {
                values: self.general_pool(),
            },
        })
    }

    /// Install values into the slot per its category. Scalar slots accept
    /// exactly one value and only while empty; tuple slots append one or
    /// more unbound variables and record their binding sites; mapping
    /// slots insert a single key/value pair. A connect that completes the
    /// plan's required components triggers the finish check.
    pub fn connect(&mut self, slot: &ComponentReference, values: Vec<Connected>) -> SketchResult<()> {
        let id = slot.plan();
        let node = self.plans.get(&id).ok_or(SketchError::UnknownPlan(id))?;
        if node.finished() {
            return Err(SketchError::AlreadyFinished(id));
        }
        if slot.path().len() != 1 {
            // writes address the depth-1 enumeration surface
            return Err(SketchError::UnknownComponent {
                plan: id,
                component: slot.path().join("."),
            });
        }
        let component = model_for(node.head())
            .component(slot.component())
            .ok_or_else(|| SketchError::UnknownComponent {
                plan: id,
                component: slot.component().to_string(),
            })?;
        let name = component.name;

        match component.category {
            ValueCategory::VariableTuple => {
                if values.is_empty() {
                    return Err(SketchError::CategoryMismatch {
                        component: name.to_string(),
                        expected: "one or more unbound variables".to_string(),
                    });
                }
                let mut vars = Vec::with_capacity(values.len());
                for value in values {
                    match value {
                        Connected::Variable(v) => vars.push(v),
                        _ => {
                            return Err(SketchError::CategoryMismatch {
                                component: name.to_string(),
                                expected: "one or more unbound variables".to_string(),
                            })
                        }
                    }
                }
                for var in &vars {
                    if self.bound.contains_key(var) {
                        return Err(SketchError::VariableAlreadyBound(var.clone()));
                    }
                }
                let fresh = match node.part(name) {
                    None => true,
                    Some(Slot::Tuple(_)) => false,
                    Some(_) => {
                        return Err(SketchError::CategoryMismatch {
                            component: name.to_string(),
                            expected: "a variable tuple slot".to_string(),
                        })
                    }
                };
                let node = self.plans.get_mut(&id).ok_or(SketchError::UnknownPlan(id))?;
                if fresh {
                    node.insert_part(name, Slot::Tuple(vars.clone()));
                } else if let Some(Slot::Tuple(tuple)) = node.part_mut(name) {
                    tuple.extend(vars.iter().cloned());
                }
                for var in vars {
                    self.bound.insert(var, id);
                }
            }
            ValueCategory::VariableMapping => {
                if values.len() != 2 {
                    return Err(SketchError::CategoryMismatch {
                        component: name.to_string(),
                        expected: "a key variable followed by one value".to_string(),
                    });
                }
                let mut pair = values.into_iter();
                let key = match pair.next() {
                    Some(Connected::Variable(v)) => v,
                    _ => {
                        return Err(SketchError::CategoryMismatch {
                            component: name.to_string(),
                            expected: "an unbound variable as the key".to_string(),
                        })
                    }
                };
                let value = match pair.next() {
                    Some(Connected::Text(_)) | None => {
                        return Err(SketchError::CategoryMismatch {
                            component: name.to_string(),
                            expected: "an expression-shaped value".to_string(),
                        })
                    }
                    Some(value) => value,
                };
                if self.bound.contains_key(&key) {
                    return Err(SketchError::VariableAlreadyBound(key));
                }
                let fresh = match node.part(name) {
                    None => true,
                    Some(Slot::Mapping(_)) => false,
                    Some(_) => {
                        return Err(SketchError::CategoryMismatch {
                            component: name.to_string(),
                            expected: "a variable mapping slot".to_string(),
                        })
                    }
                };
                let node = self.plans.get_mut(&id).ok_or(SketchError::UnknownPlan(id))?;
                if fresh {
                    let mut mapping = IndexMap::new();
                    mapping.insert(key.clone(), value);
                    node.insert_part(name, Slot::Mapping(mapping));
                } else if let Some(Slot::Mapping(mapping)) = node.part_mut(name) {
                    mapping.insert(key.clone(), value);
                }
                self.bound.insert(key, id);
            }
            ValueCategory::SubExpression | ValueCategory::CallableRef | ValueCategory::Text => {
                if values.len() != 1 {
                    return Err(SketchError::CategoryMismatch {
                        component: name.to_string(),
                        expected: "exactly one value".to_string(),
                    });
                }
                let value = match values.into_iter().next() {
                    Some(value) => value,
                    None => {
                        return Err(SketchError::CategoryMismatch {
                            component: name.to_string(),
                            expected: "exactly one value".to_string(),
                        })
                    }
                };
                if component.category == ValueCategory::Text && !matches!(value, Connected::Text(_))
                {
                    return Err(SketchError::CategoryMismatch {
                        component: name.to_string(),
                        expected: "a display string".to_string(),
                    });
                }
                match node.part(name) {
                    Some(Slot::Value(_)) => {
                        return Err(SketchError::AlreadyConnected {
                            plan: id,
                            component: name.to_string(),
                        })
                    }
                    Some(_) => {
                        return Err(SketchError::CategoryMismatch {
                            component: name.to_string(),
                            expected: "a single-value slot".to_string(),
                        })
                    }
                    None => {}
                }
                let node = self.plans.get_mut(&id).ok_or(SketchError::UnknownPlan(id))?;
                node.insert_part(name, Slot::Value(value));
            }
        }

        log::debug!("connected {}", slot);
        self.refresh_finished(id);
        Ok(())
    }

    /// Resolve a component reference for reading, including nested
    /// addressing into tuple elements (by index) and mapping entries (by
    /// key display name).
    pub fn read(&self, slot: &ComponentReference) -> SketchResult<SlotView<'_>> {
        let node = self
            .plans
            .get(&slot.plan())
            .ok_or(SketchError::UnknownPlan(slot.plan()))?;
        let path = slot.path();
        let unknown = || SketchError::UnknownComponent {
            plan: slot.plan(),
            component: path.join("."),
        };
        let first = path.first().ok_or_else(unknown)?;
        let part = node.part(first).ok_or_else(unknown)?;
        match path.len() {
            1 => Ok(SlotView::Slot(part)),
            2 => match part {
                Slot::Tuple(vars) => path[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| vars.get(i))
                    .map(SlotView::TupleElement)
                    .ok_or_else(unknown),
                Slot::Mapping(mapping) => mapping
                    .iter()
                    .find(|(k, _)| k.name() == path[1])
                    .map(|(k, v)| SlotView::MappingEntry(k, v))
                    .ok_or_else(unknown),
                Slot::Value(_) => Err(unknown()),
            },
            _ => Err(unknown()),
        }
    }

    pub fn plan(&self, id: PlanId) -> Option<&ExpressionPlan> {
        self.plans.get(&id)
    }

    pub fn plans(&self) -> impl Iterator<Item = &ExpressionPlan> {
        self.plans.values()
    }

    pub fn finished_plans(&self) -> impl Iterator<Item = PlanId> + '_ {
        self.finished.iter().copied()
    }

    pub fn unfinished_plans(&self) -> impl Iterator<Item = PlanId> + '_ {
        self.unfinished.iter().copied()
    }

    pub fn is_finished(&self, id: PlanId) -> bool {
        self.finished.contains(&id)
    }

    /// Structurally full but blocked by a failed side constraint. Such a
    /// plan can stay unfinished forever if its occupied slots admit no
    /// further connection that would satisfy the constraint; this is a
    /// legitimate dead end for the search, not an error.
    pub fn is_stuck(&self, id: PlanId) -> bool {
        match self.plans.get(&id) {
            Some(plan) => {
                !plan.finished()
                    && plan.structurally_full()
                    && !self.side_constraints_satisfied(plan)
            }
            None => false,
        }
    }

    pub fn known_variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn unbound_variables(&self) -> Vec<Variable> {
        self.variables
            .iter()
            .filter(|v| !self.bound.contains_key(*v))
            .cloned()
            .collect()
    }

    /// The plan that bound the variable, if any.
    pub fn binding_site(&self, var: &Variable) -> Option<PlanId> {
        self.bound.get(var).copied()
    }

    /// The general value pool: boolean literals, vocabulary values,
    /// unbound variables, and every plan, finished or not. Cross-plan
    /// references are unrestricted, so a plan may come to reference an
    /// ancestor of itself; the compiler's cycle guard copes with that.
    fn general_pool(&self) -> Vec<Connected> {
        let mut pool = vec![Connected::Truth(true), Connected::Truth(false)];
        for value in self.vocabulary.values() {
            if !matches!(value, Expression::Literal(_)) {
                pool.push(Connected::Expression(value.clone()));
            }
        }
        pool.extend(self.unbound_variables().into_iter().map(Connected::Variable));
        pool.extend(self.plans.keys().copied().map(Connected::Plan));
        pool
    }

    fn is_lambda_shaped(&self, value: &Connected) -> bool {
        match value {
            Connected::Expression(e) => e.is_callable(),
            Connected::Plan(id) => self
                .plans
                .get(id)
                .map_or(false, |p| p.head() == PlanKind::Lambda),
            _ => false,
        }
    }

    /// Promote the plan to finished if its required components are all
    /// present and its kind-specific side constraints hold. The promotion
    /// is irrevocable.
    fn refresh_finished(&mut self, id: PlanId) {
        let ready = match self.plans.get(&id) {
            Some(plan) => {
                !plan.finished()
                    && plan.structurally_full()
                    && self.side_constraints_satisfied(plan)
            }
            None => false,
        };
        if !ready {
            return;
        }
        if let Some(plan) = self.plans.get_mut(&id) {
            plan.mark_finished();
        }
        self.unfinished.shift_remove(&id);
        self.finished.insert(id);
        log::debug!("{} finished", id);
    }

    /// Kind-specific well-formedness side constraints. For an application
    /// whose callee is a primitive token, every parameter name the token
    /// expects must be supplied among the keyword-argument variables;
    /// native parameters are addressed by display name.
    fn side_constraints_satisfied(&self, plan: &ExpressionPlan) -> bool {
        if plan.head() != PlanKind::Beta {
            return true;
        }
        let token = match plan.part("head") {
            Some(Slot::Value(Connected::Expression(Expression::Primitive(token)))) => token,
            _ => return true,
        };
        let supplied: Vec<&str> = match plan.part("kwargs") {
            Some(Slot::Mapping(mapping)) => mapping.keys().map(|k| k.name()).collect(),
            _ => Vec::new(),
        };
        token
            .params()
            .iter()
            .all(|param| supplied.contains(&param.name()))
    }
}

impl Default for Sketch {
    fn default() -> Self {
        Self::new()
    }
}
