// Plan-graph node types: the mutable under-construction representation of
// an expression, slot contents, and slot addressing.
//
// Plans live in an arena owned by the sketch and reference each other by
// id, never by owning pointer, so cyclic graphs are representable and the
// compiler's trace/memo sets are plain id sets.

use std::fmt;

use indexmap::IndexMap;

use crate::ast::{Expression, Variable};
use crate::model::{model_for, PlanKind};

/// Opaque, stable identity of a plan node. Issued monotonically by the
/// sketch; never derived from content, since content changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlanId(u64);

impl PlanId {
    pub(crate) fn new(raw: u64) -> Self {
        PlanId(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "plan#{}", self.0)
    }
}

/// A single value connected into a slot: a variable, a literal, a cosmetic
/// string, a reference to another plan, or an already-built expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Connected {
    Truth(bool),
    Text(String),
    Variable(Variable),
    Plan(PlanId),
    Expression(Expression),
}

impl fmt::Display for Connected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Connected::Truth(b) => write!(f, "{}", b),
            Connected::Text(s) => write!(f, "{:?}", s),
            Connected::Variable(v) => write!(f, "{}", v),
            Connected::Plan(id) => write!(f, "{}", id),
            Connected::Expression(e) => write!(f, "{}", e),
        }
    }
}

/// Contents of one component slot. Tuple and mapping slots grow
/// incrementally; value slots are written once.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    Value(Connected),
    Tuple(Vec<Variable>),
    Mapping(IndexMap<Variable, Connected>),
}

/// A mutable node under construction. Once `finished` is set the parts
/// are never mutated again; the flag is irrevocable.
#[derive(Debug)]
pub struct ExpressionPlan {
    id: PlanId,
    head: PlanKind,
    parts: IndexMap<String, Slot>,
    finished: bool,
}

impl ExpressionPlan {
    pub(crate) fn new(id: PlanId, head: PlanKind) -> Self {
        ExpressionPlan {
            id,
            head,
            parts: IndexMap::new(),
            finished: false,
        }
    }

    pub fn id(&self) -> PlanId {
        self.id
    }

    pub fn head(&self) -> PlanKind {
        self.head
    }

    pub fn finished(&self) -> bool {
        self.finished
    }

    pub fn parts(&self) -> &IndexMap<String, Slot> {
        &self.parts
    }

    pub fn part(&self, name: &str) -> Option<&Slot> {
        self.parts.get(name)
    }

    /// All components the model flags as required are present. Tuple and
    /// mapping slots count as present even while empty.
    pub fn structurally_full(&self) -> bool {
        model_for(self.head)
            .required_components()
            .all(|c| self.parts.contains_key(c.name))
    }

    pub(crate) fn insert_part(&mut self, name: &str, slot: Slot) {
        self.parts.insert(name.to_string(), slot);
    }

    pub(crate) fn part_mut(&mut self, name: &str) -> Option<&mut Slot> {
        self.parts.get_mut(name)
    }

    pub(crate) fn mark_finished(&mut self) {
        self.finished = true;
    }
}

/// An addressable slot: a base plan plus an attribute path of one or more
/// component names. Depth 1 addresses a component directly; deeper paths
/// address elements of tuple components (by index) and entries of mapping
/// components (by key display name).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComponentReference {
    plan: PlanId,
    path: Vec<String>,
}

impl ComponentReference {
    pub fn new(plan: PlanId, component: impl Into<String>) -> Self {
        ComponentReference {
            plan,
            path: vec![component.into()],
        }
    }

    pub fn nested(plan: PlanId, path: Vec<String>) -> Self {
        ComponentReference { plan, path }
    }

    pub fn plan(&self) -> PlanId {
        self.plan
    }

    /// The top-level component name (first path segment).
    pub fn component(&self) -> &str {
        self.path.first().map(String::as_str).unwrap_or("")
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }
}

impl fmt::Display for ComponentReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.plan, self.path.join("."))
    }
}
