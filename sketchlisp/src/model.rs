// Static schema describing the components of each plannable expression
// kind. Built once at process start; the sketch moves and the plan
// compiler both consult it, so the two sides always agree on what a slot
// may hold.

use std::collections::HashMap;
use std::fmt;

use lazy_static::lazy_static;

/// Expression kinds that can be constructed incrementally as plans.
/// Literals, variables and primitive tokens are connected directly into
/// slots and never need a plan of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlanKind {
    Lambda,
    Beta,
    If,
    Let,
}

impl PlanKind {
    pub const ALL: [PlanKind; 4] = [PlanKind::Lambda, PlanKind::Beta, PlanKind::If, PlanKind::Let];
}

impl fmt::Display for PlanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlanKind::Lambda => "lambda",
            PlanKind::Beta => "application",
            PlanKind::If => "conditional",
            PlanKind::Let => "binding",
        };
        write!(f, "{}", name)
    }
}

/// What category of value a component slot expects.
///
/// `Text` covers the cosmetic string scalars of the model table (the only
/// plain-scalar component any kind declares is a lambda's display name).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueCategory {
    SubExpression,
    VariableTuple,
    VariableMapping,
    CallableRef,
    Text,
}

/// Default installed into a slot when a plan is started without an
/// explicit value for the component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultInit {
    EmptyTuple,
    EmptyMapping,
    FreshName,
}

#[derive(Debug, Clone)]
pub struct ComponentMetadata {
    pub name: &'static str,
    pub category: ValueCategory,
    pub required: bool,
    pub default: Option<DefaultInit>,
}

impl ComponentMetadata {
    fn new(name: &'static str, category: ValueCategory, required: bool) -> Self {
        ComponentMetadata {
            name,
            category,
            required,
            default: None,
        }
    }

    fn with_default(mut self, default: DefaultInit) -> Self {
        self.default = Some(default);
        self
    }
}

#[derive(Debug, Clone)]
pub struct ExpressionModel {
    pub kind: PlanKind,
    pub components: Vec<ComponentMetadata>,
}

impl ExpressionModel {
    pub fn component(&self, name: &str) -> Option<&ComponentMetadata> {
        self.components.iter().find(|c| c.name == name)
    }

    pub fn required_components(&self) -> impl Iterator<Item = &ComponentMetadata> {
        self.components.iter().filter(|c| c.required)
    }
}

lazy_static! {
    pub static ref EXPRESSION_MODELS: HashMap<PlanKind, ExpressionModel> = {
        let models = [
            ExpressionModel {
                kind: PlanKind::Lambda,
                components: vec![
                    ComponentMetadata::new("variables", ValueCategory::VariableTuple, true)
                        .with_default(DefaultInit::EmptyTuple),
                    ComponentMetadata::new("body", ValueCategory::SubExpression, true),
                    ComponentMetadata::new("name", ValueCategory::Text, false)
                        .with_default(DefaultInit::FreshName),
                ],
            },
            ExpressionModel {
                kind: PlanKind::Beta,
                // Positional arguments are not plannable; applications under
                // construction bind their arguments by keyword only.
                components: vec![
                    ComponentMetadata::new("head", ValueCategory::CallableRef, true),
                    ComponentMetadata::new("kwargs", ValueCategory::VariableMapping, false)
                        .with_default(DefaultInit::EmptyMapping),
                ],
            },
            ExpressionModel {
                kind: PlanKind::If,
                components: vec![
                    ComponentMetadata::new("condition", ValueCategory::SubExpression, true),
                    ComponentMetadata::new("then_branch", ValueCategory::SubExpression, true),
                    ComponentMetadata::new("else_branch", ValueCategory::SubExpression, true),
                ],
            },
            ExpressionModel {
                kind: PlanKind::Let,
                components: vec![
                    ComponentMetadata::new("bindings", ValueCategory::VariableMapping, true)
                        .with_default(DefaultInit::EmptyMapping),
                    ComponentMetadata::new("body", ValueCategory::SubExpression, true),
                ],
            },
        ];
        models.into_iter().map(|m| (m.kind, m)).collect()
    };
}

pub fn model_for(kind: PlanKind) -> &'static ExpressionModel {
    EXPRESSION_MODELS
        .get(&kind)
        .expect("model table covers every plan kind")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_has_a_model() {
        for kind in PlanKind::ALL {
            let model = model_for(kind);
            assert_eq!(model.kind, kind);
            assert!(model.required_components().count() >= 1);
        }
    }

    #[test]
    fn beta_has_no_positional_args_component() {
        assert!(model_for(PlanKind::Beta).component("args").is_none());
        assert!(model_for(PlanKind::Beta).component("head").is_some());
    }
}
