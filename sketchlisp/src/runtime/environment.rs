// Persistent environment for variable bindings.
//
// Every mutating-looking operation returns a new instance; nothing is ever
// observably mutated after construction. Lambdas store a captured
// environment by value-semantics sharing, so aliasing between closures is
// safe without any coordination.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::ast::{Expression, Variable};
use crate::runtime::error::{RuntimeError, RuntimeResult};

/// Immutable variable-to-value mapping. Values are expressions: the
/// evaluator's normal forms (literals, sealed lambdas, primitive tokens)
/// as well as the unevaluated initializers a `let` places in scope.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Environment {
    bindings: Rc<HashMap<Variable, Expression>>,
}

impl Environment {
    pub fn empty() -> Self {
        Environment::default()
    }

    /// Look up a variable, failing with `UnboundVariable` if absent.
    pub fn lookup(&self, var: &Variable) -> RuntimeResult<Expression> {
        self.bindings
            .get(var)
            .cloned()
            .ok_or_else(|| RuntimeError::UnboundVariable(var.clone()))
    }

    pub fn get(&self, var: &Variable) -> Option<&Expression> {
        self.bindings.get(var)
    }

    pub fn contains(&self, var: &Variable) -> bool {
        self.bindings.contains_key(var)
    }

    /// Right-biased union: bindings in `other` win on conflict. Neither
    /// input is modified.
    pub fn merged(&self, other: &Environment) -> Environment {
        if self.bindings.is_empty() {
            return other.clone();
        }
        if other.bindings.is_empty() {
            return self.clone();
        }
        let mut merged = (*self.bindings).clone();
        for (k, v) in other.bindings.iter() {
            merged.insert(k.clone(), v.clone());
        }
        Environment {
            bindings: Rc::new(merged),
        }
    }

    /// Right-biased union with an iterator of pairs, without building an
    /// intermediate environment.
    pub fn merged_pairs<I>(&self, pairs: I) -> Environment
    where
        I: IntoIterator<Item = (Variable, Expression)>,
    {
        let mut merged = (*self.bindings).clone();
        for (k, v) in pairs {
            merged.insert(k, v);
        }
        Environment {
            bindings: Rc::new(merged),
        }
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Variable, &Expression)> {
        self.bindings.iter()
    }
}

impl FromIterator<(Variable, Expression)> for Environment {
    fn from_iter<I: IntoIterator<Item = (Variable, Expression)>>(iter: I) -> Self {
        Environment {
            bindings: Rc::new(iter.into_iter().collect()),
        }
    }
}

// Order-independent: environments with the same bindings hash identically
// no matter the insertion order, so they can key memo tables.
impl Hash for Environment {
    fn hash<H: Hasher>(&self, state: &mut H) {
        unordered_hash(self.bindings.iter(), state);
    }
}

/// Commutative combination of per-entry hashes, shared by every unordered
/// mapping in the crate that needs hashing consistent with its
/// order-independent equality.
pub(crate) fn unordered_hash<K, V, H>(entries: impl Iterator<Item = (K, V)>, state: &mut H)
where
    K: Hash,
    V: Hash,
    H: Hasher,
{
    let mut acc: u64 = 0;
    let mut len: usize = 0;
    for (k, v) in entries {
        let mut entry_hasher = DefaultHasher::new();
        k.hash(&mut entry_hasher);
        v.hash(&mut entry_hasher);
        acc = acc.wrapping_add(entry_hasher.finish());
        len += 1;
    }
    state.write_usize(len);
    state.write_u64(acc);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash_of(env: &Environment) -> u64 {
        let mut hasher = DefaultHasher::new();
        env.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn merge_is_right_biased() {
        let a = Variable::new("a");
        let left: Environment = [(a.clone(), Expression::Literal(true))].into_iter().collect();
        let right: Environment = [(a.clone(), Expression::Literal(false))].into_iter().collect();
        let merged = left.merged(&right);
        assert_eq!(merged.lookup(&a).unwrap(), Expression::Literal(false));
        // inputs untouched
        assert_eq!(left.lookup(&a).unwrap(), Expression::Literal(true));
    }

    #[test]
    fn hash_is_order_independent() {
        let a = Variable::new("a");
        let b = Variable::new("b");
        let one: Environment = [
            (a.clone(), Expression::Literal(true)),
            (b.clone(), Expression::Literal(false)),
        ]
        .into_iter()
        .collect();
        let two: Environment = [
            (b, Expression::Literal(false)),
            (a, Expression::Literal(true)),
        ]
        .into_iter()
        .collect();
        assert_eq!(one, two);
        assert_eq!(hash_of(&one), hash_of(&two));
    }
}
