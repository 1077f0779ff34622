//! Structural equivalence of two PEG subgraphs under a node bijection.
//!
//! [`check_equivalence`] co-walks an expected and an actual root, building a
//! two-way partial bijection between the nodes it pairs up. The first
//! discrepancy is reported as a [`Witness`]; `Ok(None)` means the two graphs
//! are equivalent. A witness is an ordinary outcome, not an error: `Err` is
//! reserved for dangling ids and other store invariant violations.
//!
//! [`Equivalences`] records confirmed pairs across a whole batch and keeps
//! them disjoint.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::id::NodeId;
use crate::node::PegNode;
use crate::store::NodeStore;

/// Why two subgraphs are not equivalent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Witness {
    /// The two nodes differ in kind, operator, arity or literal value.
    EquivalenceError { expected: NodeId, actual: NodeId },
    /// `reassigned` was compared against `other` after already being paired
    /// with `assigned_to`.
    BijectionError {
        reassigned: NodeId,
        other: NodeId,
        assigned_to: NodeId,
    },
    /// A theta's continuation was never assigned.
    AssignmentError { unassigned: NodeId },
}

impl Witness {
    /// Human-readable explanation using compact node renderings.
    pub fn describe(&self, store: &NodeStore) -> Result<String, CoreError> {
        Ok(match self {
            Witness::EquivalenceError { expected, actual } => format!(
                "Equivalence Error: {} is not equivalent to {}",
                store.deref_string(*expected)?,
                store.deref_string(*actual)?
            ),
            Witness::BijectionError {
                reassigned,
                other,
                assigned_to,
            } => format!(
                "Bijection Error: compared {} and {} when {} was already associated with {}",
                store.deref_string(*reassigned)?,
                store.deref_string(*other)?,
                store.deref_string(*reassigned)?,
                store.deref_string(*assigned_to)?
            ),
            Witness::AssignmentError { unassigned } => format!(
                "Assignment Error: the following theta node was unassigned: {}",
                store.deref_string(*unassigned)?
            ),
        })
    }
}

/// Partial bijection between expected and actual node ids.
#[derive(Debug, Default)]
struct Bijection {
    forward: HashMap<NodeId, NodeId>,
    backward: HashMap<NodeId, NodeId>,
}

impl Bijection {
    /// `Some(result)` when the pair was already decided (consistently or
    /// not); `None` after recording a new pair that still needs comparing.
    fn check(&mut self, expected: NodeId, actual: NodeId) -> Option<Option<Witness>> {
        match (self.forward.get(&expected), self.backward.get(&actual)) {
            (Some(partner), _) if *partner == actual => Some(None),
            (Some(partner), _) => Some(Some(Witness::BijectionError {
                reassigned: expected,
                other: actual,
                assigned_to: *partner,
            })),
            (None, Some(partner)) => Some(Some(Witness::BijectionError {
                reassigned: actual,
                other: expected,
                assigned_to: *partner,
            })),
            (None, None) => {
                self.forward.insert(expected, actual);
                self.backward.insert(actual, expected);
                None
            }
        }
    }
}

/// Compares the subgraphs rooted at `expected` and `actual`.
///
/// Literals match only by id (interning makes equal values share one id).
/// Operator, phi and heap nodes with the same id match immediately;
/// otherwise they must agree on kind, operator and arity, and children are
/// compared positionally. Thetas always go through the bijection, need both
/// continuations resolved, and compare initializer then continuation.
pub fn check_equivalence(
    store: &NodeStore,
    expected: NodeId,
    actual: NodeId,
) -> Result<Option<Witness>, CoreError> {
    let mut bijection = Bijection::default();
    let mut stack = vec![(expected, actual)];

    while let Some((e, a)) = stack.pop() {
        let (en, an) = (store.get(e)?, store.get(a)?);
        match en {
            PegNode::IntLit { .. } | PegNode::BoolLit { .. } | PegNode::StringLit { .. } => {
                if e != a {
                    return Ok(Some(Witness::EquivalenceError {
                        expected: e,
                        actual: a,
                    }));
                }
            }
            PegNode::Theta { init, .. } => {
                match bijection.check(e, a) {
                    Some(None) => continue,
                    Some(witness) => return Ok(witness),
                    None => {}
                }
                let PegNode::Theta { init: other_init, .. } = an else {
                    return Ok(Some(Witness::EquivalenceError {
                        expected: e,
                        actual: a,
                    }));
                };
                let Some(cont) = store.continuation(e)? else {
                    return Ok(Some(Witness::AssignmentError { unassigned: e }));
                };
                let Some(other_cont) = store.continuation(a)? else {
                    return Ok(Some(Witness::AssignmentError { unassigned: a }));
                };
                stack.push((cont, other_cont));
                stack.push((*init, *other_init));
            }
            _ => {
                if e == a {
                    continue;
                }
                match bijection.check(e, a) {
                    Some(None) => continue,
                    Some(witness) => return Ok(witness),
                    None => {}
                }
                let (ec, ac) = (en.children(), an.children());
                if std::mem::discriminant(en) != std::mem::discriminant(an)
                    || en.op_symbol() != an.op_symbol()
                    || ec.len() != ac.len()
                {
                    return Ok(Some(Witness::EquivalenceError {
                        expected: e,
                        actual: a,
                    }));
                }
                stack.extend(ec.into_iter().zip(ac).rev());
            }
        }
    }
    Ok(None)
}

/// Disjoint list of confirmed equivalent id pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Equivalences {
    pairs: Vec<(NodeId, NodeId)>,
    #[serde(skip)]
    seen: HashSet<NodeId>,
}

impl Equivalences {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `a ≡ b`. Fails on a self-pair or if either id already takes
    /// part in another pair.
    pub fn add_equivalence(&mut self, a: NodeId, b: NodeId) -> Result<(), CoreError> {
        if a == b {
            return Err(CoreError::InvalidEquivalence {
                reason: format!("cannot register {a} as equivalent to itself"),
            });
        }
        if self.seen.contains(&a) || self.seen.contains(&b) {
            return Err(CoreError::InvalidEquivalence {
                reason: format!(
                    "tried to add ({a}, {b}) but at least one id is already in another equivalence"
                ),
            });
        }
        self.seen.insert(a);
        self.seen.insert(b);
        self.pairs.push((a, b));
        Ok(())
    }

    /// True if `id` already takes part in a pair.
    pub fn contains(&self, id: NodeId) -> bool {
        self.seen.contains(&id)
    }

    pub fn pairs(&self) -> &[(NodeId, NodeId)] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}
