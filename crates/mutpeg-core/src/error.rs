//! Core error types for mutpeg-core.
//!
//! Uses `thiserror` for structured, matchable error variants. Every variant
//! here signals a broken store invariant (DAG ordering, interning
//! consistency, single assignment of blanks) or a dangling id, never an
//! ordinary "these graphs differ" outcome; that is reported as a
//! [`Witness`](crate::equivalence::Witness) instead.

use crate::id::NodeId;
use thiserror::Error;

/// Core errors produced by the mutpeg-core crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A node would reference a child whose id is not strictly smaller than
    /// its own.
    #[error("node {node} has child {child}: children must have ids strictly less than their parent")]
    DagViolation { node: NodeId, child: NodeId },

    /// The operator cache held a node of the wrong variant for a typed
    /// constructor (e.g. a plain `heap` operator where a Heap was expected).
    #[error("unexpected node cached for op '{op}' with children {children:?}: found {found}")]
    CacheTypeMismatch {
        op: String,
        children: Vec<NodeId>,
        found: String,
    },

    /// A node id was not found in the store.
    #[error("node not found: NodeId({id})", id = id.0)]
    NodeNotFound { id: NodeId },

    /// A blank assignment targeted a node that is not a blank.
    #[error("node {id} is not a blank node")]
    NotABlank { id: NodeId },

    /// A blank was assigned twice.
    #[error("blank {blank} is already assigned to {value}")]
    BlankAlreadyAssigned { blank: NodeId, value: NodeId },

    /// A theta-only query was made against another node kind.
    #[error("node {id} is not a theta node")]
    NotATheta { id: NodeId },

    /// A heap-only query was made against another node kind.
    #[error("node {id} is not a heap node")]
    NotAHeap { id: NodeId },

    /// An equivalence pair broke the disjointness rules.
    #[error("invalid equivalence: {reason}")]
    InvalidEquivalence { reason: String },

    /// The exported graph contains a cycle through the given node.
    #[error("cycle detected through node {node}")]
    CyclicGraph { node: NodeId },
}
