//! NodeStore: the hash-consing engine every translator writes into.
//!
//! The store owns three interning tables (literals, operator applications,
//! and the blank-assignment table) plus the dense node vector indexed by
//! [`NodeId`]. Ids are handed out in insertion order and every node's
//! children must already exist with a strictly smaller id, so the store is a
//! DAG by construction and insertion order is a topological order.
//!
//! The store is an explicit value owned by a translation session. Nothing in
//! this crate keeps global state; independent sessions use independent
//! stores, and [`NodeStore::clear_all`] starts a fresh id space inside one.

use std::collections::{HashMap, HashSet};

use petgraph::algo::toposort;
use petgraph::graph::DiGraph;

use crate::error::CoreError;
use crate::id::NodeId;
use crate::node::{Children, HeapRef, PegNode};
use crate::ops::PegOp;

/// Key of the literal table. One entry per distinct literal value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum LiteralKey {
    Int(i32),
    Bool(bool),
    Str(String),
}

/// Arena of interned PEG nodes.
#[derive(Debug, Clone, Default)]
pub struct NodeStore {
    nodes: Vec<PegNode>,
    literals: HashMap<LiteralKey, NodeId>,
    symbols: HashMap<String, HashMap<Children, NodeId>>,
    blank_values: HashMap<NodeId, NodeId>,
    next_blank: u32,
}

impl NodeStore {
    /// Creates an empty store whose first node will get id 0.
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    /// Returns the node with the given id, if it exists.
    pub fn lookup(&self, id: NodeId) -> Option<&PegNode> {
        self.nodes.get(id.index())
    }

    /// Like [`lookup`](Self::lookup) but reports a missing id as an error.
    pub fn get(&self, id: NodeId) -> Result<&PegNode, CoreError> {
        self.lookup(id).ok_or(CoreError::NodeNotFound { id })
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    /// Number of nodes allocated since the last `clear_all`.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates all nodes in id (and therefore topological) order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &PegNode)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeId(i as u32), node))
    }

    /// Recorded blank assignments, in no particular order.
    pub fn blank_assignments(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.blank_values.iter().map(|(b, v)| (*b, *v))
    }

    /// Resets the id counter to 0 and empties every table.
    ///
    /// All previously handed-out ids become meaningless.
    pub fn clear_all(&mut self) {
        self.nodes.clear();
        self.literals.clear();
        self.symbols.clear();
        self.blank_values.clear();
        self.next_blank = 0;
    }

    // -----------------------------------------------------------------------
    // Interning
    // -----------------------------------------------------------------------

    /// Allocates the next id for `node` after checking the DAG invariant.
    fn push(&mut self, node: PegNode) -> Result<NodeId, CoreError> {
        let id = NodeId(self.nodes.len() as u32);
        if let Some(child) = node.children().into_iter().find(|c| *c >= id) {
            return Err(CoreError::DagViolation { node: id, child });
        }
        self.nodes.push(node);
        Ok(id)
    }

    fn cached_op(&self, op: &str, children: &[NodeId]) -> Option<NodeId> {
        self.symbols
            .get(op)
            .and_then(|by_children| by_children.get(children))
            .copied()
    }

    fn register_op(&mut self, op: &str, children: &[NodeId], id: NodeId) {
        self.symbols
            .entry(op.to_string())
            .or_default()
            .insert(Children::from_slice(children), id);
    }

    /// Returns the id of `(op children...)`, creating the node if needed.
    ///
    /// A three-child `phi` becomes a [`PegNode::Phi`]; every other symbol,
    /// including `theta` and `heap`, becomes a plain operator. Use
    /// [`theta`](Self::theta) and [`heap`](Self::heap) for those.
    pub fn intern_op(&mut self, op: &str, children: &[NodeId]) -> Result<NodeId, CoreError> {
        if let Some(id) = self.cached_op(op, children) {
            return Ok(id);
        }
        let node = match (op, children) {
            ("phi", [guard, then, els]) => PegNode::Phi {
                guard: *guard,
                then: *then,
                els: *els,
            },
            _ => PegNode::op(op, children),
        };
        let id = self.push(node)?;
        self.register_op(op, children, id);
        Ok(id)
    }

    /// Shorthand for [`intern_op`](Self::intern_op) with a known operator.
    pub fn op(&mut self, op: PegOp, children: &[NodeId]) -> Result<NodeId, CoreError> {
        self.intern_op(op.symbol(), children)
    }

    fn intern_literal(&mut self, key: LiteralKey) -> Result<NodeId, CoreError> {
        if let Some(id) = self.literals.get(&key) {
            return Ok(*id);
        }
        let node = match &key {
            LiteralKey::Int(value) => PegNode::IntLit { value: *value },
            LiteralKey::Bool(value) => PegNode::BoolLit { value: *value },
            LiteralKey::Str(value) => PegNode::StringLit {
                value: value.clone(),
            },
        };
        let id = self.push(node)?;
        self.literals.insert(key, id);
        Ok(id)
    }

    pub fn int_lit(&mut self, value: i32) -> Result<NodeId, CoreError> {
        self.intern_literal(LiteralKey::Int(value))
    }

    pub fn bool_lit(&mut self, value: bool) -> Result<NodeId, CoreError> {
        self.intern_literal(LiteralKey::Bool(value))
    }

    pub fn string_lit(&mut self, value: &str) -> Result<NodeId, CoreError> {
        self.intern_literal(LiteralKey::Str(value.to_string()))
    }

    /// Shared path for the typed structural constructors: look the pair up
    /// in the operator table and insist the cached node has the right kind.
    fn intern_pair(
        &mut self,
        op: PegOp,
        a: NodeId,
        b: NodeId,
        build: fn(NodeId, NodeId) -> PegNode,
    ) -> Result<NodeId, CoreError> {
        for id in [a, b] {
            if !self.contains(id) {
                return Err(CoreError::NodeNotFound { id });
            }
        }
        let children = [a, b];
        if let Some(id) = self.cached_op(op.symbol(), &children) {
            let found = self.get(id)?;
            let expected = build(a, b);
            if std::mem::discriminant(found) != std::mem::discriminant(&expected) {
                return Err(CoreError::CacheTypeMismatch {
                    op: op.symbol().to_string(),
                    children: children.to_vec(),
                    found: self.deref_string(id)?,
                });
            }
            return Ok(id);
        }
        let id = self.push(build(a, b))?;
        self.register_op(op.symbol(), &children, id);
        Ok(id)
    }

    /// Returns the heap node for `(state, status)`.
    pub fn heap(&mut self, state: NodeId, status: NodeId) -> Result<NodeId, CoreError> {
        self.intern_pair(PegOp::Heap, state, status, |state, status| {
            PegNode::Heap { state, status }
        })
    }

    /// Like [`heap`](Self::heap) but returns the components alongside the id.
    pub fn heap_ref_for(&mut self, state: NodeId, status: NodeId) -> Result<HeapRef, CoreError> {
        let id = self.heap(state, status)?;
        Ok(HeapRef { id, state, status })
    }

    /// Views an existing heap node as a [`HeapRef`].
    pub fn heap_ref(&self, id: NodeId) -> Result<HeapRef, CoreError> {
        match self.get(id)? {
            PegNode::Heap { state, status } => Ok(HeapRef {
                id,
                state: *state,
                status: *status,
            }),
            _ => Err(CoreError::NotAHeap { id }),
        }
    }

    /// Returns the theta node for `(init, next)`.
    ///
    /// Thetas built over distinct blanks never collide, so two loop-carried
    /// variables with the same initial value still get distinct thetas.
    pub fn theta(&mut self, init: NodeId, next: NodeId) -> Result<NodeId, CoreError> {
        self.intern_pair(PegOp::Theta, init, next, |init, next| PegNode::Theta {
            init,
            next,
        })
    }

    /// Allocates a fresh blank. Never deduplicated.
    pub fn blank(&mut self) -> Result<NodeId, CoreError> {
        let seq = self.next_blank;
        self.next_blank += 1;
        let literal = self.int_lit(seq as i32)?;
        self.push(PegNode::Blank { seq, literal })
    }

    /// Binds `blank` to `value`. Each blank may be bound exactly once.
    pub fn assign_blank(&mut self, blank: NodeId, value: NodeId) -> Result<(), CoreError> {
        if !matches!(self.get(blank)?, PegNode::Blank { .. }) {
            return Err(CoreError::NotABlank { id: blank });
        }
        if !self.contains(value) {
            return Err(CoreError::NodeNotFound { id: value });
        }
        if let Some(existing) = self.blank_values.get(&blank) {
            return Err(CoreError::BlankAlreadyAssigned {
                blank,
                value: *existing,
            });
        }
        self.blank_values.insert(blank, value);
        Ok(())
    }

    /// The value bound to `blank`, if any.
    pub fn blank_value(&self, blank: NodeId) -> Option<NodeId> {
        self.blank_values.get(&blank).copied()
    }

    /// `(init, next)` of a theta node.
    pub fn theta_parts(&self, theta: NodeId) -> Result<(NodeId, NodeId), CoreError> {
        match self.get(theta)? {
            PegNode::Theta { init, next } => Ok((*init, *next)),
            _ => Err(CoreError::NotATheta { id: theta }),
        }
    }

    /// The resolved continuation of a theta node.
    ///
    /// A blank `next` resolves through the blank table and yields `None`
    /// until it has been assigned; any other `next` is its own continuation.
    pub fn continuation(&self, theta: NodeId) -> Result<Option<NodeId>, CoreError> {
        let (_, next) = self.theta_parts(theta)?;
        match self.get(next)? {
            PegNode::Blank { .. } => Ok(self.blank_value(next)),
            _ => Ok(Some(next)),
        }
    }

    // -----------------------------------------------------------------------
    // Structural bijection
    // -----------------------------------------------------------------------

    /// Cheap structural identity check between two subgraphs.
    ///
    /// Blanks may differ as long as they pair up consistently, and a blank met
    /// on both sides counts as paired with itself. Nodes of the same operator
    /// and arity are compared child by child, even when the ids match;
    /// literals must be the very same id. Unlike
    /// [`check_equivalence`](crate::equivalence::check_equivalence) this never
    /// follows theta continuations and reports no witness.
    pub fn structurally_bijective(&self, a: NodeId, b: NodeId) -> Result<bool, CoreError> {
        let mut forward: HashMap<NodeId, NodeId> = HashMap::new();
        let mut backward: HashMap<NodeId, NodeId> = HashMap::new();
        let mut visited: HashSet<(NodeId, NodeId)> = HashSet::new();
        let mut stack = vec![(a, b)];

        while let Some((a, b)) = stack.pop() {
            if !visited.insert((a, b)) {
                continue;
            }
            let (na, nb) = (self.get(a)?, self.get(b)?);
            match (na, nb) {
                (PegNode::Blank { .. }, PegNode::Blank { .. }) => {
                    match (forward.get(&a), backward.get(&b)) {
                        (None, None) => {
                            forward.insert(a, b);
                            backward.insert(b, a);
                        }
                        (Some(fa), Some(bb)) if *fa == b && *bb == a => {}
                        _ => return Ok(false),
                    }
                }
                _ if na.is_literal() || nb.is_literal() => {
                    if a != b {
                        return Ok(false);
                    }
                }
                _ => {
                    let (ca, cb) = (na.children(), nb.children());
                    if std::mem::discriminant(na) != std::mem::discriminant(nb)
                        || na.op_symbol() != nb.op_symbol()
                        || ca.len() != cb.len()
                    {
                        return Ok(false);
                    }
                    stack.extend(ca.into_iter().zip(cb).rev());
                }
            }
        }
        Ok(true)
    }

    // -----------------------------------------------------------------------
    // Graph export
    // -----------------------------------------------------------------------

    /// Exports the store as a petgraph graph with parent→child edges weighted
    /// by child position. Node indices equal node ids. Blank assignments are
    /// not edges: they close loops and would make the graph cyclic.
    pub fn to_graph(&self) -> DiGraph<PegNode, usize> {
        let mut graph = DiGraph::with_capacity(self.nodes.len(), self.nodes.len());
        for node in &self.nodes {
            graph.add_node(node.clone());
        }
        for (id, node) in self.iter() {
            for (pos, child) in node.children().into_iter().enumerate() {
                graph.add_edge(id.into(), child.into(), pos);
            }
        }
        graph
    }

    /// Re-checks the DAG invariant over the whole store.
    pub fn verify_dag(&self) -> Result<(), CoreError> {
        for (id, node) in self.iter() {
            if let Some(child) = node.children().into_iter().find(|c| *c >= id) {
                return Err(CoreError::DagViolation { node: id, child });
            }
        }
        toposort(&self.to_graph(), None)
            .map(|_| ())
            .map_err(|cycle| CoreError::CyclicGraph {
                node: cycle.node_id().into(),
            })
    }
}
