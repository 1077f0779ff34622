//! Abstract translation state threaded through a method.
//!
//! A [`PegContext`] is a persistent snapshot: every update returns a new
//! context and leaves the old one intact, so branches can start from the
//! same state and be merged afterwards with [`PegContext::combine`].
//!
//! The local map is insertion ordered. Loop translation allocates one theta
//! per local in that order and branch merges walk it too, which keeps node
//! ids reproducible from run to run.

use std::collections::{BTreeSet, HashSet};
use std::rc::Rc;

use indexmap::IndexMap;
use mutpeg_core::{HeapRef, NodeId, NodeStore};

use crate::error::TranslateError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PegContext {
    locals: IndexMap<String, NodeId>,
    /// Field names of the enclosing class, shared by every context derived
    /// from one method.
    fields: Rc<HashSet<String>>,
    heap: HeapRef,
    exit_conditions: BTreeSet<NodeId>,
    return_node: Option<NodeId>,
}

impl PegContext {
    /// Entry state of a method: each parameter bound to `(var name)`, the
    /// initial heap, no exit conditions and no return value.
    pub fn init_with_params(
        store: &mut NodeStore,
        fields: Rc<HashSet<String>>,
        params: &[String],
    ) -> Result<Self, TranslateError> {
        let mut locals = IndexMap::with_capacity(params.len());
        for param in params {
            locals.insert(param.clone(), store.var(param)?);
        }
        Ok(PegContext {
            locals,
            fields,
            heap: store.initial_heap()?,
            exit_conditions: BTreeSet::new(),
            return_node: None,
        })
    }

    pub fn locals(&self) -> &IndexMap<String, NodeId> {
        &self.locals
    }

    pub fn heap(&self) -> HeapRef {
        self.heap
    }

    pub fn exit_conditions(&self) -> &BTreeSet<NodeId> {
        &self.exit_conditions
    }

    pub fn return_node(&self) -> Option<NodeId> {
        self.return_node
    }

    pub fn is_field(&self, name: &str) -> bool {
        self.fields.contains(name)
    }

    /// A field not hidden by a local of the same name.
    pub fn is_unshadowed_field(&self, name: &str) -> bool {
        self.is_field(name) && !self.locals.contains_key(name)
    }

    /// Current value of `name`.
    ///
    /// Locals win; `this` falls back to `(var this)`; an unshadowed field
    /// reads `this.name` from the current heap; anything else is `unit`.
    pub fn lookup(&self, store: &mut NodeStore, name: &str) -> Result<NodeId, TranslateError> {
        if let Some(id) = self.locals.get(name) {
            return Ok(*id);
        }
        if name == "this" {
            return Ok(store.var("this")?);
        }
        if self.is_unshadowed_field(name) {
            let this = self.lookup(store, "this")?;
            let path = store.path(this, name)?;
            return Ok(store.rd(path, self.heap.id)?);
        }
        Ok(store.unit()?)
    }

    /// Binds `name` to `value` unconditionally.
    pub fn with_local(&self, name: &str, value: NodeId) -> Self {
        let mut next = self.clone();
        next.locals.insert(name.to_string(), value);
        next
    }

    /// Ordinary local assignment.
    ///
    /// Once an exit condition is pending the old value survives on the
    /// exceptional path: the new binding is
    /// `phi(exit-conditions, old, value)`.
    pub fn assign_local(
        &self,
        store: &mut NodeStore,
        name: &str,
        value: NodeId,
    ) -> Result<Self, TranslateError> {
        if self.exit_conditions.is_empty() {
            return Ok(self.with_local(name, value));
        }
        let guard = store.exit_conditions(&self.exit_conditions)?;
        let old = self.lookup(store, name)?;
        let merged = store.phi(guard, old, value)?;
        Ok(self.with_local(name, merged))
    }

    pub fn with_heap(&self, heap: HeapRef) -> Self {
        PegContext {
            heap,
            ..self.clone()
        }
    }

    pub fn with_exit_condition(&self, condition: NodeId) -> Self {
        let mut next = self.clone();
        next.exit_conditions.insert(condition);
        next
    }

    /// Records that `exception` is thrown when `condition` holds.
    ///
    /// With no exception pending the status becomes
    /// `phi(condition, exception, unit)`; otherwise an earlier exception
    /// wins: `phi(isunit?(status), phi(condition, exception, unit), status)`.
    pub fn with_exception_condition(
        &self,
        store: &mut NodeStore,
        condition: NodeId,
        exception: NodeId,
    ) -> Result<Self, TranslateError> {
        let unit = store.unit()?;
        let thrown = store.phi(condition, exception, unit)?;
        let status = if self.heap.status == unit {
            thrown
        } else {
            let nothing_pending = store.is_unit(self.heap.status)?;
            store.phi(nothing_pending, thrown, self.heap.status)?
        };
        let heap = store.with_status(self.heap, status)?;
        Ok(self.with_exit_condition(condition).with_heap(heap))
    }

    /// Sets the method's return value. A second return is an error.
    pub fn with_return_node(&self, value: NodeId) -> Result<Self, TranslateError> {
        if self.return_node.is_some() {
            return Err(TranslateError::MultipleReturns);
        }
        Ok(PegContext {
            return_node: Some(value),
            ..self.clone()
        })
    }

    /// Merges two branch contexts under `guard` (`c1` is the taken side).
    ///
    /// Only locals bound in both branches survive, each as
    /// `phi(guard, c1[v], c2[v])`. The heap merges component-wise and exit
    /// conditions are unioned.
    pub fn combine(
        store: &mut NodeStore,
        c1: &PegContext,
        c2: &PegContext,
        guard: NodeId,
    ) -> Result<Self, TranslateError> {
        if c1.return_node.is_some() && c2.return_node.is_some() {
            return Err(TranslateError::MultipleReturns);
        }

        let state = store.phi(guard, c1.heap.state, c2.heap.state)?;
        let status = store.phi(guard, c1.heap.status, c2.heap.status)?;
        let heap = store.heap_ref_for(state, status)?;

        let mut locals = IndexMap::new();
        for (name, then) in &c1.locals {
            if let Some(els) = c2.locals.get(name) {
                locals.insert(name.clone(), store.phi(guard, *then, *els)?);
            }
        }

        Ok(PegContext {
            locals,
            fields: Rc::clone(&c1.fields),
            heap,
            exit_conditions: c1
                .exit_conditions
                .union(&c2.exit_conditions)
                .copied()
                .collect(),
            return_node: c1.return_node.or(c2.return_node),
        })
    }

    /// The method root: `(method-root value heap)`, with `unit` as the value
    /// when nothing was returned.
    pub fn as_peg(&self, store: &mut NodeStore) -> Result<NodeId, TranslateError> {
        let value = match self.return_node {
            Some(value) => value,
            None => store.unit()?,
        };
        Ok(store.method_root(value, self.heap.id)?)
    }
}
