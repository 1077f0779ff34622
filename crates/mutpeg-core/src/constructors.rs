//! Named constructors for the node shapes the translators build.
//!
//! Each helper is a thin wrapper over [`NodeStore::intern_op`] that fixes the
//! operator symbol and child layout, so the vocabulary stays in one place.

use std::collections::BTreeSet;

use crate::error::CoreError;
use crate::id::NodeId;
use crate::node::HeapRef;
use crate::ops::PegOp;
use crate::store::NodeStore;

impl NodeStore {
    /// The `unit` sentinel: no value, no pending exception.
    pub fn unit(&mut self) -> Result<NodeId, CoreError> {
        self.op(PegOp::Unit, &[])
    }

    pub fn null(&mut self) -> Result<NodeId, CoreError> {
        self.op(PegOp::Null, &[])
    }

    /// A bare name (variable, field or method) as a nullary operator.
    pub fn name(&mut self, name: &str) -> Result<NodeId, CoreError> {
        self.intern_op(name, &[])
    }

    pub fn phi(&mut self, guard: NodeId, then: NodeId, els: NodeId) -> Result<NodeId, CoreError> {
        self.op(PegOp::Phi, &[guard, then, els])
    }

    /// `(var name)`
    pub fn var(&mut self, name: &str) -> Result<NodeId, CoreError> {
        let n = self.name(name)?;
        self.op(PegOp::Var, &[n])
    }

    /// `(derefs path)` where `path` is a dotted field chain such as `b.c`.
    pub fn derefs(&mut self, path: &str) -> Result<NodeId, CoreError> {
        let n = self.name(path)?;
        self.op(PegOp::Derefs, &[n])
    }

    /// `(path base (derefs path))`
    pub fn path(&mut self, base: NodeId, path: &str) -> Result<NodeId, CoreError> {
        let derefs = self.derefs(path)?;
        self.op(PegOp::Path, &[base, derefs])
    }

    pub fn rd(&mut self, path: NodeId, heap: NodeId) -> Result<NodeId, CoreError> {
        self.op(PegOp::Rd, &[path, heap])
    }

    pub fn wr(&mut self, path: NodeId, value: NodeId, heap: NodeId) -> Result<NodeId, CoreError> {
        self.op(PegOp::Wr, &[path, value, heap])
    }

    /// Writes `value` at `path` and returns the heap with the new state and
    /// the old status.
    pub fn wr_heap(
        &mut self,
        path: NodeId,
        value: NodeId,
        heap: HeapRef,
    ) -> Result<HeapRef, CoreError> {
        let state = self.wr(path, value, heap.id)?;
        self.heap_ref_for(state, heap.status)
    }

    /// Replaces the status of `heap`, keeping its state.
    pub fn with_status(&mut self, heap: HeapRef, status: NodeId) -> Result<HeapRef, CoreError> {
        self.heap_ref_for(heap.state, status)
    }

    /// The heap every method starts from: `(heap 0 unit)`.
    pub fn initial_heap(&mut self) -> Result<HeapRef, CoreError> {
        let zero = self.int_lit(0)?;
        let unit = self.unit()?;
        self.heap_ref_for(zero, unit)
    }

    pub fn is_null(&mut self, value: NodeId) -> Result<NodeId, CoreError> {
        self.op(PegOp::IsNull, &[value])
    }

    pub fn is_unit(&mut self, value: NodeId) -> Result<NodeId, CoreError> {
        self.op(PegOp::IsUnit, &[value])
    }

    /// An exception marker, e.g. `null-pointer-exception`.
    pub fn exception(&mut self, name: &str) -> Result<NodeId, CoreError> {
        self.name(name)
    }

    pub fn not(&mut self, value: NodeId) -> Result<NodeId, CoreError> {
        self.op(PegOp::Not, &[value])
    }

    pub fn and(&mut self, lhs: NodeId, rhs: NodeId) -> Result<NodeId, CoreError> {
        self.op(PegOp::And, &[lhs, rhs])
    }

    /// Root of a translated method: its return value and final heap.
    pub fn method_root(&mut self, value: NodeId, heap: NodeId) -> Result<NodeId, CoreError> {
        self.op(PegOp::MethodRoot, &[value, heap])
    }

    pub fn pass(&mut self, condition: NodeId) -> Result<NodeId, CoreError> {
        self.op(PegOp::Pass, &[condition])
    }

    pub fn eval(&mut self, theta: NodeId, pass: NodeId) -> Result<NodeId, CoreError> {
        self.op(PegOp::Eval, &[theta, pass])
    }

    pub fn actuals(&mut self, args: &[NodeId]) -> Result<NodeId, CoreError> {
        self.op(PegOp::Actuals, args)
    }

    /// `(invoke heap receiver method actuals)`
    pub fn invoke(
        &mut self,
        heap: NodeId,
        receiver: NodeId,
        method: &str,
        actuals: NodeId,
    ) -> Result<NodeId, CoreError> {
        let method = self.name(method)?;
        self.op(PegOp::Invoke, &[heap, receiver, method, actuals])
    }

    pub fn invoke_to_peg(&mut self, invocation: NodeId) -> Result<NodeId, CoreError> {
        self.op(PegOp::InvokeToPeg, &[invocation])
    }

    /// The heap an invocation leaves behind.
    pub fn project_heap(&mut self, invocation: NodeId) -> Result<HeapRef, CoreError> {
        let state = self.op(PegOp::InvokeHeapState, &[invocation])?;
        let status = self.op(PegOp::InvokeExceptionStatus, &[invocation])?;
        self.heap_ref_for(state, status)
    }

    /// Folds a set of exit conditions into one guard.
    ///
    /// No conditions is `false`; one condition is itself; otherwise the ids
    /// are disjoined left to right in ascending order, so the same set always
    /// yields the same node.
    pub fn exit_conditions(&mut self, conditions: &BTreeSet<NodeId>) -> Result<NodeId, CoreError> {
        let mut iter = conditions.iter().copied();
        let Some(first) = iter.next() else {
            return self.bool_lit(false);
        };
        self.get(first)?;
        iter.try_fold(first, |acc, cond| self.op(PegOp::Or, &[acc, cond]))
    }
}
