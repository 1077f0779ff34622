//! PEG node kinds.
//!
//! A [`PegNode`] is immutable once interned. Literal nodes carry their value,
//! operator nodes carry a symbol plus ordered children, and the four
//! structural kinds (phi, theta, blank, heap) get their own variants so that
//! typed constructors can tell them apart from a plain operator that happens
//! to share the symbol.
//!
//! Children always refer to nodes with strictly smaller ids; the store
//! enforces this at insertion time.

use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};

use crate::id::NodeId;
use crate::ops::PegOp;

/// Ordered child list. Almost every operator has at most four operands.
pub type Children = SmallVec<[NodeId; 4]>;

/// A single node in the expression graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PegNode {
    /// 32-bit signed integer literal.
    IntLit { value: i32 },
    /// Boolean literal.
    BoolLit { value: bool },
    /// String literal.
    StringLit { value: String },
    /// Operator applied to ordered children. Variable, field and method
    /// names are nullary operators whose symbol is the name itself.
    Op { op: String, children: Children },
    /// Guarded choice: `guard ? then : els`.
    Phi {
        guard: NodeId,
        then: NodeId,
        els: NodeId,
    },
    /// Loop-carried value: `init` on the first iteration, `next` afterwards.
    /// `next` is usually a blank that gets bound once the loop body has been
    /// translated.
    Theta { init: NodeId, next: NodeId },
    /// Placeholder for a theta continuation. `literal` is an integer literal
    /// holding the blank's sequence number; blanks are never shared.
    Blank { seq: u32, literal: NodeId },
    /// Heap value: a store state paired with an exception status.
    Heap { state: NodeId, status: NodeId },
}

impl PegNode {
    /// Builds an operator node from a symbol and a child slice.
    pub fn op(op: impl Into<String>, children: &[NodeId]) -> Self {
        PegNode::Op {
            op: op.into(),
            children: Children::from_slice(children),
        }
    }

    /// Ordered children of this node. Literals have none.
    pub fn children(&self) -> Children {
        match self {
            PegNode::IntLit { .. } | PegNode::BoolLit { .. } | PegNode::StringLit { .. } => {
                Children::new()
            }
            PegNode::Op { children, .. } => children.clone(),
            PegNode::Phi { guard, then, els } => smallvec![*guard, *then, *els],
            PegNode::Theta { init, next } => smallvec![*init, *next],
            PegNode::Blank { literal, .. } => smallvec![*literal],
            PegNode::Heap { state, status } => smallvec![*state, *status],
        }
    }

    /// Operator symbol, or `None` for literals.
    pub fn op_symbol(&self) -> Option<&str> {
        match self {
            PegNode::Op { op, .. } => Some(op.as_str()),
            PegNode::Phi { .. } => Some(PegOp::Phi.symbol()),
            PegNode::Theta { .. } => Some(PegOp::Theta.symbol()),
            PegNode::Blank { .. } => Some(PegOp::Blank.symbol()),
            PegNode::Heap { .. } => Some(PegOp::Heap.symbol()),
            _ => None,
        }
    }

    /// Short kind name used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            PegNode::IntLit { .. } => "int-lit",
            PegNode::BoolLit { .. } => "bool-lit",
            PegNode::StringLit { .. } => "string-lit",
            PegNode::Op { .. } => "op",
            PegNode::Phi { .. } => "phi",
            PegNode::Theta { .. } => "theta",
            PegNode::Blank { .. } => "blank",
            PegNode::Heap { .. } => "heap",
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            PegNode::IntLit { .. } | PegNode::BoolLit { .. } | PegNode::StringLit { .. }
        )
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            PegNode::IntLit { value } => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PegNode::BoolLit { value } => Some(*value),
            _ => None,
        }
    }
}

/// A heap node together with its two components, so callers threading heap
/// state through a translation never need a second lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HeapRef {
    pub id: NodeId,
    pub state: NodeId,
    pub status: NodeId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn children_follow_variant_layout() {
        let phi = PegNode::Phi {
            guard: NodeId(0),
            then: NodeId(1),
            els: NodeId(2),
        };
        assert_eq!(phi.children().as_slice(), &[NodeId(0), NodeId(1), NodeId(2)]);
        assert_eq!(phi.op_symbol(), Some("phi"));

        let lit = PegNode::IntLit { value: 3 };
        assert!(lit.children().is_empty());
        assert!(lit.op_symbol().is_none());
        assert!(lit.is_literal());
        assert_eq!(lit.as_int(), Some(3));
    }

    #[test]
    fn plain_heap_op_is_not_a_heap_variant() {
        let op = PegNode::op("heap", &[NodeId(0), NodeId(1)]);
        assert_eq!(op.op_symbol(), Some("heap"));
        assert_eq!(op.kind_name(), "op");
    }

    #[test]
    fn serde_tags_by_kind() {
        let json = serde_json::to_value(PegNode::BoolLit { value: true }).unwrap();
        assert_eq!(json["kind"], "bool-lit");
        assert_eq!(json["value"], true);

        let theta = PegNode::Theta {
            init: NodeId(1),
            next: NodeId(2),
        };
        let text = serde_json::to_string(&theta).unwrap();
        let back: PegNode = serde_json::from_str(&text).unwrap();
        assert_eq!(back, theta);
    }
}
