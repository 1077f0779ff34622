//! Operator vocabulary for PEG nodes.
//!
//! An operator node is identified by its symbol string plus its ordered child
//! list; the store interns on exactly that pair. [`PegOp`] names every symbol
//! the translators emit so call sites never spell raw strings. Arbitrary
//! symbols are still legal (variable names, field names and method names are
//! stored as nullary operators), which is why the store API takes `&str`.
//!
//! # Groups
//!
//! - **Structure**: `phi`, `theta`, `heap`, `blank`, `unit`, `null`
//! - **Heap access**: `var`, `derefs`, `path`, `rd`, `wr`, `isnull?`, `isunit?`
//! - **Method boundary**: `method-root`, `invoke`, `actuals` and projections
//! - **Loops**: `pass`, `eval`
//! - **Arithmetic / logic**: the source language's binary and unary operators

use serde::{Deserialize, Serialize};

/// Exception node symbol recorded when a dereference may hit `null`.
pub const NULL_POINTER_EXCEPTION: &str = "null-pointer-exception";

/// Exception node symbol recorded when a divisor may be zero.
pub const DIVIDE_BY_ZERO_EXCEPTION: &str = "divide-by-zero-exception";

/// Every operator symbol emitted by the translators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PegOp {
    // -- Structure --
    Phi,
    Theta,
    Heap,
    Blank,
    Unit,
    Null,

    // -- Heap access --
    Var,
    Derefs,
    Path,
    Rd,
    Wr,
    IsNull,
    IsUnit,

    // -- Method boundary --
    MethodRoot,
    Invoke,
    Actuals,
    InvokeToPeg,
    InvokeHeapState,
    InvokeExceptionStatus,

    // -- Loops --
    Pass,
    Eval,

    // -- Arithmetic --
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    /// Unary minus; spelled `---` so it never collides with binary `-`.
    Neg,

    // -- Bitwise --
    BitAnd,
    BitOr,
    Xor,
    BitNot,
    Shl,
    Shr,
    UShr,

    // -- Logic --
    And,
    Or,
    Not,

    // -- Comparison --
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl PegOp {
    /// Every operator, in declaration order.
    pub const ALL: [PegOp; 43] = [
        PegOp::Phi,
        PegOp::Theta,
        PegOp::Heap,
        PegOp::Blank,
        PegOp::Unit,
        PegOp::Null,
        PegOp::Var,
        PegOp::Derefs,
        PegOp::Path,
        PegOp::Rd,
        PegOp::Wr,
        PegOp::IsNull,
        PegOp::IsUnit,
        PegOp::MethodRoot,
        PegOp::Invoke,
        PegOp::Actuals,
        PegOp::InvokeToPeg,
        PegOp::InvokeHeapState,
        PegOp::InvokeExceptionStatus,
        PegOp::Pass,
        PegOp::Eval,
        PegOp::Add,
        PegOp::Sub,
        PegOp::Mul,
        PegOp::Div,
        PegOp::Rem,
        PegOp::Neg,
        PegOp::BitAnd,
        PegOp::BitOr,
        PegOp::Xor,
        PegOp::BitNot,
        PegOp::Shl,
        PegOp::Shr,
        PegOp::UShr,
        PegOp::And,
        PegOp::Or,
        PegOp::Not,
        PegOp::Eq,
        PegOp::Ne,
        PegOp::Lt,
        PegOp::Le,
        PegOp::Gt,
        PegOp::Ge,
    ];

    /// The interned symbol string for this operator.
    pub const fn symbol(self) -> &'static str {
        match self {
            PegOp::Phi => "phi",
            PegOp::Theta => "theta",
            PegOp::Heap => "heap",
            PegOp::Blank => "blank",
            PegOp::Unit => "unit",
            PegOp::Null => "null",
            PegOp::Var => "var",
            PegOp::Derefs => "derefs",
            PegOp::Path => "path",
            PegOp::Rd => "rd",
            PegOp::Wr => "wr",
            PegOp::IsNull => "isnull?",
            PegOp::IsUnit => "isunit?",
            PegOp::MethodRoot => "method-root",
            PegOp::Invoke => "invoke",
            PegOp::Actuals => "actuals",
            PegOp::InvokeToPeg => "invoke->peg",
            PegOp::InvokeHeapState => "invoke->heap-state",
            PegOp::InvokeExceptionStatus => "invoke->exception-status",
            PegOp::Pass => "pass",
            PegOp::Eval => "eval",
            PegOp::Add => "+",
            PegOp::Sub => "-",
            PegOp::Mul => "*",
            PegOp::Div => "/",
            PegOp::Rem => "%",
            PegOp::Neg => "---",
            PegOp::BitAnd => "&",
            PegOp::BitOr => "|",
            PegOp::Xor => "^",
            PegOp::BitNot => "~",
            PegOp::Shl => "<<",
            PegOp::Shr => ">>",
            PegOp::UShr => ">>>",
            PegOp::And => "&&",
            PegOp::Or => "||",
            PegOp::Not => "!",
            PegOp::Eq => "==",
            PegOp::Ne => "!=",
            PegOp::Lt => "<",
            PegOp::Le => "<=",
            PegOp::Gt => ">",
            PegOp::Ge => ">=",
        }
    }

    /// Looks an operator up by its symbol.
    pub fn from_symbol(symbol: &str) -> Option<PegOp> {
        PegOp::ALL.iter().copied().find(|op| op.symbol() == symbol)
    }
}
