//! Input AST for the SIMPLE language subset.
//!
//! Source parsing happens elsewhere; this crate receives already-parsed
//! classes as JSON. Every node is an internally tagged enum (`"kind"`), and
//! operators travel as their source spelling (`"+"`, `"&&"`, `"_++"`), so an
//! unknown operator is rejected while the JSON is being read.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TranslateError;

/// Binary operators of the source language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BinaryOp {
    Or,
    And,
    BitOr,
    BitAnd,
    Xor,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Shl,
    Shr,
    UShr,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinaryOp {
    pub const ALL: [BinaryOp; 19] = [
        BinaryOp::Or,
        BinaryOp::And,
        BinaryOp::BitOr,
        BinaryOp::BitAnd,
        BinaryOp::Xor,
        BinaryOp::Eq,
        BinaryOp::Ne,
        BinaryOp::Lt,
        BinaryOp::Gt,
        BinaryOp::Le,
        BinaryOp::Ge,
        BinaryOp::Shl,
        BinaryOp::Shr,
        BinaryOp::UShr,
        BinaryOp::Add,
        BinaryOp::Sub,
        BinaryOp::Mul,
        BinaryOp::Div,
        BinaryOp::Rem,
    ];

    /// Source spelling.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitAnd => "&",
            BinaryOp::Xor => "^",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::UShr => ">>>",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
        }
    }
}

impl FromStr for BinaryOp {
    type Err = TranslateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BinaryOp::ALL
            .iter()
            .copied()
            .find(|op| op.symbol() == s)
            .ok_or_else(|| TranslateError::UnrecognizedOperator {
                kind: "binary".into(),
                symbol: s.into(),
            })
    }
}

impl TryFrom<String> for BinaryOp {
    type Error = TranslateError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<BinaryOp> for String {
    fn from(op: BinaryOp) -> Self {
        op.symbol().to_string()
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Unary operators of the source language. Increment and decrement mark
/// their fixity with an underscore on the operand side (`++_` is prefix,
/// `_++` postfix).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
    BitNot,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
}

impl UnaryOp {
    pub const ALL: [UnaryOp; 8] = [
        UnaryOp::Plus,
        UnaryOp::Minus,
        UnaryOp::Not,
        UnaryOp::BitNot,
        UnaryOp::PreInc,
        UnaryOp::PreDec,
        UnaryOp::PostInc,
        UnaryOp::PostDec,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
            UnaryOp::PreInc => "++_",
            UnaryOp::PreDec => "--_",
            UnaryOp::PostInc => "_++",
            UnaryOp::PostDec => "_--",
        }
    }

    /// True for the four increment/decrement forms.
    pub fn is_side_effecting(self) -> bool {
        matches!(
            self,
            UnaryOp::PreInc | UnaryOp::PreDec | UnaryOp::PostInc | UnaryOp::PostDec
        )
    }
}

impl FromStr for UnaryOp {
    type Err = TranslateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UnaryOp::ALL
            .iter()
            .copied()
            .find(|op| op.symbol() == s)
            .ok_or_else(|| TranslateError::UnrecognizedOperator {
                kind: "unary".into(),
                symbol: s.into(),
            })
    }
}

impl TryFrom<String> for UnaryOp {
    type Error = TranslateError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<UnaryOp> for String {
    fn from(op: UnaryOp) -> Self {
        op.symbol().to_string()
    }
}

/// One `name = init` inside a local declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declarator {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub init: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Expr {
    /// Integer literal as written; range is checked during translation so
    /// that `-2147483648` can be expressed as unary minus over a literal.
    IntLit {
        value: i64,
    },
    BoolLit {
        value: bool,
    },
    StringLit {
        value: String,
    },
    Null,
    Name {
        name: String,
    },
    This,
    FieldAccess {
        scope: Box<Expr>,
        name: String,
    },
    ArrayAccess {
        array: Box<Expr>,
        index: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Conditional {
        cond: Box<Expr>,
        then: Box<Expr>,
        els: Box<Expr>,
    },
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Declare {
        declarators: Vec<Declarator>,
    },
    MethodCall {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        scope: Option<Box<Expr>>,
        name: String,
        #[serde(default)]
        args: Vec<Expr>,
    },
}

impl Expr {
    /// Short description for diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            Expr::IntLit { .. } => "integer literal",
            Expr::BoolLit { .. } => "boolean literal",
            Expr::StringLit { .. } => "string literal",
            Expr::Null => "null literal",
            Expr::Name { .. } => "name",
            Expr::This => "this",
            Expr::FieldAccess { .. } => "field access",
            Expr::ArrayAccess { .. } => "array access",
            Expr::Binary { .. } => "binary expression",
            Expr::Unary { .. } => "unary expression",
            Expr::Conditional { .. } => "conditional expression",
            Expr::Assign { .. } => "assignment",
            Expr::Declare { .. } => "variable declaration",
            Expr::MethodCall { .. } => "method call",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Stmt {
    Block {
        stmts: Vec<Stmt>,
    },
    Expr {
        expr: Expr,
    },
    If {
        cond: Expr,
        then: Box<Stmt>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        els: Option<Box<Stmt>>,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
    },
    Return {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Expr>,
    },
    Empty,
    Break,
    Continue,
}

impl Stmt {
    /// Number of `return` statements anywhere inside this statement.
    pub fn count_returns(&self) -> usize {
        match self {
            Stmt::Return { .. } => 1,
            Stmt::Block { stmts } => stmts.iter().map(Stmt::count_returns).sum(),
            Stmt::If { then, els, .. } => {
                then.count_returns() + els.as_ref().map_or(0, |e| e.count_returns())
            }
            Stmt::While { body, .. } => body.count_returns(),
            Stmt::Expr { .. } | Stmt::Empty | Stmt::Break | Stmt::Continue => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub ty: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    #[serde(default)]
    pub params: Vec<Param>,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub body: Vec<Stmt>,
}

impl MethodDecl {
    /// Canonical signature: `name(T1,T2)` with no spaces.
    pub fn signature(&self) -> String {
        let types: Vec<String> = self
            .params
            .iter()
            .map(|p| p.ty.split_whitespace().collect::<String>())
            .collect();
        format!("{}({})", self.name, types.join(","))
    }

    /// Parameter names in binding order, with `this` first for instance
    /// methods.
    pub fn param_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.params.len() + 1);
        if !self.is_static {
            names.push("this".to_string());
        }
        names.extend(self.params.iter().map(|p| p.name.clone()));
        names
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    pub ty: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
    #[serde(default)]
    pub methods: Vec<MethodDecl>,
}

impl ClassDecl {
    pub fn field_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Finds the method with the given canonical signature.
    pub fn method(&self, signature: &str) -> Option<&MethodDecl> {
        self.methods.iter().find(|m| m.signature() == signature)
    }
}
