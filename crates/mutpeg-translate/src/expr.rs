//! Expression translation with constant folding.
//!
//! Every expression maps a context to a `(node, context)` pair. Operands are
//! translated left to right, each starting from the context its predecessor
//! left behind, so side effects (assignments, increments, heap writes, null
//! checks) are threaded in evaluation order.

use mutpeg_core::{NodeId, PegOp, DIVIDE_BY_ZERO_EXCEPTION, NULL_POINTER_EXCEPTION};

use crate::ast::{BinaryOp, Declarator, Expr, UnaryOp};
use crate::context::PegContext;
use crate::error::TranslateError;
use crate::translator::Translator;

/// A translated expression and the context after evaluating it.
#[derive(Debug, Clone)]
pub struct ExprResult {
    pub peg: NodeId,
    pub context: PegContext,
}

impl ExprResult {
    pub fn new(peg: NodeId, context: PegContext) -> Self {
        ExprResult { peg, context }
    }
}

/// Literal value of a node, as far as folding cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lit {
    Int(i32),
    Bool(bool),
}

/// Folded result of a binary operator over two literals.
fn fold_binary(op: BinaryOp, lhs: Lit, rhs: Lit) -> Option<Lit> {
    use BinaryOp::*;
    match (lhs, rhs) {
        (Lit::Int(a), Lit::Int(b)) => Some(match op {
            Add => Lit::Int(a.wrapping_add(b)),
            Sub => Lit::Int(a.wrapping_sub(b)),
            Mul => Lit::Int(a.wrapping_mul(b)),
            Div if b != 0 => Lit::Int(a.wrapping_div(b)),
            Rem if b != 0 => Lit::Int(a.wrapping_rem(b)),
            BitAnd => Lit::Int(a & b),
            BitOr => Lit::Int(a | b),
            Xor => Lit::Int(a ^ b),
            // Shift counts use the low five bits.
            Shl => Lit::Int(a.wrapping_shl(b as u32)),
            Shr => Lit::Int(a.wrapping_shr(b as u32)),
            UShr => Lit::Int((a as u32).wrapping_shr(b as u32) as i32),
            Lt => Lit::Bool(a < b),
            Le => Lit::Bool(a <= b),
            Gt => Lit::Bool(a > b),
            Ge => Lit::Bool(a >= b),
            Eq => Lit::Bool(a == b),
            Ne => Lit::Bool(a != b),
            _ => return None,
        }),
        (Lit::Bool(a), Lit::Bool(b)) => Some(match op {
            And | BitAnd => Lit::Bool(a && b),
            Or | BitOr => Lit::Bool(a || b),
            Xor => Lit::Bool(a ^ b),
            Eq => Lit::Bool(a == b),
            Ne => Lit::Bool(a != b),
            _ => return None,
        }),
        _ => None,
    }
}

fn binary_peg_op(op: BinaryOp) -> PegOp {
    match op {
        BinaryOp::Or => PegOp::Or,
        BinaryOp::And => PegOp::And,
        BinaryOp::BitOr => PegOp::BitOr,
        BinaryOp::BitAnd => PegOp::BitAnd,
        BinaryOp::Xor => PegOp::Xor,
        BinaryOp::Eq => PegOp::Eq,
        BinaryOp::Ne => PegOp::Ne,
        BinaryOp::Lt => PegOp::Lt,
        BinaryOp::Gt => PegOp::Gt,
        BinaryOp::Le => PegOp::Le,
        BinaryOp::Ge => PegOp::Ge,
        BinaryOp::Shl => PegOp::Shl,
        BinaryOp::Shr => PegOp::Shr,
        BinaryOp::UShr => PegOp::UShr,
        BinaryOp::Add => PegOp::Add,
        BinaryOp::Sub => PegOp::Sub,
        BinaryOp::Mul => PegOp::Mul,
        BinaryOp::Div => PegOp::Div,
        BinaryOp::Rem => PegOp::Rem,
    }
}

fn int_literal(value: i64) -> Result<i32, TranslateError> {
    i32::try_from(value).map_err(|_| TranslateError::InvalidLiteral {
        text: value.to_string(),
    })
}

impl Translator<'_> {
    fn literal(&self, id: NodeId) -> Result<Option<Lit>, TranslateError> {
        let node = self.store.get(id)?;
        Ok(node
            .as_int()
            .map(Lit::Int)
            .or_else(|| node.as_bool().map(Lit::Bool)))
    }

    fn intern_lit(&mut self, lit: Lit) -> Result<NodeId, TranslateError> {
        Ok(match lit {
            Lit::Int(v) => self.store.int_lit(v)?,
            Lit::Bool(v) => self.store.bool_lit(v)?,
        })
    }

    /// Translates one expression under `ctx`.
    pub fn translate_expr(
        &mut self,
        expr: &Expr,
        ctx: PegContext,
    ) -> Result<ExprResult, TranslateError> {
        match expr {
            Expr::IntLit { value } => {
                let peg = self.store.int_lit(int_literal(*value)?)?;
                Ok(ExprResult::new(peg, ctx))
            }
            Expr::BoolLit { value } => Ok(ExprResult::new(self.store.bool_lit(*value)?, ctx)),
            Expr::StringLit { value } => Ok(ExprResult::new(self.store.string_lit(value)?, ctx)),
            Expr::Null => Ok(ExprResult::new(self.store.null()?, ctx)),
            Expr::Name { name } => {
                let peg = ctx.lookup(self.store, name)?;
                Ok(ExprResult::new(peg, ctx))
            }
            Expr::This => {
                let peg = ctx.lookup(self.store, "this")?;
                Ok(ExprResult::new(peg, ctx))
            }
            Expr::FieldAccess { scope, name } => self.translate_field_read(scope, name, ctx),
            Expr::ArrayAccess { .. } => Err(TranslateError::unsupported("array access")),
            Expr::Binary { op, lhs, rhs } => self.translate_binary(*op, lhs, rhs, ctx),
            Expr::Unary { op, operand } => self.translate_unary(*op, operand, ctx),
            Expr::Conditional { cond, then, els } => {
                self.translate_conditional(cond, then, els, ctx)
            }
            Expr::Assign { target, value } => {
                let value = self.translate_expr(value, ctx)?;
                let context = self.assign(target, value.peg, value.context)?;
                Ok(ExprResult::new(value.peg, context))
            }
            Expr::Declare { declarators } => self.translate_declare(declarators, ctx),
            Expr::MethodCall { scope, name, args } => {
                self.translate_call(scope.as_deref(), name, args, ctx)
            }
        }
    }

    /// `scope.name`: read through the heap the scope left behind, then note
    /// that a null scope throws. Reads through `this` are never null.
    fn translate_field_read(
        &mut self,
        scope: &Expr,
        name: &str,
        ctx: PegContext,
    ) -> Result<ExprResult, TranslateError> {
        let scope_result = self.translate_expr(scope, ctx)?;
        let path = self.store.path(scope_result.peg, name)?;
        let value = self.store.rd(path, scope_result.context.heap().id)?;
        let context = if matches!(scope, Expr::This) {
            scope_result.context
        } else {
            self.null_check(scope_result.peg, scope_result.context)?
        };
        Ok(ExprResult::new(value, context))
    }

    fn null_check(&mut self, value: NodeId, ctx: PegContext) -> Result<PegContext, TranslateError> {
        let is_null = self.store.is_null(value)?;
        let npe = self.store.exception(NULL_POINTER_EXCEPTION)?;
        ctx.with_exception_condition(self.store, is_null, npe)
    }

    fn translate_binary(
        &mut self,
        op: BinaryOp,
        lhs: &Expr,
        rhs: &Expr,
        ctx: PegContext,
    ) -> Result<ExprResult, TranslateError> {
        let lhs = self.translate_expr(lhs, ctx)?;
        let mut rhs = self.translate_expr(rhs, lhs.context.clone())?;
        let (ll, rl) = (self.literal(lhs.peg)?, self.literal(rhs.peg)?);

        if matches!(op, BinaryOp::Div | BinaryOp::Rem)
            && self.config.track_arithmetic_exceptions
            && !matches!(rl, Some(Lit::Int(v)) if v != 0)
        {
            rhs.context = self.divide_by_zero_check(rhs.peg, rhs.context)?;
        }

        if self.config.fold_constants {
            if let (Some(a), Some(b)) = (ll, rl) {
                if let Some(folded) = fold_binary(op, a, b) {
                    let peg = self.intern_lit(folded)?;
                    return Ok(ExprResult::new(peg, rhs.context));
                }
            }
            // Interning makes identical operands the same node.
            if lhs.peg == rhs.peg && matches!(op, BinaryOp::Eq | BinaryOp::Ne) {
                let peg = self.store.bool_lit(op == BinaryOp::Eq)?;
                return Ok(ExprResult::new(peg, rhs.context));
            }
        }

        match op {
            BinaryOp::Or => {
                let t = self.store.bool_lit(true)?;
                let peg = self.store.phi(lhs.peg, t, rhs.peg)?;
                let context = PegContext::combine(self.store, &lhs.context, &rhs.context, lhs.peg)?;
                Ok(ExprResult::new(peg, context))
            }
            BinaryOp::And => {
                let f = self.store.bool_lit(false)?;
                let peg = self.store.phi(lhs.peg, rhs.peg, f)?;
                let context = PegContext::combine(self.store, &rhs.context, &lhs.context, lhs.peg)?;
                Ok(ExprResult::new(peg, context))
            }
            _ => {
                let peg = self.store.op(binary_peg_op(op), &[lhs.peg, rhs.peg])?;
                Ok(ExprResult::new(peg, rhs.context))
            }
        }
    }

    /// Throw condition `(== divisor 0)`, conjoined with "not exited yet" when
    /// exit conditions are pending.
    fn divide_by_zero_check(
        &mut self,
        divisor: NodeId,
        ctx: PegContext,
    ) -> Result<PegContext, TranslateError> {
        let zero = self.store.int_lit(0)?;
        let is_zero = self.store.op(PegOp::Eq, &[divisor, zero])?;
        let condition = if ctx.exit_conditions().is_empty() {
            is_zero
        } else {
            let exited = self.store.exit_conditions(ctx.exit_conditions())?;
            let not_exited = self.store.not(exited)?;
            self.store.and(not_exited, is_zero)?
        };
        let exception = self.store.exception(DIVIDE_BY_ZERO_EXCEPTION)?;
        ctx.with_exception_condition(self.store, condition, exception)
    }

    fn translate_unary(
        &mut self,
        op: UnaryOp,
        operand: &Expr,
        ctx: PegContext,
    ) -> Result<ExprResult, TranslateError> {
        // `-2147483648` only exists as minus applied to a literal.
        if op == UnaryOp::Minus {
            if let Expr::IntLit { value } = operand {
                let negated = value.checked_neg().ok_or_else(|| TranslateError::InvalidLiteral {
                    text: format!("-{value}"),
                })?;
                let peg = self.store.int_lit(int_literal(negated)?)?;
                return Ok(ExprResult::new(peg, ctx));
            }
        }

        let inner = self.translate_expr(operand, ctx)?;
        let lit = if self.config.fold_constants {
            self.literal(inner.peg)?
        } else {
            None
        };

        let peg = match op {
            UnaryOp::Plus => inner.peg,
            UnaryOp::Minus => self.store.op(PegOp::Neg, &[inner.peg])?,
            UnaryOp::Not => match lit {
                Some(Lit::Bool(b)) => self.store.bool_lit(!b)?,
                _ => self.store.op(PegOp::Not, &[inner.peg])?,
            },
            UnaryOp::BitNot => match lit {
                Some(Lit::Int(v)) => self.store.int_lit(!v)?,
                _ => self.store.op(PegOp::BitNot, &[inner.peg])?,
            },
            UnaryOp::PreInc | UnaryOp::PreDec | UnaryOp::PostInc | UnaryOp::PostDec => {
                return self.translate_step(op, operand, inner);
            }
        };
        Ok(ExprResult::new(peg, inner.context))
    }

    /// Increment/decrement: assign `(+ v 1)` or `(- v 1)` back to the operand.
    /// Prefix forms yield the new value, postfix forms the old one.
    fn translate_step(
        &mut self,
        op: UnaryOp,
        target: &Expr,
        current: ExprResult,
    ) -> Result<ExprResult, TranslateError> {
        let step_op = match op {
            UnaryOp::PreInc | UnaryOp::PostInc => PegOp::Add,
            _ => PegOp::Sub,
        };
        let one = self.store.int_lit(1)?;
        let updated = self.store.op(step_op, &[current.peg, one])?;
        let context = self.assign(target, updated, current.context)?;
        let peg = match op {
            UnaryOp::PreInc | UnaryOp::PreDec => updated,
            _ => current.peg,
        };
        Ok(ExprResult::new(peg, context))
    }

    fn translate_conditional(
        &mut self,
        cond: &Expr,
        then: &Expr,
        els: &Expr,
        ctx: PegContext,
    ) -> Result<ExprResult, TranslateError> {
        let cond = self.translate_expr(cond, ctx)?;
        let then = self.translate_expr(then, cond.context.clone())?;
        let els = self.translate_expr(els, cond.context)?;
        if let Some(Lit::Bool(taken)) = self.literal(cond.peg)? {
            return Ok(if taken { then } else { els });
        }
        let peg = self.store.phi(cond.peg, then.peg, els.peg)?;
        let context = PegContext::combine(self.store, &then.context, &els.context, cond.peg)?;
        Ok(ExprResult::new(peg, context))
    }

    fn translate_declare(
        &mut self,
        declarators: &[Declarator],
        mut ctx: PegContext,
    ) -> Result<ExprResult, TranslateError> {
        let unit = self.store.unit()?;
        for declarator in declarators {
            ctx = ctx.with_local(&declarator.name, unit);
            if let Some(init) = &declarator.init {
                let value = self.translate_expr(init, ctx)?;
                ctx = value
                    .context
                    .assign_local(self.store, &declarator.name, value.peg)?;
            }
        }
        Ok(ExprResult::new(unit, ctx))
    }

    /// Opaque call: `(invoke heap receiver name (actuals args...))`.
    fn translate_call(
        &mut self,
        scope: Option<&Expr>,
        name: &str,
        args: &[Expr],
        ctx: PegContext,
    ) -> Result<ExprResult, TranslateError> {
        let (receiver, mut ctx) = match scope {
            Some(scope) => {
                let recv = self.translate_expr(scope, ctx)?;
                let ctx = if matches!(scope, Expr::This) {
                    recv.context
                } else {
                    self.null_check(recv.peg, recv.context)?
                };
                (recv.peg, ctx)
            }
            None => {
                let this = ctx.lookup(self.store, "this")?;
                (this, ctx)
            }
        };

        let mut actuals = Vec::with_capacity(args.len());
        for arg in args {
            let value = self.translate_expr(arg, ctx)?;
            actuals.push(value.peg);
            ctx = value.context;
        }
        let actuals = self.store.actuals(&actuals)?;
        let invocation = self
            .store
            .invoke(ctx.heap().id, receiver, name, actuals)?;
        let heap = self.store.project_heap(invocation)?;
        let peg = self.store.invoke_to_peg(invocation)?;
        Ok(ExprResult::new(peg, ctx.with_heap(heap)))
    }

    /// Stores `value` into `target` and returns the updated context.
    ///
    /// A plain name is a local unless it names an unshadowed field, in which
    /// case it is written as `this.name`.
    pub(crate) fn assign(
        &mut self,
        target: &Expr,
        value: NodeId,
        ctx: PegContext,
    ) -> Result<PegContext, TranslateError> {
        match target {
            Expr::Name { name } if ctx.is_unshadowed_field(name) => {
                let this = ctx.lookup(self.store, "this")?;
                let path = self.store.path(this, name)?;
                let heap = self.store.wr_heap(path, value, ctx.heap())?;
                Ok(ctx.with_heap(heap))
            }
            Expr::Name { name } => ctx.assign_local(self.store, name, value),
            Expr::FieldAccess { .. } => {
                let (path, ctx) = self.field_path(target, ctx)?;
                let heap = self.store.wr_heap(path, value, ctx.heap())?;
                Ok(ctx.with_heap(heap))
            }
            Expr::ArrayAccess { .. } => Err(TranslateError::unsupported("array access")),
            other => Err(TranslateError::unsupported(format!(
                "assignment to {}",
                other.describe()
            ))),
        }
    }

    /// `(path base (derefs a.b.c))` for a chain of plain field accesses.
    fn field_path(
        &mut self,
        target: &Expr,
        ctx: PegContext,
    ) -> Result<(NodeId, PegContext), TranslateError> {
        let mut derefs: Vec<&str> = Vec::new();
        let mut base = target;
        while let Expr::FieldAccess { scope, name } = base {
            derefs.push(name);
            base = scope.as_ref();
        }
        if !matches!(base, Expr::Name { .. } | Expr::This) {
            return Err(TranslateError::unsupported(format!(
                "field path rooted at {}",
                base.describe()
            )));
        }
        derefs.reverse();
        let base = self.translate_expr(base, ctx)?;
        let path = self.store.path(base.peg, &derefs.join("."))?;
        Ok((path, base.context))
    }
}
