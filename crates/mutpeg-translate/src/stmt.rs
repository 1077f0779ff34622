//! Statement translation: context threading, branch merges and loops.

use mutpeg_core::NodeId;

use crate::ast::{Expr, Stmt};
use crate::context::PegContext;
use crate::error::TranslateError;
use crate::translator::Translator;

impl Translator<'_> {
    /// Translates `stmt` starting from `ctx` and returns the context after it.
    pub fn translate_stmt(
        &mut self,
        stmt: &Stmt,
        ctx: PegContext,
    ) -> Result<PegContext, TranslateError> {
        match stmt {
            Stmt::Block { stmts } => stmts
                .iter()
                .try_fold(ctx, |ctx, stmt| self.translate_stmt(stmt, ctx)),
            Stmt::Expr { expr } => Ok(self.translate_expr(expr, ctx)?.context),
            Stmt::If { cond, then, els } => self.translate_if(cond, then, els.as_deref(), ctx),
            Stmt::While { cond, body } => self.translate_while(cond, body, ctx),
            Stmt::Return { value } => {
                let (value, ctx) = match value {
                    Some(expr) => {
                        let result = self.translate_expr(expr, ctx)?;
                        (result.peg, result.context)
                    }
                    None => (self.store.unit()?, ctx),
                };
                ctx.with_return_node(value)
            }
            Stmt::Empty => Ok(ctx),
            Stmt::Break => Err(TranslateError::unsupported("break statement")),
            Stmt::Continue => Err(TranslateError::unsupported("continue statement")),
        }
    }

    /// Both branches start from the context after the condition; a missing
    /// `else` is that context unchanged.
    fn translate_if(
        &mut self,
        cond: &Expr,
        then: &Stmt,
        els: Option<&Stmt>,
        ctx: PegContext,
    ) -> Result<PegContext, TranslateError> {
        let cond = self.translate_expr(cond, ctx)?;
        let then_ctx = self.translate_stmt(then, cond.context.clone())?;
        let else_ctx = match els {
            Some(els) => self.translate_stmt(els, cond.context)?,
            None => cond.context,
        };
        PegContext::combine(self.store, &then_ctx, &else_ctx, cond.peg)
    }

    /// Loop translation.
    ///
    /// Every local live at entry, plus both heap components, is rebound to
    /// `theta(init, blank)`. The condition is translated against those
    /// thetas and the body against the post-condition context; each blank is
    /// then bound to the body's final value. After the loop every carried
    /// value becomes `eval(theta, pass(cond))`, starting from the context
    /// the condition left behind. Locals declared in the body do not
    /// survive the loop.
    fn translate_while(
        &mut self,
        cond: &Expr,
        body: &Stmt,
        ctx: PegContext,
    ) -> Result<PegContext, TranslateError> {
        let carried: Vec<String> = ctx.locals().keys().cloned().collect();

        let mut loop_ctx = ctx.clone();
        let mut blanks: Vec<NodeId> = Vec::with_capacity(carried.len());
        for name in &carried {
            let (theta, blank) = self.open_theta(ctx.locals()[name.as_str()])?;
            loop_ctx = loop_ctx.with_local(name, theta);
            blanks.push(blank);
        }
        let (state, state_blank) = self.open_theta(ctx.heap().state)?;
        let (status, status_blank) = self.open_theta(ctx.heap().status)?;
        let heap = self.store.heap_ref_for(state, status)?;
        let loop_ctx = loop_ctx.with_heap(heap);

        let cond = self.translate_expr(cond, loop_ctx)?;
        let body_ctx = self.translate_stmt(body, cond.context.clone())?;

        for (name, blank) in carried.iter().zip(&blanks) {
            let next = body_ctx.lookup(self.store, name)?;
            self.store.assign_blank(*blank, next)?;
        }
        self.store.assign_blank(state_blank, body_ctx.heap().state)?;
        self.store.assign_blank(status_blank, body_ctx.heap().status)?;

        let pass = self.store.pass(cond.peg)?;
        let mut exit_ctx = cond.context;
        for name in &carried {
            let theta = exit_ctx.lookup(self.store, name)?;
            let value = self.store.eval(theta, pass)?;
            exit_ctx = exit_ctx.with_local(name, value);
        }
        let state = self.store.eval(exit_ctx.heap().state, pass)?;
        let status = self.store.eval(exit_ctx.heap().status, pass)?;
        let heap = self.store.heap_ref_for(state, status)?;
        Ok(exit_ctx.with_heap(heap))
    }

    fn open_theta(&mut self, init: NodeId) -> Result<(NodeId, NodeId), TranslateError> {
        let blank = self.store.blank()?;
        let theta = self.store.theta(init, blank)?;
        Ok((theta, blank))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::rc::Rc;

    use mutpeg_core::{NodeStore, PegNode};

    use super::*;
    use crate::ast::BinaryOp;
    use crate::config::TranslateConfig;

    fn name(n: &str) -> Box<Expr> {
        Box::new(Expr::Name { name: n.into() })
    }

    fn assign(target: &str, value: Expr) -> Stmt {
        Stmt::Expr {
            expr: Expr::Assign {
                target: name(target),
                value: Box::new(value),
            },
        }
    }

    fn int(v: i64) -> Expr {
        Expr::IntLit { value: v }
    }

    fn start(store: &mut NodeStore, fields: &[&str], params: &[&str]) -> PegContext {
        let fields: HashSet<String> = fields.iter().map(|s| s.to_string()).collect();
        let params: Vec<String> = params.iter().map(|s| s.to_string()).collect();
        PegContext::init_with_params(store, Rc::new(fields), &params).unwrap()
    }

    #[test]
    fn branch_only_locals_are_dropped() {
        let mut store = NodeStore::new();
        let ctx = start(&mut store, &[], &["c", "x"]);
        let stmt = Stmt::If {
            cond: Expr::Name { name: "c".into() },
            then: Box::new(Stmt::Block {
                stmts: vec![
                    Stmt::Expr {
                        expr: Expr::Declare {
                            declarators: vec![crate::ast::Declarator {
                                name: "t".into(),
                                init: Some(int(1)),
                            }],
                        },
                    },
                    assign("x", int(2)),
                ],
            }),
            els: None,
        };
        let mut t = Translator::new(&mut store, TranslateConfig::default());
        let ctx = t.translate_stmt(&stmt, ctx).unwrap();
        assert!(!ctx.locals().contains_key("t"));
        let x = ctx.locals()["x"];
        assert_eq!(store.deref_string(x).unwrap(), "(phi (var c) 2 (var x))");
    }

    #[test]
    fn field_assignment_in_branch_merges_heap() {
        let mut store = NodeStore::new();
        let ctx = start(&mut store, &["f"], &["this", "c"]);
        let stmt = Stmt::If {
            cond: Expr::Name { name: "c".into() },
            then: Box::new(assign("f", int(1))),
            els: Some(Box::new(Stmt::Empty)),
        };
        let mut t = Translator::new(&mut store, TranslateConfig::default());
        let ctx = t.translate_stmt(&stmt, ctx).unwrap();
        assert_eq!(
            store.deref_string(ctx.heap().state).unwrap(),
            "(phi (var c) (wr (path (var this) (derefs f)) 1 (heap 0 unit)) 0)"
        );
        assert_eq!(
            store.deref_string(ctx.heap().status).unwrap(),
            "(phi (var c) unit unit)"
        );
    }

    #[test]
    fn loop_binds_every_theta() {
        let mut store = NodeStore::new();
        let ctx = start(&mut store, &[], &["i", "n"]);
        let stmt = Stmt::While {
            cond: Expr::Binary {
                op: BinaryOp::Lt,
                lhs: name("i"),
                rhs: name("n"),
            },
            body: Box::new(assign(
                "i",
                Expr::Binary {
                    op: BinaryOp::Add,
                    lhs: name("i"),
                    rhs: Box::new(int(1)),
                },
            )),
        };
        let mut t = Translator::new(&mut store, TranslateConfig::default());
        let ctx = t.translate_stmt(&stmt, ctx).unwrap();

        let i = ctx.locals()["i"];
        let PegNode::Op { children, .. } = store.get(i).unwrap() else {
            panic!("expected eval node");
        };
        let theta = children[0];
        let (_, next) = store.theta_parts(theta).unwrap();
        let cont = store.continuation(theta).unwrap().unwrap();
        assert_ne!(next, cont);
        assert_eq!(store.blank_value(next), Some(cont));
        assert_eq!(
            store.deref_string(cont).unwrap(),
            format!("(+ {} 1)", store.deref_string(theta).unwrap())
        );

        // `n` is loop invariant: its theta continues with itself.
        let n = ctx.locals()["n"];
        let PegNode::Op { children, .. } = store.get(n).unwrap() else {
            panic!("expected eval node");
        };
        assert_eq!(store.continuation(children[0]).unwrap(), Some(children[0]));
        assert_eq!(store.blank_assignments().count(), 4);
    }

    #[test]
    fn break_is_rejected() {
        let mut store = NodeStore::new();
        let ctx = start(&mut store, &[], &[]);
        let mut t = Translator::new(&mut store, TranslateConfig::default());
        let err = t.translate_stmt(&Stmt::Break, ctx).unwrap_err();
        assert!(matches!(err, TranslateError::Unsupported { .. }));
    }
}
