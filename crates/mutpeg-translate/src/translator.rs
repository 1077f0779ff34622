//! Method and class translation entry points.
//!
//! A [`Translator`] borrows the node store mutably for its whole lifetime,
//! so exactly one translation can intern nodes into a store at a time.

use std::collections::HashSet;
use std::rc::Rc;

use indexmap::IndexMap;
use mutpeg_core::{NodeId, NodeStore};

use crate::ast::{ClassDecl, MethodDecl, Stmt};
use crate::config::TranslateConfig;
use crate::context::PegContext;
use crate::error::TranslateError;
use crate::validate::validate_method;

/// Per-method outcomes of [`Translator::translate_class`], keyed by
/// canonical signature.
pub type ClassTranslation = IndexMap<String, Result<NodeId, TranslateError>>;

pub struct Translator<'s> {
    pub(crate) store: &'s mut NodeStore,
    pub(crate) config: TranslateConfig,
}

impl<'s> Translator<'s> {
    pub fn new(store: &'s mut NodeStore, config: TranslateConfig) -> Self {
        Translator { store, config }
    }

    pub fn config(&self) -> &TranslateConfig {
        &self.config
    }

    /// Translates one method body into its `method-root` node.
    ///
    /// `fields` names the enclosing class's fields; plain names that resolve
    /// to an unshadowed field are read and written through `this`.
    pub fn translate_method(
        &mut self,
        fields: Rc<HashSet<String>>,
        method: &MethodDecl,
    ) -> Result<NodeId, TranslateError> {
        if self.config.validate {
            validate_method(method)?;
        }
        check_returns(&method.body)?;

        let mut ctx = PegContext::init_with_params(self.store, fields, &method.param_names())?;
        for stmt in &method.body {
            ctx = self.translate_stmt(stmt, ctx)?;
        }
        ctx.as_peg(self.store)
    }

    /// Translates every method of `class` in name order.
    ///
    /// Failures are kept per method; one bad method does not stop the rest.
    pub fn translate_class(&mut self, class: &ClassDecl) -> ClassTranslation {
        let fields: Rc<HashSet<String>> =
            Rc::new(class.field_names().map(str::to_string).collect());

        let mut methods: Vec<&MethodDecl> = class.methods.iter().collect();
        methods.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.signature().cmp(&b.signature())));

        let mut results = IndexMap::with_capacity(methods.len());
        for method in methods {
            let result = self.translate_method(Rc::clone(&fields), method);
            results.insert(method.signature(), result);
        }
        results
    }
}

/// At most one return, and only as the last top-level statement.
fn check_returns(body: &[Stmt]) -> Result<(), TranslateError> {
    let total: usize = body.iter().map(Stmt::count_returns).sum();
    if total > 1 {
        return Err(TranslateError::MultipleReturns);
    }
    if total == 1 && !matches!(body.last(), Some(Stmt::Return { .. })) {
        return Err(TranslateError::InvalidReturn {
            reason: "return is not the last statement of the method".into(),
        });
    }
    Ok(())
}
