//! Textual forms of PEG subgraphs.
//!
//! Two renderings are provided:
//!
//! - [`NodeStore::deref_string`]: compact prefix form used in diagnostics and
//!   tests (`(+ (var a) 1)`).
//! - [`PegPrinter`]: full form with tagged literals (`(int-lit 1)`) where
//!   theta nodes print once as `(theta[N] init)`, afterwards as the label
//!   `theta[N]`, and their continuations are listed in a separate
//!   identification table so loops never expand forever.

use std::collections::{HashMap, VecDeque};

use crate::error::CoreError;
use crate::id::NodeId;
use crate::node::PegNode;
use crate::store::NodeStore;

impl NodeStore {
    /// Compact prefix rendering of the subgraph rooted at `id`.
    pub fn deref_string(&self, id: NodeId) -> Result<String, CoreError> {
        let mut memo = HashMap::new();
        self.deref_into(id, &mut memo)
    }

    fn deref_into(
        &self,
        id: NodeId,
        memo: &mut HashMap<NodeId, String>,
    ) -> Result<String, CoreError> {
        if let Some(s) = memo.get(&id) {
            return Ok(s.clone());
        }
        let node = self.get(id)?;
        let rendered = match node {
            PegNode::IntLit { value } => value.to_string(),
            PegNode::BoolLit { value } => value.to_string(),
            PegNode::StringLit { value } => format!("\"{value}\""),
            _ => {
                let symbol = node.op_symbol().unwrap_or_default();
                let children = node.children();
                if children.is_empty() {
                    symbol.to_string()
                } else {
                    let mut out = format!("({symbol}");
                    for child in children {
                        out.push(' ');
                        out.push_str(&self.deref_into(child, memo)?);
                    }
                    out.push(')');
                    out
                }
            }
        };
        memo.insert(id, rendered.clone());
        Ok(rendered)
    }
}

/// Full-form printer with a theta identification table.
pub struct PegPrinter<'s> {
    store: &'s NodeStore,
    labels: HashMap<NodeId, usize>,
    pending: VecDeque<NodeId>,
    memo: HashMap<NodeId, String>,
}

impl<'s> PegPrinter<'s> {
    pub fn new(store: &'s NodeStore) -> Self {
        PegPrinter {
            store,
            labels: HashMap::new(),
            pending: VecDeque::new(),
            memo: HashMap::new(),
        }
    }

    /// Renders `root` followed by the identification table:
    ///
    /// ```text
    /// Peg: <root>
    /// Identifications: (
    ///   (<=> theta[0] <continuation>))
    /// ```
    ///
    /// Thetas whose continuation is still unassigned get no entry.
    pub fn print(mut self, root: NodeId) -> Result<String, CoreError> {
        let body = self.render(root)?;
        let mut table = String::from("(");
        while let Some(theta) = self.pending.pop_front() {
            let Some(cont) = self.store.continuation(theta)? else {
                continue;
            };
            let rendered = self.render(cont)?;
            let label = self.labels.get(&theta).copied().unwrap_or_default();
            table.push_str(&format!("\n  (<=> theta[{label}] {rendered})"));
        }
        table.push(')');
        Ok(format!("Peg: {body}\nIdentifications: {table}"))
    }

    fn render(&mut self, id: NodeId) -> Result<String, CoreError> {
        if let Some(s) = self.memo.get(&id) {
            return Ok(s.clone());
        }
        let store = self.store;
        let node = store.get(id)?;
        let rendered = match node {
            PegNode::IntLit { value } => format!("(int-lit {value})"),
            PegNode::BoolLit { value } => format!("(bool-lit {value})"),
            PegNode::StringLit { value } => format!("(string-lit {value})"),
            PegNode::Blank { seq, .. } => format!("blank[{seq}]"),
            PegNode::Theta { init, .. } => {
                let label = self.labels.len();
                self.labels.insert(id, label);
                self.pending.push_back(id);
                // Later occurrences, including ones inside `init`, print
                // only the label.
                self.memo.insert(id, format!("theta[{label}]"));
                let init = self.render(*init)?;
                return Ok(format!("(theta[{label}] {init})"));
            }
            _ => {
                let symbol = node.op_symbol().unwrap_or_default();
                let children = node.children();
                if children.is_empty() {
                    symbol.to_string()
                } else {
                    let mut out = format!("({symbol}");
                    for child in children {
                        out.push(' ');
                        out.push_str(&self.render(child)?);
                    }
                    out.push(')');
                    out
                }
            }
        };
        self.memo.insert(id, rendered.clone());
        Ok(rendered)
    }
}
