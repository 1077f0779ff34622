//! JSON report of a translation unit.
//!
//! A report carries everything needed to rebuild the graphs offline: the
//! per-method roots, the full node table (thetas with their resolved
//! continuation) and the confirmed equivalences.

use std::path::Path;

use mutpeg_core::{CoreError, Equivalences, NodeId, NodeStore, PegNode};
use serde::Serialize;

/// What happened to one mutant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum MutantOutcome {
    /// Translated to the same root as the original.
    Deduplicated,
    /// Structurally equivalent to the original under a node bijection.
    Equivalent,
    /// Not equivalent; `witness` explains the first difference.
    Distinct { witness: String },
    Failed { reason: String },
    /// The original method could not be translated.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MutantRecord {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<NodeId>,
    #[serde(flatten)]
    pub outcome: MutantOutcome,
}

/// One method of a subject class and its mutants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectRecord {
    pub subject: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<NodeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub mutants: Vec<MutantRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeRecord {
    pub id: NodeId,
    #[serde(flatten)]
    pub node: PegNode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuation: Option<NodeId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub inputs: Vec<String>,
    pub subjects: Vec<SubjectRecord>,
    pub nodes: Vec<NodeRecord>,
    pub equivalences: Equivalences,
}

/// Failure to write a report.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write report '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl Report {
    /// Snapshots the node table of `store` alongside the given records.
    pub fn build(
        store: &NodeStore,
        inputs: Vec<String>,
        subjects: Vec<SubjectRecord>,
        equivalences: Equivalences,
    ) -> Result<Self, CoreError> {
        let mut nodes = Vec::with_capacity(store.len());
        for (id, node) in store.iter() {
            let continuation = match node {
                PegNode::Theta { .. } => store.continuation(id)?,
                _ => None,
            };
            nodes.push(NodeRecord {
                id,
                node: node.clone(),
                continuation,
            });
        }
        Ok(Report {
            inputs,
            subjects,
            nodes,
            equivalences,
        })
    }

    /// Writes `reports` to `path` as one pretty-printed JSON array.
    pub fn write_all(reports: &[Report], path: &Path) -> Result<(), ReportError> {
        let json = serde_json::to_string_pretty(reports)?;
        std::fs::write(path, json).map_err(|source| ReportError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}
