//! Batch translation of subjects and their mutants.
//!
//! A [`Session`] owns the node store for a run. Each subject's class is
//! translated method by method; every mutant is then translated into the
//! same store, so a mutant that changes nothing observable lands on the
//! original's root id. Mutants with a different root go through
//! [`check_equivalence`].

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::rc::Rc;

use mutpeg_core::{check_equivalence, Equivalences, NodeId, NodeStore};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::ast::ClassDecl;
use crate::config::TranslateConfig;
use crate::error::TranslateError;
use crate::report::{MutantOutcome, MutantRecord, Report, SubjectRecord};
use crate::translator::Translator;

/// Top level of an input file. Entries stay raw so that one malformed
/// subject does not reject the whole file.
#[derive(Debug, Clone, Deserialize)]
pub struct SubjectFile {
    pub subjects: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Subject {
    pub name: String,
    pub class: ClassDecl,
    #[serde(default)]
    pub mutants: Vec<serde_json::Value>,
}

/// A mutated copy of the subject class; `method` is the signature of the
/// mutated method.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Mutant {
    pub id: String,
    pub method: String,
    pub class: ClassDecl,
}

/// Running totals across every subject seen by a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub subjects: usize,
    pub translated: usize,
    pub failed_translations: usize,
    pub failed_parses: usize,
    pub skipped_mutants: usize,
    pub deduplicated: usize,
    pub equivalent: usize,
    pub distinct: usize,
    /// Failure message to number of occurrences.
    pub failure_reasons: BTreeMap<String, usize>,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("'{path}' is not a subject file: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

pub struct Session {
    store: NodeStore,
    config: TranslateConfig,
    equivalences: Equivalences,
    records: Vec<SubjectRecord>,
    stats: SessionStats,
}

impl Session {
    pub fn new(config: TranslateConfig) -> Self {
        Session {
            store: NodeStore::new(),
            config,
            equivalences: Equivalences::new(),
            records: Vec::new(),
            stats: SessionStats::default(),
        }
    }

    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    pub fn config(&self) -> &TranslateConfig {
        &self.config
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn equivalences(&self) -> &Equivalences {
        &self.equivalences
    }

    /// Records accumulated since the last [`finish_unit`](Self::finish_unit).
    pub fn records(&self) -> &[SubjectRecord] {
        &self.records
    }

    /// Reads a subject file and processes every entry in it.
    ///
    /// Returns the number of entries that parsed as subjects. An unreadable
    /// or malformed file counts as one parse failure; the session stays
    /// usable for the remaining inputs.
    pub fn load_file(&mut self, path: &Path) -> Result<usize, SessionError> {
        let result = self.read_file(path);
        if let Err(e) = &result {
            warn!(error = %e, "skipping subject file");
            self.stats.failed_parses += 1;
        }
        result
    }

    fn read_file(&mut self, path: &Path) -> Result<usize, SessionError> {
        let text = std::fs::read_to_string(path).map_err(|source| SessionError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let file: SubjectFile = serde_json::from_str(&text).map_err(|source| SessionError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        info!(path = %path.display(), entries = file.subjects.len(), "loaded subject file");

        let mut parsed = 0;
        for entry in file.subjects {
            if self.add_subject_json(entry) {
                parsed += 1;
            }
        }
        Ok(parsed)
    }

    /// Parses and processes one raw subject entry. A malformed entry is
    /// counted as a parse failure and `false` is returned.
    pub fn add_subject_json(&mut self, entry: serde_json::Value) -> bool {
        match serde_json::from_value::<Subject>(entry) {
            Ok(subject) => {
                self.add_subject(&subject);
                true
            }
            Err(e) => {
                warn!(error = %e, "skipping malformed subject");
                self.stats.failed_parses += 1;
                false
            }
        }
    }

    pub fn add_subject(&mut self, subject: &Subject) {
        info!(
            subject = %subject.name,
            methods = subject.class.methods.len(),
            mutants = subject.mutants.len(),
            "translating subject"
        );
        self.stats.subjects += 1;

        let originals = Translator::new(&mut self.store, self.config).translate_class(&subject.class);
        let first_record = self.records.len();
        for (signature, result) in &originals {
            let (root, error) = match result {
                Ok(root) => {
                    self.stats.translated += 1;
                    (Some(*root), None)
                }
                Err(e) => {
                    warn!(subject = %subject.name, method = %signature, error = %e, "original not translated");
                    self.record_failure(e);
                    (None, Some(e.to_string()))
                }
            };
            self.records.push(SubjectRecord {
                subject: subject.name.clone(),
                method: signature.clone(),
                root,
                error,
                mutants: Vec::new(),
            });
        }

        for entry in &subject.mutants {
            let mutant = match serde_json::from_value::<Mutant>(entry.clone()) {
                Ok(mutant) => mutant,
                Err(e) => {
                    warn!(subject = %subject.name, error = %e, "skipping malformed mutant");
                    self.stats.failed_parses += 1;
                    continue;
                }
            };
            let original = originals
                .get(&mutant.method)
                .and_then(|r| r.as_ref().ok())
                .copied();
            let record = self.process_mutant(&mutant, original);
            match self.records[first_record..]
                .iter_mut()
                .find(|r| r.method == mutant.method)
            {
                Some(subject_record) => subject_record.mutants.push(record),
                None => self.records.push(SubjectRecord {
                    subject: subject.name.clone(),
                    method: mutant.method.clone(),
                    root: None,
                    error: Some(
                        TranslateError::MethodNotFound {
                            signature: mutant.method.clone(),
                        }
                        .to_string(),
                    ),
                    mutants: vec![record],
                }),
            }
        }

        let stats = &self.stats;
        info!(
            subjects = stats.subjects,
            translated = stats.translated,
            failed_translations = stats.failed_translations,
            failed_parses = stats.failed_parses,
            skipped_mutants = stats.skipped_mutants,
            deduplicated = stats.deduplicated,
            equivalent = stats.equivalent,
            distinct = stats.distinct,
            "running totals"
        );
    }

    fn process_mutant(&mut self, mutant: &Mutant, original: Option<NodeId>) -> MutantRecord {
        let record = |root, outcome| MutantRecord {
            id: mutant.id.clone(),
            root,
            outcome,
        };

        let Some(original) = original else {
            warn!(mutant = %mutant.id, method = %mutant.method, "no translated original; skipping mutant");
            self.stats.skipped_mutants += 1;
            return record(None, MutantOutcome::Skipped);
        };

        let root = match self.translate_mutant(mutant) {
            Ok(root) => root,
            Err(e) => {
                warn!(mutant = %mutant.id, error = %e, "mutant not translated");
                self.record_failure(&e);
                return record(
                    None,
                    MutantOutcome::Failed {
                        reason: e.to_string(),
                    },
                );
            }
        };
        self.stats.translated += 1;

        if root == original {
            debug!(mutant = %mutant.id, %root, "mutant deduplicated");
            self.stats.deduplicated += 1;
            return record(Some(root), MutantOutcome::Deduplicated);
        }

        let outcome = match self.compare(original, root) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.record_failure(&e);
                MutantOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };
        record(Some(root), outcome)
    }

    fn translate_mutant(&mut self, mutant: &Mutant) -> Result<NodeId, TranslateError> {
        let method = mutant
            .class
            .method(&mutant.method)
            .ok_or_else(|| TranslateError::MethodNotFound {
                signature: mutant.method.clone(),
            })?;
        let fields: HashSet<String> = mutant.class.field_names().map(str::to_string).collect();
        Translator::new(&mut self.store, self.config).translate_method(Rc::new(fields), method)
    }

    fn compare(&mut self, original: NodeId, root: NodeId) -> Result<MutantOutcome, TranslateError> {
        match check_equivalence(&self.store, original, root)? {
            None => {
                self.stats.equivalent += 1;
                match self.equivalences.add_equivalence(original, root) {
                    Ok(()) => debug!(%original, %root, "recorded equivalence"),
                    Err(e) => debug!(%original, %root, error = %e, "equivalence not recorded"),
                }
                Ok(MutantOutcome::Equivalent)
            }
            Some(witness) => {
                self.stats.distinct += 1;
                let witness = witness.describe(&self.store)?;
                debug!(%original, %root, %witness, "mutant distinct");
                Ok(MutantOutcome::Distinct { witness })
            }
        }
    }

    fn record_failure(&mut self, error: &TranslateError) {
        self.stats.failed_translations += 1;
        *self
            .stats
            .failure_reasons
            .entry(error.to_string())
            .or_insert(0) += 1;
    }

    /// Builds a report for everything processed since the last call, then
    /// clears the store so the next unit numbers its nodes from zero.
    /// Statistics keep accumulating.
    pub fn finish_unit(&mut self, inputs: Vec<String>) -> Result<Report, TranslateError> {
        let report = Report::build(
            &self.store,
            inputs,
            std::mem::take(&mut self.records),
            std::mem::take(&mut self.equivalences),
        )?;
        self.store.clear_all();
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn class(body_value: serde_json::Value) -> serde_json::Value {
        json!({
            "name": "C",
            "fields": [{ "name": "x", "ty": "int" }],
            "methods": [{
                "name": "f",
                "params": [{ "name": "a", "ty": "int" }],
                "body": [
                    { "kind": "expr", "expr": {
                        "kind": "assign",
                        "target": { "kind": "name", "name": "x" },
                        "value": body_value
                    }},
                    { "kind": "return", "value": { "kind": "name", "name": "x" } }
                ]
            }]
        })
    }

    #[test]
    fn identical_mutant_is_deduplicated() {
        let value = json!({ "kind": "name", "name": "a" });
        let subject = json!({
            "name": "s",
            "class": class(value.clone()),
            "mutants": [{ "id": "m1", "method": "f(int)", "class": class(value) }]
        });
        let mut session = Session::new(TranslateConfig::default());
        assert!(session.add_subject_json(subject));
        let stats = session.stats();
        assert_eq!(stats.translated, 2);
        assert_eq!(stats.deduplicated, 1);
        assert_eq!(session.records()[0].mutants[0].outcome, MutantOutcome::Deduplicated);
    }

    #[test]
    fn malformed_entries_are_counted() {
        let mut session = Session::new(TranslateConfig::default());
        assert!(!session.add_subject_json(json!({ "name": 3 })));
        let subject = json!({
            "name": "s",
            "class": class(json!({ "kind": "int-lit", "value": 1 })),
            "mutants": [{ "id": "m1" }]
        });
        assert!(session.add_subject_json(subject));
        assert_eq!(session.stats().failed_parses, 2);
    }

    #[test]
    fn unreadable_files_are_counted_and_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let garbage = dir.path().join("garbage.json");
        std::fs::write(&garbage, "not json").unwrap();
        let good = dir.path().join("good.json");
        let file = json!({
            "subjects": [{
                "name": "s",
                "class": class(json!({ "kind": "int-lit", "value": 1 })),
                "mutants": []
            }]
        });
        std::fs::write(&good, file.to_string()).unwrap();

        let mut session = Session::new(TranslateConfig::default());
        assert!(matches!(
            session.load_file(&dir.path().join("missing.json")),
            Err(SessionError::Io { .. })
        ));
        assert!(matches!(
            session.load_file(&garbage),
            Err(SessionError::Parse { .. })
        ));
        assert_eq!(session.load_file(&good).unwrap(), 1);
        let stats = session.stats();
        assert_eq!(stats.failed_parses, 2);
        assert_eq!(stats.subjects, 1);
        assert_eq!(stats.translated, 1);
    }

    #[test]
    fn mutant_of_missing_method_fails() {
        let subject = json!({
            "name": "s",
            "class": class(json!({ "kind": "int-lit", "value": 1 })),
            "mutants": [{ "id": "m1", "method": "g()", "class": class(json!({ "kind": "int-lit", "value": 1 })) }]
        });
        let mut session = Session::new(TranslateConfig::default());
        session.add_subject_json(subject);
        let stats = session.stats();
        assert_eq!(stats.skipped_mutants, 1);
        let missing = session.records().iter().find(|r| r.method == "g()").unwrap();
        assert!(missing.error.as_deref().unwrap().contains("method not found"));
    }

    #[test]
    fn finish_unit_resets_ids() {
        let subject = json!({
            "name": "s",
            "class": class(json!({ "kind": "int-lit", "value": 1 })),
        });
        let mut session = Session::new(TranslateConfig::default());
        session.add_subject_json(subject.clone());
        let first = session.finish_unit(vec!["a.json".into()]).unwrap();
        assert!(session.store().is_empty());
        session.add_subject_json(subject);
        let second = session.finish_unit(vec!["b.json".into()]).unwrap();
        assert_eq!(first.subjects[0].root, second.subjects[0].root);
        assert_eq!(first.nodes, second.nodes);
        assert_eq!(session.stats().subjects, 2);
    }
}
