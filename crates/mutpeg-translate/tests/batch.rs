//! Batch session tests: subject files in, JSON reports out.

use mutpeg_translate::{Report, Session, SessionError, TranslateConfig};
use serde_json::json;

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

/// Class `C` with a single counting loop `sum(int,int)` stepping by `step`.
fn class(step: i64) -> serde_json::Value {
    let name = |n: &str| json!({ "kind": "name", "name": n });
    json!({
        "name": "C",
        "fields": [],
        "methods": [{
            "name": "sum",
            "params": [{ "name": "i", "ty": "int" }, { "name": "n", "ty": "int" }],
            "is_static": true,
            "body": [
                {
                    "kind": "while",
                    "cond": { "kind": "binary", "op": "<", "lhs": name("i"), "rhs": name("n") },
                    "body": { "kind": "expr", "expr": {
                        "kind": "assign",
                        "target": name("i"),
                        "value": { "kind": "binary", "op": "+", "lhs": name("i"), "rhs": { "kind": "int-lit", "value": step } }
                    }}
                },
                { "kind": "return", "value": name("i") }
            ]
        }]
    })
}

fn subject_file() -> serde_json::Value {
    json!({
        "subjects": [
            {
                "name": "loops",
                "class": class(1),
                "mutants": [
                    { "id": "same", "method": "sum(int,int)", "class": class(1) },
                    { "id": "step", "method": "sum(int,int)", "class": class(2) },
                    { "id": "broken", "method": "sum(int,int)" }
                ]
            },
            { "name": "not a subject" }
        ]
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn session_tallies_outcomes() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("subjects.json");
    std::fs::write(&input, subject_file().to_string()).unwrap();

    let mut session = Session::new(TranslateConfig::default());
    let parsed = session.load_file(&input).unwrap();
    assert_eq!(parsed, 1);

    let stats = session.stats().clone();
    assert_eq!(stats.subjects, 1);
    assert_eq!(stats.translated, 3);
    assert_eq!(stats.failed_parses, 2);
    assert_eq!(stats.equivalent, 1);
    assert_eq!(stats.distinct, 1);
    assert_eq!(stats.deduplicated, 0);
    assert_eq!(session.equivalences().len(), 1);
}

#[test]
fn report_round_trips_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("subjects.json");
    let output = dir.path().join("report.json");
    std::fs::write(&input, subject_file().to_string()).unwrap();

    let mut session = Session::new(TranslateConfig::default());
    session.load_file(&input).unwrap();
    let report = session
        .finish_unit(vec![input.display().to_string()])
        .unwrap();
    Report::write_all(std::slice::from_ref(&report), &output).unwrap();

    let text = std::fs::read_to_string(&output).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    let reports = value.as_array().unwrap();
    assert_eq!(reports.len(), 1);

    let subject = &reports[0]["subjects"][0];
    assert_eq!(subject["subject"], "loops");
    assert_eq!(subject["method"], "sum(int,int)");
    let outcomes: Vec<&str> = subject["mutants"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["outcome"].as_str().unwrap())
        .collect();
    assert_eq!(outcomes, ["equivalent", "distinct"]);

    let nodes = reports[0]["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), report.nodes.len());
    let thetas: Vec<&serde_json::Value> = nodes.iter().filter(|n| n["kind"] == "theta").collect();
    assert!(!thetas.is_empty());
    assert!(thetas.iter().all(|t| t["continuation"].is_u64()));

    let pairs = reports[0]["equivalences"]["pairs"].as_array().unwrap();
    assert_eq!(pairs.len(), 1);
}

#[test]
fn missing_input_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = Session::new(TranslateConfig::default());
    let err = session.load_file(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, SessionError::Io { .. }));
}
