//! End-to-end translation tests.
//!
//! Methods are written as JSON ASTs, translated into a fresh store and
//! checked through their compact renderings or the equivalence checker.

use std::collections::HashSet;
use std::rc::Rc;

use mutpeg_core::{check_equivalence, NodeId, NodeStore, PegNode, Witness};
use mutpeg_translate::{
    BinaryOp, Expr, MethodDecl, PegContext, TranslateConfig, TranslateError, Translator,
};
use proptest::prelude::*;
use serde_json::json;

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

fn method(params: serde_json::Value, body: serde_json::Value) -> MethodDecl {
    serde_json::from_value(json!({ "name": "f", "params": params, "body": body }))
        .expect("method AST")
}

fn fields(names: &[&str]) -> Rc<HashSet<String>> {
    Rc::new(names.iter().map(|s| s.to_string()).collect())
}

fn translate(store: &mut NodeStore, field_names: &[&str], m: &MethodDecl) -> NodeId {
    Translator::new(store, TranslateConfig::default())
        .translate_method(fields(field_names), m)
        .expect("translation")
}

fn name(n: &str) -> serde_json::Value {
    json!({ "kind": "name", "name": n })
}

fn int(v: i64) -> serde_json::Value {
    json!({ "kind": "int-lit", "value": v })
}

fn assign(target: serde_json::Value, value: serde_json::Value) -> serde_json::Value {
    json!({ "kind": "expr", "expr": { "kind": "assign", "target": target, "value": value } })
}

fn binary(op: &str, lhs: serde_json::Value, rhs: serde_json::Value) -> serde_json::Value {
    json!({ "kind": "binary", "op": op, "lhs": lhs, "rhs": rhs })
}

fn ret(value: serde_json::Value) -> serde_json::Value {
    json!({ "kind": "return", "value": value })
}

fn int_params(names: &[&str]) -> serde_json::Value {
    json!(names
        .iter()
        .map(|n| json!({ "name": n, "ty": "int" }))
        .collect::<Vec<_>>())
}

/// `for` loop rendered as `while (i < n) { i = i + step; }`, returning `i`.
fn counting_loop(step: i64) -> MethodDecl {
    method(
        int_params(&["i", "n"]),
        json!([
            {
                "kind": "while",
                "cond": binary("<", name("i"), name("n")),
                "body": assign(name("i"), binary("+", name("i"), int(step)))
            },
            ret(name("i"))
        ]),
    )
}

// ---------------------------------------------------------------------------
// Heap and fields
// ---------------------------------------------------------------------------

#[test]
fn field_write_then_read() {
    let m = method(
        int_params(&["a"]),
        json!([
            assign(name("x"), binary("-", name("a"), name("a"))),
            ret(name("x"))
        ]),
    );
    let mut store = NodeStore::new();
    let root = translate(&mut store, &["x"], &m);
    assert_eq!(
        store.deref_string(root).unwrap(),
        "(method-root (rd (path (var this) (derefs x)) (heap (wr (path (var this) (derefs x)) \
         (- (var a) (var a)) (heap 0 unit)) unit)) (heap (wr (path (var this) (derefs x)) \
         (- (var a) (var a)) (heap 0 unit)) unit))"
    );

    let zero = method(
        int_params(&["a"]),
        json!([assign(name("x"), int(0)), ret(name("x"))]),
    );
    let other = translate(&mut store, &["x"], &zero);
    assert_ne!(root, other);
    let witness = check_equivalence(&store, root, other).unwrap();
    assert!(matches!(witness, Some(Witness::EquivalenceError { .. })));
}

#[test]
fn local_shadows_field() {
    let m = method(
        int_params(&["x"]),
        json!([assign(name("x"), int(3)), ret(name("x"))]),
    );
    let mut store = NodeStore::new();
    let root = translate(&mut store, &["x"], &m);
    assert_eq!(
        store.deref_string(root).unwrap(),
        "(method-root 3 (heap 0 unit))"
    );
}

#[test]
fn chained_dereference_checks_each_link() {
    let this_fa = json!({ "kind": "field-access", "scope": { "kind": "this" }, "name": "fa" });
    let fa_fa = json!({ "kind": "field-access", "scope": this_fa, "name": "fa" });
    let y = json!({ "kind": "field-access", "scope": fa_fa, "name": "y" });
    let m = method(json!([]), json!([ret(y)]));

    let mut store = NodeStore::new();
    let root = translate(&mut store, &["fa", "y"], &m);
    let PegNode::Op { children, .. } = store.get(root).unwrap() else {
        panic!("expected method root");
    };
    let heap = store.heap_ref(children[1]).unwrap();

    let r1 = "(rd (path (var this) (derefs fa)) (heap 0 unit))";
    let r2 = format!("(rd (path {r1} (derefs fa)) (heap 0 unit))");
    let s1 = format!("(phi (isnull? {r1}) null-pointer-exception unit)");
    assert_eq!(
        store.deref_string(heap.status).unwrap(),
        format!("(phi (isunit? {s1}) (phi (isnull? {r2}) null-pointer-exception unit) {s1})")
    );
}

#[test]
fn assignment_after_possible_exit_is_guarded() {
    let read = json!({ "kind": "field-access", "scope": name("p"), "name": "v" });
    let m = method(
        json!([{ "name": "p", "ty": "P" }, { "name": "b", "ty": "int" }]),
        json!([assign(name("b"), read), assign(name("b"), int(1)), ret(name("b"))]),
    );
    let mut store = NodeStore::new();
    let root = translate(&mut store, &[], &m);
    let PegNode::Op { children, .. } = store.get(root).unwrap() else {
        panic!("expected method root");
    };
    let value = children[0];
    let rendered = store.deref_string(value).unwrap();
    assert!(rendered.starts_with("(phi (isnull? (var p)) (phi (isnull? (var p)) (var b) (rd"));
    assert!(rendered.ends_with(" 1)"));
}

// ---------------------------------------------------------------------------
// Branches
// ---------------------------------------------------------------------------

#[test]
fn branch_local_is_gone_after_merge() {
    let declare = json!({
        "kind": "expr",
        "expr": { "kind": "declare", "declarators": [{ "name": "t", "init": int(1) }] }
    });
    let m = method(
        json!([{ "name": "c", "ty": "boolean" }]),
        json!([
            { "kind": "if", "cond": name("c"), "then": { "kind": "block", "stmts": [declare] } },
            ret(name("t"))
        ]),
    );
    let mut store = NodeStore::new();
    let root = translate(&mut store, &[], &m);
    let unit = store.unit().unwrap();
    let PegNode::Op { children, .. } = store.get(root).unwrap() else {
        panic!("expected method root");
    };
    assert_eq!(children[0], unit);
}

#[test]
fn disjoint_branch_assignments_do_not_survive() {
    let stmt: mutpeg_translate::Stmt = serde_json::from_value(json!({
        "kind": "if",
        "cond": name("c"),
        "then": assign(name("a"), int(1)),
        "els": assign(name("b"), int(2))
    }))
    .unwrap();
    let mut store = NodeStore::new();
    let ctx = PegContext::init_with_params(&mut store, fields(&[]), &["c".to_string()]).unwrap();
    let merged = Translator::new(&mut store, TranslateConfig::default())
        .translate_stmt(&stmt, ctx)
        .unwrap();
    let names: Vec<&str> = merged.locals().keys().map(String::as_str).collect();
    assert_eq!(names, ["c"]);
    assert_eq!(
        store.deref_string(merged.heap().id).unwrap(),
        "(heap (phi (var c) 0 0) (phi (var c) unit unit))"
    );
}

#[test]
fn both_branches_returning_is_rejected() {
    let m = method(
        json!([{ "name": "c", "ty": "boolean" }]),
        json!([{ "kind": "if", "cond": name("c"), "then": ret(int(1)), "els": ret(int(2)) }]),
    );
    let mut store = NodeStore::new();
    let config = TranslateConfig {
        validate: false,
        ..TranslateConfig::default()
    };
    let err = Translator::new(&mut store, config)
        .translate_method(fields(&[]), &m)
        .unwrap_err();
    assert_eq!(err, TranslateError::MultipleReturns);
}

// ---------------------------------------------------------------------------
// Folding and arithmetic
// ---------------------------------------------------------------------------

#[test]
fn self_comparison_folds() {
    let mut store = NodeStore::new();
    let eq = method(int_params(&["x"]), json!([ret(binary("==", name("x"), name("x")))]));
    let ne = method(int_params(&["x"]), json!([ret(binary("!=", name("x"), name("x")))]));
    let eq = translate(&mut store, &[], &eq);
    let ne = translate(&mut store, &[], &ne);
    assert_eq!(store.deref_string(eq).unwrap(), "(method-root true (heap 0 unit))");
    assert_eq!(store.deref_string(ne).unwrap(), "(method-root false (heap 0 unit))");
}

#[test]
fn division_by_zero_stays_symbolic() {
    let mut store = NodeStore::new();
    let div = method(int_params(&["a"]), json!([ret(binary("/", name("a"), int(0)))]));
    let rem = method(int_params(&["a"]), json!([ret(binary("%", name("a"), int(0)))]));
    let div = translate(&mut store, &[], &div);
    let rem = translate(&mut store, &[], &rem);
    let div = store.deref_string(div).unwrap();
    let rem = store.deref_string(rem).unwrap();
    assert!(div.starts_with("(method-root (/ (var a) 0)"));
    assert!(div.contains("(phi (== 0 0) divide-by-zero-exception unit)"));
    assert!(rem.starts_with("(method-root (% (var a) 0)"));
}

#[test]
fn min_int_through_unary_minus() {
    let neg = json!({ "kind": "unary", "op": "-", "operand": int(2_147_483_648) });
    let m = method(json!([]), json!([ret(neg)]));
    let mut store = NodeStore::new();
    let root = translate(&mut store, &[], &m);
    assert_eq!(
        store.deref_string(root).unwrap(),
        "(method-root -2147483648 (heap 0 unit))"
    );
}

fn fold(op: BinaryOp, a: i32, b: i32) -> PegNode {
    let mut store = NodeStore::new();
    let ctx = PegContext::init_with_params(&mut store, fields(&[]), &[]).unwrap();
    let expr = Expr::Binary {
        op,
        lhs: Box::new(Expr::IntLit { value: a.into() }),
        rhs: Box::new(Expr::IntLit { value: b.into() }),
    };
    let result = Translator::new(&mut store, TranslateConfig::default())
        .translate_expr(&expr, ctx)
        .unwrap();
    store.get(result.peg).unwrap().clone()
}

proptest! {
    #[test]
    fn integer_folding_wraps(a in any::<i32>(), b in any::<i32>()) {
        prop_assert_eq!(fold(BinaryOp::Add, a, b), PegNode::IntLit { value: a.wrapping_add(b) });
        prop_assert_eq!(fold(BinaryOp::Sub, a, b), PegNode::IntLit { value: a.wrapping_sub(b) });
        prop_assert_eq!(fold(BinaryOp::Mul, a, b), PegNode::IntLit { value: a.wrapping_mul(b) });
        prop_assert_eq!(fold(BinaryOp::Xor, a, b), PegNode::IntLit { value: a ^ b });
        prop_assert_eq!(fold(BinaryOp::Le, a, b), PegNode::BoolLit { value: a <= b });
    }

    #[test]
    fn division_folds_only_nonzero_divisors(a in any::<i32>(), b in any::<i32>()) {
        let folded = fold(BinaryOp::Div, a, b);
        if b == 0 {
            prop_assert!(matches!(folded, PegNode::Op { .. }), "expected unfolded Op, got {:?}", folded);
        } else {
            prop_assert_eq!(folded, PegNode::IntLit { value: a.wrapping_div(b) });
        }
    }
}

// ---------------------------------------------------------------------------
// Loops
// ---------------------------------------------------------------------------

#[test]
fn identical_loops_are_equivalent() {
    let mut store = NodeStore::new();
    let first = translate(&mut store, &[], &counting_loop(1));
    let second = translate(&mut store, &[], &counting_loop(1));
    // Fresh blanks keep the two loops apart in the store.
    assert_ne!(first, second);
    assert_eq!(check_equivalence(&store, first, second).unwrap(), None);
    assert!(store.structurally_bijective(first, second).unwrap());
}

#[test]
fn different_steps_are_distinct() {
    let mut store = NodeStore::new();
    let one = translate(&mut store, &[], &counting_loop(1));
    let two = translate(&mut store, &[], &counting_loop(2));
    let witness = check_equivalence(&store, one, two).unwrap();
    assert!(matches!(witness, Some(Witness::EquivalenceError { .. })));
}

#[test]
fn loop_result_is_eval_over_pass() {
    let mut store = NodeStore::new();
    let root = translate(&mut store, &[], &counting_loop(1));
    let rendered = store.deref_string(root).unwrap();
    assert!(rendered.starts_with("(method-root (eval (theta (var i) "));
    assert!(rendered.contains("(pass (< (theta (var i) "));
    store.verify_dag().unwrap();
}
