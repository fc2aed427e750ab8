//! End-to-end evaluation: source text in, values and output out, with the
//! collector running between expressions.

use chibi_lisp::runtime::eval::{EvalError, Evaluator, RuntimeError};
use chibi_lisp::runtime::mem::{MemError, MemoryConfig};
use chibi_lisp::runtime::printer::repr;
use chibi_lisp::syntax::ReadError;

fn evaluator() -> Evaluator {
    Evaluator::new(MemoryConfig::default()).unwrap()
}

fn eval_repr(ev: &mut Evaluator, source: &str) -> String {
    let result = ev.eval_source(source).unwrap();
    repr(ev.heap(), result)
}

#[test]
fn nested_arithmetic() {
    let mut ev = evaluator();
    assert_eq!(eval_repr(&mut ev, "(* (+ 1 2) (- 10 4))"), "18");
    assert_eq!(eval_repr(&mut ev, "(+ (* 2 2) (/ 9 3) (- 0 1))"), "6");
}

#[test]
fn comparison_chains() {
    let mut ev = evaluator();
    assert_eq!(eval_repr(&mut ev, "(< (+ 1 1) (* 2 2))"), "t");
    assert_eq!(eval_repr(&mut ev, "(= (+ 2 2) (* 2 2))"), "t");
    assert_eq!(eval_repr(&mut ev, "(>= 3 (* 2 2))"), "nil");
}

#[test]
fn string_building_and_printing() {
    let mut ev = evaluator();
    assert_eq!(
        eval_repr(&mut ev, "(str \"count: \" (+ 40 2))"),
        "\"count: 42\""
    );

    ev.eval_source("(println (str \"a\" \"b\" \"c\"))").unwrap();
    assert_eq!(ev.take_output(), "abc\n");
}

#[test]
fn dotimes_accumulates_output() {
    let mut ev = evaluator();
    ev.eval_source("(dotimes (i 5) (print (* i i)))").unwrap();
    assert_eq!(ev.take_output(), "0\n1\n4\n9\n16\n");
}

#[test]
fn nested_dotimes_scopes_independently() {
    let mut ev = evaluator();
    ev.eval_source("(dotimes (i 2) (dotimes (j 2) (print (str i j))))")
        .unwrap();
    assert_eq!(ev.take_output(), "00\n01\n10\n11\n");
}

#[test]
fn inner_binding_shadows_outer() {
    let mut ev = evaluator();
    ev.eval_source("(dotimes (i 1) (dotimes (i 3) (print i)))")
        .unwrap();
    assert_eq!(ev.take_output(), "0\n1\n2\n");
}

#[test]
fn syntax_errors_surface_as_diagnostics() {
    let mut ev = evaluator();
    let err = ev.eval_source("(+ 1 2").unwrap_err();
    match err {
        EvalError::Read(ReadError::Syntax(diag)) => {
            assert!(diag.render().contains("unclosed list"));
        }
        other => panic!("expected syntax error, got {other:?}"),
    }
}

#[test]
fn heap_stays_bounded_across_many_evaluations() {
    let mut ev = evaluator();
    for i in 0..500 {
        ev.eval_source(&format!("(str \"round \" {i})")).unwrap();
    }
    // The pinned environment plus the last round's leftovers only.
    ev.heap_mut().collect().unwrap();
    let stats = ev.heap().stats();
    assert!(stats.pool_allocated < 100);
    assert!(stats.collections >= 500);
}

#[test]
fn tiny_pool_exhausts_with_an_error_not_a_crash() {
    let mut ev = Evaluator::new(MemoryConfig {
        pool_capacity: 90,
        heap_bytes: 2048,
        chunk_size: 32,
        max_roots: 8,
        mark_stack_capacity: 90,
    })
    .unwrap();

    // The global environment already occupies most of the pool; a large
    // expression cannot be read in.
    let err = ev
        .eval_source("(+ 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15)")
        .unwrap_err();
    match err {
        EvalError::Read(ReadError::Mem(MemError::PoolExhausted { .. })) => {}
        EvalError::Runtime(RuntimeError::Mem(MemError::PoolExhausted { .. })) => {}
        other => panic!("expected pool exhaustion, got {other:?}"),
    }

    // The partial tree from the failed read is unrooted garbage; one
    // collection reclaims it and small expressions work again.
    ev.heap_mut().collect().unwrap();
    ev.eval_source("(+ 1 2)").unwrap();
}

#[test]
fn evaluation_runs_one_collection_per_source() {
    let mut ev = evaluator();
    let before = ev.heap().stats().collections;
    ev.eval_source("(+ 1 2)").unwrap();
    ev.eval_source("(+ 3 4)").unwrap();
    assert_eq!(ev.heap().stats().collections, before + 2);
}

#[test]
fn results_remain_valid_after_collection() {
    let mut ev = evaluator();
    let result = ev.eval_source("(str \"kept \" 1)").unwrap();
    // The result was rooted across the per-source collection; pin it again
    // and force another collection to prove it still reads correctly.
    let root = ev.heap_mut().add_root(result).unwrap();
    ev.heap_mut().collect().unwrap();
    assert_eq!(repr(ev.heap(), result), "\"kept 1\"");
    ev.heap_mut().remove_root(root);
}
