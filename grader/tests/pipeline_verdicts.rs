//! Verdict tests for the build-and-verify pipeline.
//!
//! Compilers and candidate programs are replaced by `ScriptedRunner`, so the
//! tests cover staging, comparison and trace handling without a toolchain.

use std::fs;

use grader::pipeline::{Outcome, Verdict, verify_exercise};
use grader::test_support::{ScriptedRunner, TaskTree, exited};

#[test]
fn matching_output_passes_without_trace() {
    let tree = TaskTree::new().expect("tree");
    let exercise = tree
        .exercise("level1", "1", Some("Hello\nWorld\n"))
        .expect("exercise");
    tree.stage_solution("hello.c", "int main(){}").expect("stage");
    let runner = ScriptedRunner::compiles_and_prints("Hello\nWorld\n");

    let verdict =
        verify_exercise(tree.paths(), tree.config(), &exercise, &runner).expect("verify");

    assert_eq!(verdict.outcome(), Outcome::Pass);
    assert!(tree.trace_files().expect("traces").is_empty());
}

#[test]
fn blank_lines_and_padding_are_tolerated() {
    let tree = TaskTree::new().expect("tree");
    let exercise = tree
        .exercise("level1", "1", Some("Hello\nWorld"))
        .expect("exercise");
    tree.stage_solution("hello.cpp", "int main(){}").expect("stage");
    let runner = ScriptedRunner::compiles_and_prints("  Hello  \n\n\nWorld\n\n");

    let verdict =
        verify_exercise(tree.paths(), tree.config(), &exercise, &runner).expect("verify");

    assert!(matches!(verdict, Verdict::Match { .. }), "{verdict:?}");
}

#[test]
fn reordered_lines_mismatch_and_leave_a_trace() {
    let tree = TaskTree::new().expect("tree");
    let exercise = tree
        .exercise("level2", "7", Some("World\nHello\n"))
        .expect("exercise");
    tree.stage_solution("hello.c", "int main(){}").expect("stage");
    let runner = ScriptedRunner::compiles_and_prints("Hello\nWorld");

    let verdict =
        verify_exercise(tree.paths(), tree.config(), &exercise, &runner).expect("verify");

    let (expected, actual, trace) = match verdict {
        Verdict::Mismatch {
            expected,
            actual,
            trace,
            ..
        } => (expected, actual, trace),
        other => panic!("expected mismatch, got {other:?}"),
    };
    assert_eq!(expected, vec!["World", "Hello"]);
    assert_eq!(actual, vec!["Hello", "World"]);

    let traces = tree.trace_files().expect("traces");
    assert_eq!(traces, vec![trace.clone()]);
    let name = trace.file_name().and_then(|n| n.to_str()).expect("name");
    assert!(name.starts_with("level2_7_trace_"), "{name}");
    let text = fs::read_to_string(&trace).expect("read trace");
    assert!(text.contains("--- Expected ---\nWorld\nHello\n"));
    assert!(text.contains("--- Got ---\nHello\nWorld\n"));
}

#[test]
fn compile_failure_writes_one_trace_with_stderr() {
    let tree = TaskTree::new().expect("tree");
    let exercise = tree.exercise("level1", "2", Some("x")).expect("exercise");
    tree.stage_solution("broken.c", "int main( {").expect("stage");
    let runner = ScriptedRunner::compile_fails("broken.c:1:10: error: expected ')'");

    let verdict =
        verify_exercise(tree.paths(), tree.config(), &exercise, &runner).expect("verify");

    assert_eq!(verdict.outcome(), Outcome::Fail);
    assert!(matches!(verdict, Verdict::CompileFailure { .. }));
    assert_eq!(runner.calls().len(), 1, "program must not run");

    let traces = tree.trace_files().expect("traces");
    assert_eq!(traces.len(), 1);
    let name = traces[0].file_name().and_then(|n| n.to_str()).expect("name");
    assert!(name.starts_with("level1_2_compile_"), "{name}");
    let text = fs::read_to_string(&traces[0]).expect("read trace");
    assert!(text.contains("broken.c:1:10: error: expected ')'"));
}

#[test]
fn no_solution_is_reported_without_compiling() {
    let tree = TaskTree::new().expect("tree");
    let exercise = tree.exercise("level1", "1", Some("x")).expect("exercise");
    tree.stage_solution("README.md", "not a solution").expect("stage");
    let runner = ScriptedRunner::new(Vec::new());

    let verdict =
        verify_exercise(tree.paths(), tree.config(), &exercise, &runner).expect("verify");

    assert_eq!(verdict, Verdict::NoSolution);
    assert!(runner.calls().is_empty());
    assert!(tree.build_files().expect("build").is_empty());
}

#[test]
fn two_solutions_are_reported_without_compiling() {
    let tree = TaskTree::new().expect("tree");
    let exercise = tree.exercise("level1", "1", Some("x")).expect("exercise");
    tree.stage_solution("a.c", "int main(){}").expect("stage");
    tree.stage_solution("b.cpp", "int main(){}").expect("stage");
    let runner = ScriptedRunner::new(Vec::new());

    let verdict =
        verify_exercise(tree.paths(), tree.config(), &exercise, &runner).expect("verify");

    assert_eq!(
        verdict,
        Verdict::MultipleSolutions {
            files: vec!["a.c".to_string(), "b.cpp".to_string()]
        }
    );
    assert!(runner.calls().is_empty());
    assert!(tree.build_files().expect("build").is_empty());
}

#[test]
fn exit_code_does_not_affect_verdict() {
    let tree = TaskTree::new().expect("tree");
    let exercise = tree.exercise("level1", "1", Some("42")).expect("exercise");
    tree.stage_solution("main.c", "int main(){}").expect("stage");
    let runner = ScriptedRunner::new(vec![exited(0, "", ""), exited(3, "42\n", "oops")]);

    let verdict =
        verify_exercise(tree.paths(), tree.config(), &exercise, &runner).expect("verify");

    assert_eq!(verdict.outcome(), Outcome::Pass);
}

#[test]
fn repeated_runs_give_the_same_verdict() {
    let tree = TaskTree::new().expect("tree");
    let exercise = tree.exercise("level1", "1", Some("a\nb")).expect("exercise");
    tree.stage_solution("main.c", "int main(){}").expect("stage");
    let runner = ScriptedRunner::compiles_and_prints("b\na");
    runner.push(exited(0, "", ""));
    runner.push(exited(0, "b\na", ""));

    let first =
        verify_exercise(tree.paths(), tree.config(), &exercise, &runner).expect("first");
    let second =
        verify_exercise(tree.paths(), tree.config(), &exercise, &runner).expect("second");

    assert_eq!(first.outcome(), Outcome::Fail);
    assert_eq!(second.outcome(), Outcome::Fail);
    assert_ne!(first.trace(), second.trace());
    assert_eq!(tree.trace_files().expect("traces").len(), 2);
}
