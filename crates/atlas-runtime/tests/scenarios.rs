//! End-to-end scenarios covering the language's worked examples.

use atlas_runtime::config::RuntimeConfig;
use atlas_runtime::runtime::{run_source, AtlasError};
use atlas_runtime::value::Value;
use pretty_assertions::assert_eq;
use rstest::rstest;

fn run(source: &str) -> Value {
    run_source(source, &RuntimeConfig::default()).unwrap_or_else(|e| panic!("expected success, got {e:?}"))
}

#[rstest]
#[case("var x:int = 1 + 2; return x;", 3)]
#[case("function add(a:int, b:int):int { return a+b; } return add(2,40);", 42)]
#[case("if (1 == 2) { return 7; } else { return 9; }", 9)]
fn returns_expected_int(#[case] source: &str, #[case] expected: i64) {
    assert_eq!(run(source).as_int(), Some(expected));
}

#[test]
fn closures_alias_a_captured_local_across_calls() {
    let source = "
        function make():int {
            var c:int = 0;
            function inc():int { c = c + 1; return c; }
            inc();
            inc();
            return inc();
        }
        return make();
    ";
    assert_eq!(run(source).as_int(), Some(3));
}

#[test]
fn array_indexing_returns_the_element() {
    let value = run("var xs:[]int = [1,2,3]; return xs[2];");
    assert_eq!(value.as_int(), Some(3));
}

#[test]
fn statement_expression_elision_still_runs_side_effects() {
    // `1 + 1;` is a pure statement-expression and emits no ADD_INT, but the
    // `println` call inside the first statement must still execute.
    let source = "println(5); 1 + 1; return 0;";
    assert_eq!(run(source).as_int(), Some(0));
}

#[test]
fn const_without_a_value_is_a_compile_error() {
    let err = run_source("const y:int; return y;", &RuntimeConfig::default()).unwrap_err();
    assert!(matches!(err, AtlasError::Diagnostics(_)));
}

#[test]
fn type_mismatch_on_declaration_is_a_compile_error() {
    let err = run_source("var y:int = true;", &RuntimeConfig::default()).unwrap_err();
    assert!(matches!(err, AtlasError::Diagnostics(_)));
}
