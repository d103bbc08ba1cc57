//! Targeted upvalue-aliasing tests covering closure cell sharing beyond
//! the single worked example in `scenarios.rs`.

use atlas_runtime::config::RuntimeConfig;
use atlas_runtime::runtime::run_source;
use pretty_assertions::assert_eq;

fn run_int(source: &str) -> i64 {
    run_source(source, &RuntimeConfig::default())
        .unwrap_or_else(|e| panic!("expected success, got {e:?}"))
        .as_int()
        .expect("expected an int result")
}

#[test]
fn transitive_capture_through_two_levels_of_nesting() {
    let source = "
        function outer():int {
            var total:int = 10;
            function middle():int {
                function inner():int {
                    total = total + 1;
                    return total;
                }
                inner();
                return inner();
            }
            return middle();
        }
        return outer();
    ";
    assert_eq!(run_int(source), 12);
}

#[test]
fn two_closures_capturing_the_same_local_share_one_cell() {
    let source = "
        function counter():int {
            var n:int = 0;
            function bump():int { n = n + 1; return n; }
            function read():int { return n; }
            bump();
            bump();
            return read();
        }
        return counter();
    ";
    assert_eq!(run_int(source), 2);
}
