//! Black-box scenarios straight from spec.md §8 "Testable properties".

use mumps_interp::evaluate;

#[test]
fn left_to_right_precedence() {
    let r = evaluate(" w 3+4*3");
    assert!(r.errors.is_empty(), "{:?}", r.errors);
    assert_eq!(r.output, "21");
}

#[test]
fn division_forms() {
    assert_eq!(evaluate(" w 5/2").output, "2.5");
    assert_eq!(evaluate(" w 5\\2").output, "2");
    assert_eq!(evaluate(" w 5#2").output, "1");
    assert_eq!(evaluate(" w -5#2").output, "-1");
}

#[test]
fn integer_divide_floors_rather_than_truncates() {
    // -5 \ 2 = floor(-2.5) = -3, not trunc(-2.5) = -2 (spec.md §4.2.4: "\"
    // is "integer divide, floor").
    assert_eq!(evaluate(" w -5\\2").output, "-3");
}

#[test]
fn for_loop_sweep() {
    let r = evaluate("f i=1:1:5 w !,\"i: \",i");
    assert!(r.errors.is_empty(), "{:?}", r.errors);
    assert_eq!(r.output, "\ni: 1\ni: 2\ni: 3\ni: 4\ni: 5");
}

#[test]
fn array_iteration_collation_order() {
    let r = evaluate(
        " s arr(1)=\"a\",arr(2)=\"c\",arr(10)=\"b\" f  s k=$O(arr(k)) q:k=\"\"  w arr(k)",
    );
    assert!(r.errors.is_empty(), "{:?}", r.errors);
    assert_eq!(r.output, "acb");
}

#[test]
fn merge_of_non_overlapping_arrays() {
    let r = evaluate(
        " s dst(\"a\")=\"1\",dst(\"b\")=\"2\",dst(\"c\")=\"3\"\n s src(\"c\")=\"4\",src(\"d\")=\"5\"\n m dst=src\n f  s k=$O(dst(k)) q:k=\"\"  w k,\"=\",dst(k),\" \"",
    );
    assert!(r.errors.is_empty(), "{:?}", r.errors);
    assert_eq!(r.output, "a=1 b=2 c=4 d=5 ");
}

#[test]
fn extract_assignment_splices_a_substring() {
    let r = evaluate(" s string=\"Hello, world!\" s $E(string,3,5)=\"110\" w string");
    assert!(r.errors.is_empty(), "{:?}", r.errors);
    assert_eq!(r.output, "He110, world!");
}

#[test]
fn select_returns_first_true_branch() {
    let r = evaluate(" w $S(0:\"a\",1&1:\"b\",1!1:\"c\")");
    assert!(r.errors.is_empty(), "{:?}", r.errors);
    assert_eq!(r.output, "b");
}

#[test]
fn select_with_all_false_conditions_errors() {
    let r = evaluate(" w $S(0:\"a\",0:\"b\")");
    assert!(r
        .errors
        .iter()
        .any(|e| e.message.contains("All select conditions were false")));
}

#[test]
fn command_prefix_parsing() {
    let r = evaluate(" wRIte !,\"Hello, world\"");
    assert!(r.errors.is_empty(), "{:?}", r.errors);
    assert_eq!(r.output, "\nHello, world");
}

#[test]
fn missing_leading_whitespace_is_a_parse_error() {
    let r = evaluate("w 1");
    assert_eq!(r.errors.len(), 1);
    assert_eq!(r.errors[0].line, 0);
    assert_eq!(r.errors[0].column, 2);
}

#[test]
fn inner_whitespace_in_command_args_is_an_error() {
    let r = evaluate(" w 3 + 4 - 3");
    assert!(!r.errors.is_empty());
}
