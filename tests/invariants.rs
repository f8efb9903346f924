//! Universally-quantified invariants from spec.md §8.

use mumps_interp::evaluate;

#[test]
fn terminates_and_returns_total_output_and_errors() {
    let r = evaluate(" w \"done\"");
    assert_eq!(r.output, "done");
    assert!(r.errors.is_empty());
}

#[test]
fn setting_a_nodes_self_value_preserves_its_existing_children() {
    let r = evaluate(" s a(1)=\"x\" s a(1,2)=\"y\" s a(1)=\"z\" w a(1,2)");
    assert!(r.errors.is_empty(), "{:?}", r.errors);
    assert_eq!(r.output, "y");
}

#[test]
fn kill_of_a_subscript_removes_it_from_order_iteration() {
    let r = evaluate(
        " s a(1)=\"x\",a(2)=\"y\",a(3)=\"z\"\n k a(2)\n f  s k=$O(a(k)) q:k=\"\"  w k,\" \"",
    );
    assert!(r.errors.is_empty(), "{:?}", r.errors);
    assert_eq!(r.output, "1 3 ");
}

#[test]
fn find_of_empty_needle_is_always_one() {
    let r = evaluate(" w $F(\"anything\",\"\",5)");
    assert!(r.errors.is_empty(), "{:?}", r.errors);
    assert_eq!(r.output, "1");
}

#[test]
fn extract_of_whole_range_round_trips_the_string() {
    let r = evaluate(" s s=\"roundtrip\" w $E(s,1,$L(s))");
    assert!(r.errors.is_empty(), "{:?}", r.errors);
    assert_eq!(r.output, "roundtrip");
}

#[test]
fn left_to_right_precedence_holds_for_mixed_operators() {
    let r = evaluate(" w 10-2*3+1");
    assert!(r.errors.is_empty(), "{:?}", r.errors);
    // strictly left to right, no precedence: ((10-2)*3)+1 = 25
    assert_eq!(r.output, "25");
}

#[test]
fn order_forward_and_backward_traversal_are_reverses_of_each_other() {
    let forward = evaluate(
        " s a(1)=\"\",a(2)=\"\",a(10)=\"\" f  s k=$O(a(k)) q:k=\"\"  w k,\" \"",
    );
    let backward = evaluate(
        " s a(1)=\"\",a(2)=\"\",a(10)=\"\" s k=\"\" f  s k=$O(a(k),-1) q:k=\"\"  w k,\" \"",
    );
    assert!(forward.errors.is_empty(), "{:?}", forward.errors);
    assert!(backward.errors.is_empty(), "{:?}", backward.errors);
    assert_eq!(forward.output, "1 2 10 ");
    assert_eq!(backward.output, "10 2 1 ");
}
