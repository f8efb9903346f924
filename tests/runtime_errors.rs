//! Runtime error scenarios (spec.md §7 "Runtime errors").

use mumps_interp::{evaluate, evaluate_with_limits, HostFunctions, Limits};

#[test]
fn merge_of_an_overlapping_array_into_itself_errors() {
    let r = evaluate(" s a(1,2)=\"x\" m a(1)=a(1,2)");
    assert!(r
        .errors
        .iter()
        .any(|e| e.message.contains("overlapping")));
}

#[test]
fn invalid_order_direction_errors() {
    let r = evaluate(" s a(1)=\"x\" w $O(a(1),2)");
    assert!(r.errors.iter().any(|e| e.message.contains("$O")));
}

#[test]
fn halt_stops_execution_with_partial_output() {
    let r = evaluate(" w \"before\" h w \"after\"");
    assert_eq!(r.output, "before");
    assert!(r.errors.is_empty());
}

#[test]
fn reference_argument_to_a_never_set_variable_errors() {
    let r = evaluate(" d tag(.never)\ntag(x) w x\n q");
    assert!(r
        .errors
        .iter()
        .any(|e| e.message.contains("non-existent variable")));
}

#[test]
fn step_budget_exceeded_is_reported_instead_of_looping_forever() {
    let host = HostFunctions::new();
    let r = evaluate_with_limits(
        "loop f  w 1",
        &host,
        Limits { max_steps: Some(50) },
        None,
    );
    assert!(r.errors.iter().any(|e| e.message.contains("step budget")));
}
