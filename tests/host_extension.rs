//! Host-native function injection (spec.md §4.4, §6 "Host extension").

use mumps_interp::{evaluate_with_host, HostFunctions, MValue, Scalar};

#[test]
fn a_registered_native_is_callable_for_its_return_value() {
    let mut host = HostFunctions::new();
    host.insert(
        "double".to_string(),
        Box::new(|args: &[MValue]| Some(Scalar::Num(args[0].to_number() * 2.0))),
    );

    let r = evaluate_with_host(" w $$double(21)", &host);
    assert!(r.errors.is_empty(), "{:?}", r.errors);
    assert_eq!(r.output, "42");
}

#[test]
fn a_native_with_no_return_value_is_callable_as_a_statement() {
    let mut host = HostFunctions::new();
    host.insert("noop".to_string(), Box::new(|_args: &[MValue]| None));

    let r = evaluate_with_host(" do noop()", &host);
    assert!(r.errors.is_empty(), "{:?}", r.errors);
    assert_eq!(r.output, "");
}

#[test]
fn unknown_tag_is_a_runtime_error() {
    let host = HostFunctions::new();
    let r = evaluate_with_host(" do nosuchtag()", &host);
    assert!(r.errors.iter().any(|e| e.message.contains("unknown tag")));
}
