//! User-defined functions (spec.md §4.3/§4.5): scalar-by-value parameters,
//! missing trailing arguments binding to an uninitialized value, and the
//! configurable recursion limit.

mod common;
use common::{run, MemHost};

#[test]
fn missing_trailing_argument_binds_to_uninitialized() {
    let out = run(r#"function f(a, b) { return a == "" && b == "" } BEGIN { print f(1) }"#, "");
    assert_eq!(out, "0\n");
}

#[test]
fn scalar_arguments_are_passed_by_value() {
    let out = run(
        r#"function bump(n) { n = n + 1; return n } BEGIN { x = 1; print bump(x), x }"#,
        "",
    );
    assert_eq!(out, "2 1\n");
}

#[test]
fn recursion_past_the_configured_limit_errors() {
    let program = hawk::compile("function f(n) { return f(n+1) } BEGIN { f(0) }").unwrap();
    let mut host = MemHost::new("");
    let mut settings = hawk::Settings::new();
    settings.set_max_call_depth(16);
    let mut interp = hawk::Interpreter::with_settings(&program, &mut host, settings);
    let err = interp.run().expect_err("unbounded recursion should error");
    assert_eq!(err.kind, hawk::ErrorKind::Recursion);
}
