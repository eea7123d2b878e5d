//! Output redirection, `close`, and `fflush` (spec.md §6) against the
//! in-memory stream fixture.

mod common;
use common::MemHost;

#[test]
fn print_redirected_to_a_file_is_captured_by_the_host() {
    let program = hawk::compile(r#"BEGIN { print "one" > "out.txt"; print "two" > "out.txt"; close("out.txt") }"#).unwrap();
    let mut host = MemHost::new("");
    let mut interp = hawk::Interpreter::new(&program, &mut host);
    interp.run().unwrap();
    assert_eq!(host.written("out.txt"), Some("one\ntwo\n"));
}

#[test]
fn close_on_an_unopened_stream_returns_minus_one() {
    let program = hawk::compile(r#"BEGIN { print close("never opened") }"#).unwrap();
    let mut host = MemHost::new("");
    let mut interp = hawk::Interpreter::new(&program, &mut host);
    interp.run().unwrap();
    assert_eq!(host.console_out, "-1\n");
}

#[test]
fn fflush_with_no_argument_succeeds_with_no_open_streams() {
    let program = hawk::compile(r#"BEGIN { print fflush() }"#).unwrap();
    let mut host = MemHost::new("");
    let mut interp = hawk::Interpreter::new(&program, &mut host);
    interp.run().unwrap();
    assert_eq!(host.console_out, "0\n");
}

#[test]
fn fflush_on_a_named_stream_returns_zero() {
    let program = hawk::compile(r#"BEGIN { print "x" > "f"; print fflush("f") }"#).unwrap();
    let mut host = MemHost::new("");
    let mut interp = hawk::Interpreter::new(&program, &mut host);
    interp.run().unwrap();
    assert_eq!(host.console_out, "0\n");
}
