//! `getline` in its three parser-reachable forms (spec.md §4.5): plain,
//! `< file`, and `"cmd" | getline`.

mod common;
use common::MemHost;

#[test]
fn plain_getline_advances_the_main_loop() {
    // The first record's rule action consumes the second record early via
    // a bare getline, so the second record's own rule never fires.
    let program = hawk::compile("{ getline; print }").unwrap();
    let mut host = MemHost::new("one\ntwo\nthree\n");
    let mut interp = hawk::Interpreter::new(&program, &mut host);
    interp.run().unwrap();
    assert_eq!(host.console_out, "two\nthree\n");
}

#[test]
fn getline_from_file_reads_into_a_named_stream() {
    let program = hawk::compile(r#"BEGIN { while ((getline line < "side.txt") > 0) print "got:" line }"#).unwrap();
    let mut host = MemHost::new("");
    host.seed("side.txt", "alpha\nbeta\n");
    let mut interp = hawk::Interpreter::new(&program, &mut host);
    interp.run().unwrap();
    assert_eq!(host.console_out, "got:alpha\ngot:beta\n");
}

#[test]
fn getline_from_file_returns_zero_at_eof() {
    let program = hawk::compile(r#"BEGIN { getline line < "empty.txt"; print (getline line2 < "empty.txt") }"#).unwrap();
    let mut host = MemHost::new("");
    host.seed("empty.txt", "only\n");
    let mut interp = hawk::Interpreter::new(&program, &mut host);
    interp.run().unwrap();
    assert_eq!(host.console_out, "0\n");
}

#[test]
fn getline_from_missing_file_returns_minus_one() {
    let program = hawk::compile(r#"BEGIN { print (getline line < "missing.txt") }"#).unwrap();
    let mut host = MemHost::new("");
    let mut interp = hawk::Interpreter::new(&program, &mut host);
    interp.run().unwrap();
    assert_eq!(host.console_out, "-1\n");
}

#[test]
fn pipe_getline_updates_nr_but_not_fnr() {
    let program = hawk::compile(r#"BEGIN { "gen" | getline x; print x, NR, FNR }"#).unwrap();
    let mut host = MemHost::new("");
    host.seed("gen", "piped\n");
    let mut interp = hawk::Interpreter::new(&program, &mut host);
    interp.run().unwrap();
    assert_eq!(host.console_out, "piped 1 0\n");
}
