//! End-to-end scenarios from spec.md §8: whole scripts run against fixed
//! input, checked against their literal expected stdout.

mod common;
use common::run;

#[test]
fn nested_loop_multiplication_table() {
    let out = run(r#"BEGIN{for(i=2;i<=3;i++)for(j=1;j<=3;j++)print i"*"j"="i*j}"#, "");
    assert_eq!(out, "2*1=2\n2*2=4\n2*3=6\n3*1=3\n3*2=6\n3*3=9\n");
}

#[test]
fn field_sum_with_end() {
    let out = run("{ sum += $2 } END { print sum }", "a 1\nb 2\nc 3\n");
    assert_eq!(out, "6\n");
}

#[test]
fn regex_pattern_with_nr_and_end_total() {
    let out = run(r#"/^foo/ { print NR": "$0 } END { print "total", NR }"#, "foo one\nbar\nfoo two\n");
    assert_eq!(out, "1: foo one\n3: foo two\ntotal 3\n");
}

#[test]
fn associative_array_count_by_key() {
    let out = run("{ a[$1]++ } END { for (k in a) print k, a[k] }", "x\ny\nx\nz\ny\nx\n");
    let mut lines: Vec<&str> = out.lines().collect();
    lines.sort_unstable();
    assert_eq!(lines, vec!["x 3", "y 2", "z 1"]);
}

#[test]
fn recursive_factorial() {
    let out = run("function f(n) { return n<=1?1:n*f(n-1) } BEGIN { print f(5) }", "");
    assert_eq!(out, "120\n");
}

#[test]
fn gsub_substitution() {
    let out = run(r#"BEGIN { s="hello world"; gsub(/o/, "0", s); print s }"#, "");
    assert_eq!(out, "hell0 w0rld\n");
}

#[test]
fn concatenation_binds_looser_than_plus() {
    // "1" concatenated with (2 + 3), not (1 concat 2) + 3.
    let out = run(r#"BEGIN { print 1 2 + 3 }"#, "");
    assert_eq!(out, "15\n");
}

#[test]
fn exit_in_begin_still_runs_end() {
    let out = run("BEGIN { print \"a\"; exit 3 } END { print \"b\" }", "");
    assert_eq!(out, "a\nb\n");
}

#[test]
fn next_skips_remaining_rules_for_record() {
    let out = run("$1==\"skip\" { next } { print $1 }", "skip\nkeep\n");
    assert_eq!(out, "keep\n");
}
