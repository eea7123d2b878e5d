//! Associative arrays (spec.md §4.1): auto-vivification, `delete`, `in`,
//! and passing an array into a user function by reference.

mod common;
use common::run;

#[test]
fn reading_a_missing_key_autovivifies_it() {
    let out = run(r#"BEGIN { x = a["missing"]; print ("missing" in a), x == "" }"#, "");
    assert_eq!(out, "1 1\n");
}

#[test]
fn delete_removes_a_single_key() {
    let out = run(r#"BEGIN { a[1]=1; a[2]=2; delete a[1]; print (1 in a), (2 in a) }"#, "");
    assert_eq!(out, "0 1\n");
}

#[test]
fn delete_with_no_subscript_clears_the_whole_array() {
    let out = run(r#"BEGIN { a[1]=1; a[2]=2; delete a; for (k in a) print k; print "done" }"#, "");
    assert_eq!(out, "done\n");
}

#[test]
fn multi_dimensional_subscript_uses_subsep() {
    let out = run(r#"BEGIN { a[1,2] = "x"; print ((1,2) in a), ((1,3) in a) }"#, "");
    assert_eq!(out, "1 0\n");
}

#[test]
fn array_passed_to_function_is_shared_by_reference() {
    let out = run(
        r#"function fill(arr) { arr["k"] = "v" } BEGIN { fill(a); print a["k"] }"#,
        "",
    );
    assert_eq!(out, "v\n");
}
