//! Integration coverage for field splitting, OFS rebuilds, and NF
//! assignment driven through whole scripts rather than `FieldTable` directly.

mod common;
use common::run;

#[test]
fn custom_single_char_fs() {
    let out = run(r#"BEGIN{FS=":"} { print $2 }"#, "root:x:0:0\n");
    assert_eq!(out, "x\n");
}

#[test]
fn assigning_a_field_rebuilds_record_with_ofs() {
    let out = run(r#"{ OFS="-"; $2="X"; print }"#, "a b c\n");
    assert_eq!(out, "a-X-c\n");
}

#[test]
fn assigning_nf_truncates_record() {
    let out = run("{ NF=2; print }", "a b c d\n");
    assert_eq!(out, "a b\n");
}

#[test]
fn field_round_trip_through_matching_fs_and_ofs() {
    let out = run(r#"BEGIN{OFS="|"} { $1=$1; print }"#, "a b c\n");
    assert_eq!(out, "a|b|c\n");
}

#[test]
fn multi_char_string_fs_is_a_literal_separator() {
    let out = run(r#"BEGIN{FS="::"} { print $2 }"#, "a::b::c\n");
    assert_eq!(out, "b\n");
}

#[test]
fn out_of_range_field_read_is_empty_string() {
    let out = run("{ print \"[\" $9 \"]\" }", "a b\n");
    assert_eq!(out, "[]\n");
}
