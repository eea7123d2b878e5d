//! Built-in string/regex functions (spec.md §6): `split`, `sub`/`gsub`,
//! `match`, `substr`/`index`/`length`, and dynamic-pattern compilation.

mod common;
use common::run;

#[test]
fn split_populates_array_and_returns_count() {
    let out = run(r#"BEGIN { n = split("a:b:c", parts, ":"); print n, parts[1], parts[3] }"#, "");
    assert_eq!(out, "3 a c\n");
}

#[test]
fn splita_stores_plain_strings_not_numeric_str() {
    let out = run(
        r#"BEGIN { splita("10:9", p, ":"); print (p[1] < p[2]) }"#,
        "",
    );
    // lexical string compare: "10" < "9"
    assert_eq!(out, "1\n");
}

#[test]
fn sub_replaces_only_the_first_match() {
    let out = run(r#"BEGIN { s = "aaa"; sub(/a/, "b", s); print s }"#, "");
    assert_eq!(out, "baa\n");
}

#[test]
fn match_sets_rstart_and_rlength() {
    let out = run(r#"BEGIN { match("hello world", /wor/); print RSTART, RLENGTH }"#, "");
    assert_eq!(out, "7 3\n");
}

#[test]
fn match_failure_resets_rstart_and_rlength() {
    let out = run(r#"BEGIN { match("abc", /zzz/); print RSTART, RLENGTH }"#, "");
    assert_eq!(out, "0 -1\n");
}

#[test]
fn substr_index_length() {
    let out = run(r#"BEGIN { print length("hello"), index("hello", "ll"), substr("hello", 2, 3) }"#, "");
    assert_eq!(out, "5 3 ell\n");
}

#[test]
fn dynamic_string_pattern_matches_like_a_literal() {
    let out = run(r#"BEGIN { p = "^a+b$"; print ("aaab" ~ p), ("aaabx" ~ p) }"#, "");
    assert_eq!(out, "1 0\n");
}

#[test]
fn ignorecase_affects_dynamic_pattern_matching() {
    let out = run(r#"BEGIN { IGNORECASE = 1; print ("HELLO" ~ "hello") }"#, "");
    assert_eq!(out, "1\n");
}
