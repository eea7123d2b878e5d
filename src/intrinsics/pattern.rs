//! Regex-consuming built-ins that need more than plain value-in/value-out:
//! `sub`/`gsub` rewrite a string and report a count, `match` reports a
//! 1-based start and a length (spec.md §6).

use crate::regex::CompiledRegex;

/// Expand `&`/`\&`/`\\` in a `sub`/`gsub` replacement template against the
/// text that was actually matched.
fn expand_repl(repl: &str, matched: &str) -> String {
    let mut out = String::new();
    let mut chars = repl.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '&' => out.push_str(matched),
            '\\' => match chars.peek() {
                Some('&') => {
                    out.push('&');
                    chars.next();
                }
                Some('\\') => {
                    out.push('\\');
                    chars.next();
                }
                _ => out.push('\\'),
            },
            other => out.push(other),
        }
    }
    out
}

/// `sub(ere, repl, target)`: replace the first match only. Returns the
/// rewritten string and how many substitutions were made (0 or 1).
#[must_use]
pub fn sub_once(re: &CompiledRegex, repl: &str, subject: &str) -> (String, i64) {
    match re.find(subject) {
        None => (subject.to_string(), 0),
        Some((s, e)) => {
            let chars: Vec<char> = subject.chars().collect();
            let matched: String = chars[s..e].iter().collect();
            let before: String = chars[..s].iter().collect();
            let after: String = chars[e..].iter().collect();
            (format!("{}{}{}", before, expand_repl(repl, &matched), after), 1)
        }
    }
}

/// `gsub(ere, repl, target)`: replace every non-overlapping match. An
/// empty match advances one character so the loop can't spin forever.
#[must_use]
pub fn gsub_all(re: &CompiledRegex, repl: &str, subject: &str) -> (String, i64) {
    let chars: Vec<char> = subject.chars().collect();
    let mut out = String::new();
    let mut pos = 0usize;
    let mut count = 0i64;
    while pos <= chars.len() {
        let rest: String = chars[pos..].iter().collect();
        match re.find(&rest) {
            None => break,
            Some((s, e)) => {
                let abs_s = pos + s;
                let abs_e = pos + e;
                out.extend(&chars[pos..abs_s]);
                let matched: String = chars[abs_s..abs_e].iter().collect();
                out.push_str(&expand_repl(repl, &matched));
                count += 1;
                if abs_e == abs_s {
                    if abs_e < chars.len() {
                        out.push(chars[abs_e]);
                    }
                    pos = abs_e + 1;
                } else {
                    pos = abs_e;
                }
            }
        }
    }
    if pos < chars.len() {
        out.extend(&chars[pos..]);
    }
    (out, count)
}

/// `match(s, ere)`: 1-based start and length of the leftmost match, or
/// `None` (caller sets RSTART=0, RLENGTH=-1) if there isn't one.
#[must_use]
pub fn do_match(re: &CompiledRegex, text: &str) -> Option<(i64, i64)> {
    re.find(text).map(|(s, e)| (s as i64 + 1, (e - s) as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_replaces_first_only() {
        let re = CompiledRegex::compile("o", false).unwrap();
        let (s, n) = sub_once(&re, "0", "foo");
        assert_eq!(s, "f0o");
        assert_eq!(n, 1);
    }

    #[test]
    fn gsub_replaces_all() {
        let re = CompiledRegex::compile("o", false).unwrap();
        let (s, n) = gsub_all(&re, "0", "foo boo");
        assert_eq!(s, "f00 b00");
        assert_eq!(n, 3);
    }

    #[test]
    fn gsub_ampersand_backreference() {
        let re = CompiledRegex::compile("[a-z]+", false).unwrap();
        let (s, _) = gsub_all(&re, "<&>", "ab cd");
        assert_eq!(s, "<ab> <cd>");
    }

    #[test]
    fn match_reports_one_based_start() {
        let re = CompiledRegex::compile("b+", false).unwrap();
        assert_eq!(do_match(&re, "abbbc"), Some((2, 3)));
        assert_eq!(do_match(&re, "xyz"), None);
    }
}
