//! Hand-rolled POSIX ERE/BRE-flavored regex engine (spec.md §4.6).
//!
//! Three stages, each its own submodule: [`parse`] turns pattern text into
//! a [`parse::Node`] tree, [`compile`] flattens that tree into a linear
//! [`compile::Item`] program, and [`vm`] executes the program against
//! input text via backtracking. Grounded on the `Program`/instruction
//! split used by `other_examples/1ae3245a_defuz-regex__src-program.rs.rs`
//! and the NFA-over-char-classes approach of
//! `other_examples/e70f7621_Chaoses-Ib-ib-matcher__ib-matcher-src-regex-nfa-mod.rs.rs`,
//! adapted to a recursive backtracking executor instead of a compiled
//! automaton since Hawk's patterns are short-lived, compiled-per-source
//! literal rather than hot-looped over a huge corpus.

mod compile;
mod parse;
mod vm;

use std::fmt;

pub use parse::ParseError;

/// Byte-for-byte this is really a *character*-offset span: Hawk strings are
/// matched by Unicode scalar value, not raw byte, so `start`/`end` index
/// into the `Vec<char>` view of the subject string.
#[derive(Debug, Clone)]
pub struct Captures {
    spans: Vec<Option<(usize, usize)>>,
}

impl Captures {
    #[must_use]
    pub fn get(&self, i: usize) -> Option<(usize, usize)> {
        self.spans.get(i).copied().flatten()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

#[derive(Debug)]
pub struct RegexError(String);

impl fmt::Display for RegexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<ParseError> for RegexError {
    fn from(e: ParseError) -> Self {
        RegexError(e.0)
    }
}

/// A compiled regular expression, ready to search against subject text.
pub struct CompiledRegex {
    pattern: String,
    icase: bool,
    ngroups: usize,
    program: Vec<compile::Item>,
}

impl CompiledRegex {
    /// Compile `pattern`. `icase` forces case-insensitive matching even if
    /// the pattern carries no inline `(?i)`; an inline `(?i)` anywhere in
    /// the pattern also turns it on for the whole match.
    pub fn compile(pattern: &str, icase: bool) -> Result<Self, RegexError> {
        let (node, ngroups, inline_icase) = parse::parse(pattern)?;
        let program = compile::flatten(&node);
        Ok(Self {
            pattern: pattern.to_string(),
            icase: icase || inline_icase,
            ngroups,
            program,
        })
    }

    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.find(text).is_some()
    }

    /// Leftmost match span, in character offsets.
    #[must_use]
    pub fn find(&self, text: &str) -> Option<(usize, usize)> {
        let chars: Vec<char> = text.chars().collect();
        vm::search(&self.program, self.ngroups, &chars, self.icase).map(|(s, e, _)| (s, e))
    }

    /// Leftmost match with capture groups, in character offsets.
    #[must_use]
    pub fn captures(&self, text: &str) -> Option<Captures> {
        let chars: Vec<char> = text.chars().collect();
        let (start, end, st) = vm::search(&self.program, self.ngroups, &chars, self.icase)?;
        let mut spans = vec![Some((start, end))];
        for g in 1..=self.ngroups {
            match (st.starts[g], st.ends[g]) {
                (Some(s), Some(e)) => spans.push(Some((s, e))),
                _ => spans.push(None),
            }
        }
        Some(Captures { spans })
    }

    /// Match anchored at the very start of `text` (used by field-splitting
    /// FS-regex mode, which must consume a delimiter exactly where it
    /// starts looking rather than searching ahead for one).
    #[must_use]
    pub fn match_at_start(&self, text: &str) -> Option<(usize, usize)> {
        let chars: Vec<char> = text.chars().collect();
        vm::match_at(&self.program, self.ngroups, &chars, 0, self.icase).map(|(e, _)| (0, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_and_anchors() {
        let re = CompiledRegex::compile("^foo$", false).unwrap();
        assert!(re.is_match("foo"));
        assert!(!re.is_match("foobar"));
    }

    #[test]
    fn alternation_and_star() {
        let re = CompiledRegex::compile("ab*|c+", false).unwrap();
        assert_eq!(re.find("xxabbbyy"), Some((2, 6)));
        assert_eq!(re.find("ccc"), Some((0, 3)));
    }

    #[test]
    fn capture_groups() {
        let re = CompiledRegex::compile("(a+)(b+)", false).unwrap();
        let caps = re.captures("xaaabbz").unwrap();
        assert_eq!(caps.get(0), Some((1, 6)));
        assert_eq!(caps.get(1), Some((1, 4)));
        assert_eq!(caps.get(2), Some((4, 6)));
    }

    #[test]
    fn char_classes_and_shorthand() {
        let re = CompiledRegex::compile(r"\d+-\w+", false).unwrap();
        assert!(re.is_match("42-abc"));
        assert!(!re.is_match("abc-42"));
    }

    #[test]
    fn case_insensitive() {
        let re = CompiledRegex::compile("HELLO", true).unwrap();
        assert!(re.is_match("say hello there"));
    }

    #[test]
    fn interval_quantifier() {
        let re = CompiledRegex::compile("a{2,3}", false).unwrap();
        assert_eq!(re.find("aaaa"), Some((0, 3)));
        assert!(!CompiledRegex::compile("a{2,3}", false).unwrap().is_match("a"));
    }

    #[test]
    fn non_capturing_group() {
        let re = CompiledRegex::compile("(?:ab)+c", false).unwrap();
        assert!(re.is_match("ababc"));
    }
}
