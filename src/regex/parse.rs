//! Regex grammar parser (spec.md §4.6): POSIX ERE plus the handful of
//! common extensions the spec calls out — `(?:...)` non-capturing groups,
//! `(?i)`/`(?-i)` inline case toggles, `\d\D\s\S\w\W` class shorthands, and
//! `{n,m}` interval quantifiers with an optional lazy `?` suffix.
//!
//! Grounded on the recursive-descent shape of
//! `other_examples/1ae3245a_defuz-regex__src-program.rs.rs`'s parser, with
//! POSIX bracket-expression handling folded in from the same family as
//! `other_examples/cc6a5d1f_zmbush-regex__src-program.rs.rs`.

use std::fmt;

#[derive(Debug, Clone)]
pub enum Node {
    Empty,
    Char(char),
    Any,
    Class(CharClass),
    Start,
    End,
    WordBoundary(bool),
    Concat(Vec<Node>),
    Alt(Vec<Node>),
    Repeat {
        node: Box<Node>,
        min: u32,
        max: Option<u32>,
        greedy: bool,
    },
    Group {
        node: Box<Node>,
        capture: Option<usize>,
    },
}

#[derive(Debug, Clone)]
pub struct CharClass {
    pub negated: bool,
    pub ranges: Vec<(char, char)>,
}

impl CharClass {
    fn matches(&self, c: char) -> bool {
        let hit = self.ranges.iter().any(|&(lo, hi)| c >= lo && c <= hi);
        hit != self.negated
    }

    pub fn test(&self, c: char, icase: bool) -> bool {
        if !icase {
            return self.matches(c);
        }
        self.matches(c) || self.matches(flip_case(c))
    }
}

fn flip_case(c: char) -> char {
    if c.is_uppercase() {
        c.to_ascii_lowercase()
    } else {
        c.to_ascii_uppercase()
    }
}

pub fn digit_class(negate: bool) -> CharClass {
    CharClass {
        negated: negate,
        ranges: vec![('0', '9')],
    }
}

pub fn space_class(negate: bool) -> CharClass {
    CharClass {
        negated: negate,
        ranges: vec![(' ', ' '), ('\t', '\t'), ('\n', '\n'), ('\r', '\r'), ('\u{b}', '\u{c}')],
    }
}

pub fn word_class(negate: bool) -> CharClass {
    CharClass {
        negated: negate,
        ranges: vec![('a', 'z'), ('A', 'Z'), ('0', '9'), ('_', '_')],
    }
}

#[derive(Debug)]
pub struct ParseError(pub String);

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "regex syntax error: {}", self.0)
    }
}

/// Parses `pattern`. Returns the AST, the number of capture groups (not
/// counting the implicit whole-match group 0), and whether an inline
/// `(?i)` was seen anywhere (applied to the whole pattern; Hawk does not
/// support scoped case-folding).
pub fn parse(pattern: &str) -> Result<(Node, usize, bool), ParseError> {
    let mut p = Parser {
        chars: pattern.chars().collect(),
        pos: 0,
        ngroups: 0,
        icase: false,
    };
    let node = p.parse_alt()?;
    if p.pos != p.chars.len() {
        return Err(ParseError(format!("unexpected ')' at {}", p.pos)));
    }
    Ok((node, p.ngroups, p.icase))
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    ngroups: usize,
    icase: bool,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }
    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }
    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_alt(&mut self) -> Result<Node, ParseError> {
        let mut branches = vec![self.parse_concat()?];
        while self.eat('|') {
            branches.push(self.parse_concat()?);
        }
        if branches.len() == 1 {
            Ok(branches.pop().unwrap())
        } else {
            Ok(Node::Alt(branches))
        }
    }

    fn parse_concat(&mut self) -> Result<Node, ParseError> {
        let mut items = Vec::new();
        while let Some(c) = self.peek() {
            if c == '|' || c == ')' {
                break;
            }
            items.push(self.parse_repeat()?);
        }
        if items.is_empty() {
            Ok(Node::Empty)
        } else if items.len() == 1 {
            Ok(items.pop().unwrap())
        } else {
            Ok(Node::Concat(items))
        }
    }

    fn parse_repeat(&mut self) -> Result<Node, ParseError> {
        let atom = self.parse_atom()?;
        let (min, max) = match self.peek() {
            Some('*') => {
                self.bump();
                (0, None)
            }
            Some('+') => {
                self.bump();
                (1, None)
            }
            Some('?') => {
                self.bump();
                (0, Some(1))
            }
            Some('{') if self.looks_like_interval() => self.parse_interval()?,
            _ => return Ok(atom),
        };
        let greedy = !self.eat('?');
        Ok(Node::Repeat {
            node: Box::new(atom),
            min,
            max,
            greedy,
        })
    }

    fn looks_like_interval(&self) -> bool {
        let mut i = self.pos + 1;
        let mut saw_digit = false;
        while let Some(&c) = self.chars.get(i) {
            if c.is_ascii_digit() {
                saw_digit = true;
                i += 1;
            } else {
                break;
            }
        }
        if self.chars.get(i) == Some(&',') {
            i += 1;
            while matches!(self.chars.get(i), Some(c) if c.is_ascii_digit()) {
                i += 1;
            }
        }
        saw_digit && self.chars.get(i) == Some(&'}')
    }

    fn parse_interval(&mut self) -> Result<(u32, Option<u32>), ParseError> {
        self.bump(); // {
        let min = self.parse_int()?;
        let max = if self.eat(',') {
            if self.peek() == Some('}') {
                None
            } else {
                Some(self.parse_int()?)
            }
        } else {
            Some(min)
        };
        if !self.eat('}') {
            return Err(ParseError("expected '}'".into()));
        }
        Ok((min, max))
    }

    fn parse_int(&mut self) -> Result<u32, ParseError> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.bump();
        }
        self.chars[start..self.pos]
            .iter()
            .collect::<String>()
            .parse()
            .map_err(|_| ParseError("expected a number in interval".into()))
    }

    fn parse_atom(&mut self) -> Result<Node, ParseError> {
        match self.bump() {
            None => Err(ParseError("unexpected end of pattern".into())),
            Some('.') => Ok(Node::Any),
            Some('^') => Ok(Node::Start),
            Some('$') => Ok(Node::End),
            Some('(') => self.parse_group(),
            Some('[') => Ok(Node::Class(self.parse_bracket()?)),
            Some('\\') => self.parse_escape(),
            Some(c) => Ok(Node::Char(c)),
        }
    }

    fn parse_group(&mut self) -> Result<Node, ParseError> {
        if self.peek() == Some('?') {
            self.bump();
            match self.peek() {
                Some(':') => {
                    self.bump();
                    let inner = self.parse_alt()?;
                    if !self.eat(')') {
                        return Err(ParseError("expected ')'".into()));
                    }
                    return Ok(Node::Group {
                        node: Box::new(inner),
                        capture: None,
                    });
                }
                Some('i') => {
                    self.bump();
                    self.icase = true;
                    if !self.eat(')') {
                        return Err(ParseError("expected ')'".into()));
                    }
                    return Ok(Node::Empty);
                }
                Some('-') => {
                    self.bump();
                    self.eat('i');
                    if !self.eat(')') {
                        return Err(ParseError("expected ')'".into()));
                    }
                    return Ok(Node::Empty);
                }
                _ => return Err(ParseError("unsupported (? group".into())),
            }
        }
        self.ngroups += 1;
        let idx = self.ngroups;
        let inner = self.parse_alt()?;
        if !self.eat(')') {
            return Err(ParseError("expected ')'".into()));
        }
        Ok(Node::Group {
            node: Box::new(inner),
            capture: Some(idx),
        })
    }

    fn parse_escape(&mut self) -> Result<Node, ParseError> {
        match self.bump() {
            Some('d') => Ok(Node::Class(digit_class(false))),
            Some('D') => Ok(Node::Class(digit_class(true))),
            Some('s') => Ok(Node::Class(space_class(false))),
            Some('S') => Ok(Node::Class(space_class(true))),
            Some('w') => Ok(Node::Class(word_class(false))),
            Some('W') => Ok(Node::Class(word_class(true))),
            Some('b') => Ok(Node::WordBoundary(true)),
            Some('B') => Ok(Node::WordBoundary(false)),
            Some('n') => Ok(Node::Char('\n')),
            Some('t') => Ok(Node::Char('\t')),
            Some('r') => Ok(Node::Char('\r')),
            Some(c) => Ok(Node::Char(c)),
            None => Err(ParseError("trailing backslash".into())),
        }
    }

    fn parse_bracket(&mut self) -> Result<CharClass, ParseError> {
        let negated = self.eat('^');
        let mut ranges = Vec::new();
        let mut first = true;
        loop {
            match self.peek() {
                None => return Err(ParseError("unterminated bracket expression".into())),
                Some(']') if !first => {
                    self.bump();
                    break;
                }
                _ => {}
            }
            first = false;
            if self.peek() == Some('[') && self.chars.get(self.pos + 1) == Some(&':') {
                ranges.extend(self.parse_posix_class()?);
                continue;
            }
            let lo = self.bracket_char()?;
            if self.peek() == Some('-')
                && self.chars.get(self.pos + 1).map_or(false, |&c| c != ']')
            {
                self.bump();
                let hi = self.bracket_char()?;
                ranges.push((lo, hi));
            } else {
                ranges.push((lo, lo));
            }
        }
        Ok(CharClass { negated, ranges })
    }

    fn bracket_char(&mut self) -> Result<char, ParseError> {
        match self.bump() {
            Some('\\') => match self.bump() {
                Some('n') => Ok('\n'),
                Some('t') => Ok('\t'),
                Some('r') => Ok('\r'),
                Some(c) => Ok(c),
                None => Err(ParseError("trailing backslash in bracket".into())),
            },
            Some(c) => Ok(c),
            None => Err(ParseError("unterminated bracket expression".into())),
        }
    }

    fn parse_posix_class(&mut self) -> Result<Vec<(char, char)>, ParseError> {
        self.bump(); // [
        self.bump(); // :
        let start = self.pos;
        while self.peek().map_or(false, |c| c != ':') {
            self.bump();
        }
        let name: String = self.chars[start..self.pos].iter().collect();
        if !self.eat(':') || !self.eat(']') {
            return Err(ParseError("unterminated POSIX class".into()));
        }
        Ok(match name.as_str() {
            "digit" => vec![('0', '9')],
            "alpha" => vec![('a', 'z'), ('A', 'Z')],
            "alnum" => vec![('a', 'z'), ('A', 'Z'), ('0', '9')],
            "upper" => vec![('A', 'Z')],
            "lower" => vec![('a', 'z')],
            "space" => vec![(' ', ' '), ('\t', '\t'), ('\n', '\n'), ('\r', '\r')],
            "punct" => vec![('!', '/'), (':', '@'), ('[', '`'), ('{', '~')],
            "blank" => vec![(' ', ' '), ('\t', '\t')],
            "cntrl" => vec![('\u{0}', '\u{1f}'), ('\u{7f}', '\u{7f}')],
            "print" => vec![(' ', '~')],
            "graph" => vec![('!', '~')],
            _ => return Err(ParseError(format!("unknown POSIX class [:{}:]", name))),
        })
    }
}
