//! Lexical scanner: turns AWK source text into a stream of positioned
//! tokens (spec.md §4.2).
//!
//! The central piece of state is [`Lexer::expects_operand`]: AWK's grammar
//! is ambiguous about whether `/` opens a regex literal or is the division
//! operator, and the only way to resolve it is to remember what kind of
//! token could legally follow the previous one.

use crate::error::{Error, ErrorKind, Position};

#[derive(Debug, Clone, PartialEq)]
pub enum Tok {
    // literals
    Int(i64),
    Flt(f64),
    Str(String),
    Regex(String),

    Ident(String),
    FuncName(String),

    // keywords
    Begin,
    End,
    Function,
    If,
    Else,
    While,
    Do,
    For,
    Break,
    Continue,
    Next,
    NextFile,
    Exit,
    Return,
    Delete,
    In,
    Getline,
    Print,
    Printf,

    // punctuation
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Semi,
    Newline,
    Comma,

    // operators
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    PowAssign,
    OrOr,
    AndAnd,
    Not,
    Match,
    NotMatch,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    StarStar,
    Incr,
    Decr,
    Dollar,
    Question,
    Colon,
    Pipe,
    PipeAmp,
    Append,

    At,
    Include,
    Global,

    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub tok: Tok,
    pub pos: Position,
}

/// The disambiguation context: whether the *previous* token was one after
/// which an operand (and hence a `/regex/` literal, a unary `+`/`-`, etc.)
/// is grammatically expected, per spec.md §4.2's enumerated list (start of
/// expression, after `(`, `,`, `=`, comparison/logical operators, `return`,
/// a `print`/`printf` argument head, `[`, `{`, `;`, or a terminating
/// newline).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ctx {
    Operand,
    Operator,
}

pub struct Lexer<'a> {
    src: &'a [u8],
    pos: usize,
    line: u32,
    col: u32,
    ctx: Ctx,
}

fn is_ident_start(c: u8) -> bool {
    c == b'_' || c.is_ascii_alphabetic()
}
fn is_ident_cont(c: u8) -> bool {
    c == b'_' || c.is_ascii_alphanumeric()
}

impl<'a> Lexer<'a> {
    #[must_use]
    pub fn new(src: &'a str) -> Self {
        Self {
            src: src.as_bytes(),
            pos: 0,
            line: 1,
            col: 1,
            ctx: Ctx::Operand,
        }
    }

    fn here(&self) -> Position {
        Position::new(self.line, self.col)
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }
    fn peek2(&self) -> Option<u8> {
        self.src.get(self.pos + 1).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let c = self.peek()?;
        self.pos += 1;
        if c == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    /// Skip whitespace, comments, and backslash-newline continuations.
    /// Bare newlines are *not* skipped here — they are tokenized so the
    /// parser can apply the statement-terminator rule.
    fn skip_trivia(&mut self) -> Result<(), Error> {
        loop {
            match self.peek() {
                Some(b' ') | Some(b'\t') | Some(b'\r') => {
                    self.bump();
                }
                Some(b'\\') if self.peek2() == Some(b'\n') => {
                    self.bump();
                    self.bump();
                }
                Some(b'#') => {
                    while let Some(c) = self.peek() {
                        if c == b'\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn lex_number(&mut self) -> Result<Tok, Error> {
        let start = self.pos;
        if self.peek() == Some(b'0') && matches!(self.peek2(), Some(b'x') | Some(b'X')) {
            self.bump();
            self.bump();
            let hstart = self.pos;
            while self.peek().map_or(false, |c| c.is_ascii_hexdigit()) {
                self.bump();
            }
            let text = std::str::from_utf8(&self.src[hstart..self.pos]).unwrap();
            let v = i64::from_str_radix(text, 16).unwrap_or(0);
            return Ok(Tok::Int(v));
        }
        let mut is_float = false;
        while self.peek().map_or(false, |c| c.is_ascii_digit()) {
            self.bump();
        }
        if self.peek() == Some(b'.') {
            is_float = true;
            self.bump();
            while self.peek().map_or(false, |c| c.is_ascii_digit()) {
                self.bump();
            }
        }
        if matches!(self.peek(), Some(b'e') | Some(b'E')) {
            let save = self.pos;
            let save_line = self.line;
            let save_col = self.col;
            self.bump();
            if matches!(self.peek(), Some(b'+') | Some(b'-')) {
                self.bump();
            }
            if self.peek().map_or(false, |c| c.is_ascii_digit()) {
                is_float = true;
                while self.peek().map_or(false, |c| c.is_ascii_digit()) {
                    self.bump();
                }
            } else {
                self.pos = save;
                self.line = save_line;
                self.col = save_col;
            }
        }
        let text = std::str::from_utf8(&self.src[start..self.pos]).unwrap();
        if is_float {
            Ok(Tok::Flt(text.parse().unwrap_or(0.0)))
        } else if text.len() > 1 && text.starts_with('0') {
            // leading zero with no fraction/exponent: octal body
            let v = i64::from_str_radix(text, 8).unwrap_or_else(|_| text.parse().unwrap_or(0));
            Ok(Tok::Int(v))
        } else {
            Ok(Tok::Int(text.parse().unwrap_or(0)))
        }
    }

    fn lex_string(&mut self) -> Result<Tok, Error> {
        self.bump(); // opening quote
        let mut s = String::new();
        loop {
            match self.bump() {
                None | Some(b'\n') => {
                    return Err(Error::new(ErrorKind::StrNc, self.here()));
                }
                Some(b'"') => break,
                Some(b'\\') => match self.bump() {
                    Some(b'n') => s.push('\n'),
                    Some(b't') => s.push('\t'),
                    Some(b'r') => s.push('\r'),
                    Some(b'\\') => s.push('\\'),
                    Some(b'"') => s.push('"'),
                    Some(b'/') => s.push('/'),
                    Some(b'a') => s.push('\u{7}'),
                    Some(b'b') => s.push('\u{8}'),
                    Some(b'f') => s.push('\u{c}'),
                    Some(b'v') => s.push('\u{b}'),
                    Some(c) if c.is_ascii_digit() => {
                        let mut v = (c - b'0') as u32;
                        for _ in 0..2 {
                            if let Some(d) = self.peek() {
                                if d.is_ascii_digit() {
                                    v = v * 8 + (d - b'0') as u32;
                                    self.bump();
                                    continue;
                                }
                            }
                            break;
                        }
                        s.push(char::from_u32(v & 0xff).unwrap_or('\u{fffd}'));
                    }
                    Some(_) => {
                        return Err(Error::new(ErrorKind::LxChr, self.here()));
                    }
                    None => return Err(Error::new(ErrorKind::UnexEof, self.here())),
                },
                Some(c) => s.push(c as char),
            }
        }
        Ok(Tok::Str(s))
    }

    fn lex_regex(&mut self) -> Result<Tok, Error> {
        self.bump(); // opening /
        let mut s = String::new();
        loop {
            match self.bump() {
                None | Some(b'\n') => return Err(Error::new(ErrorKind::RgxNc, self.here())),
                Some(b'/') => break,
                Some(b'\\') => {
                    if let Some(c) = self.bump() {
                        if c != b'/' {
                            s.push('\\');
                        }
                        s.push(c as char);
                    } else {
                        return Err(Error::new(ErrorKind::UnexEof, self.here()));
                    }
                }
                Some(c) => s.push(c as char),
            }
        }
        Ok(Tok::Regex(s))
    }

    fn lex_ident(&mut self) -> Tok {
        let start = self.pos;
        while self.peek().map_or(false, is_ident_cont) {
            self.bump();
        }
        let text = std::str::from_utf8(&self.src[start..self.pos]).unwrap();
        let tok = match text {
            "BEGIN" => Tok::Begin,
            "END" => Tok::End,
            "function" | "func" => Tok::Function,
            "if" => Tok::If,
            "else" => Tok::Else,
            "while" => Tok::While,
            "do" => Tok::Do,
            "for" => Tok::For,
            "break" => Tok::Break,
            "continue" => Tok::Continue,
            "next" => Tok::Next,
            "nextfile" => Tok::NextFile,
            "exit" => Tok::Exit,
            "return" => Tok::Return,
            "delete" => Tok::Delete,
            "in" => Tok::In,
            "getline" => Tok::Getline,
            "print" => Tok::Print,
            "printf" => Tok::Printf,
            _ => {
                // a call-site identifier immediately followed by '(' (no
                // space) is tagged FuncName so the parser can distinguish
                // `f(x)` from the implicit-concatenation case `f (x)`.
                if self.peek() == Some(b'(') {
                    Tok::FuncName(text.to_string())
                } else {
                    Tok::Ident(text.to_string())
                }
            }
        };
        tok
    }

    /// Whether the token just produced leaves the lexer expecting an
    /// operand next (and hence makes `/` start a regex literal).
    fn update_ctx(&mut self, tok: &Tok) {
        self.ctx = match tok {
            Tok::Int(_)
            | Tok::Flt(_)
            | Tok::Str(_)
            | Tok::Regex(_)
            | Tok::Ident(_)
            | Tok::RParen
            | Tok::RBracket
            | Tok::Incr
            | Tok::Decr
            | Tok::Dollar => Ctx::Operator,
            _ => Ctx::Operand,
        };
    }

    /// Produce the next token. Returns `Tok::Eof` at end of input.
    pub fn next_token(&mut self) -> Result<Token, Error> {
        self.skip_trivia()?;
        let pos = self.here();
        let tok = match self.peek() {
            None => Tok::Eof,
            Some(b'\n') => {
                self.bump();
                Tok::Newline
            }
            Some(c) if c.is_ascii_digit() => self.lex_number()?,
            Some(b'.') if self.peek2().map_or(false, |d| d.is_ascii_digit()) => self.lex_number()?,
            Some(b'"') => self.lex_string()?,
            Some(b'/') if self.ctx == Ctx::Operand => self.lex_regex()?,
            Some(c) if is_ident_start(c) => self.lex_ident(),
            Some(b'{') => {
                self.bump();
                Tok::LBrace
            }
            Some(b'}') => {
                self.bump();
                Tok::RBrace
            }
            Some(b'(') => {
                self.bump();
                Tok::LParen
            }
            Some(b')') => {
                self.bump();
                Tok::RParen
            }
            Some(b'[') => {
                self.bump();
                Tok::LBracket
            }
            Some(b']') => {
                self.bump();
                Tok::RBracket
            }
            Some(b';') => {
                self.bump();
                Tok::Semi
            }
            Some(b',') => {
                self.bump();
                Tok::Comma
            }
            Some(b'$') => {
                self.bump();
                Tok::Dollar
            }
            Some(b'?') => {
                self.bump();
                Tok::Question
            }
            Some(b':') => {
                self.bump();
                Tok::Colon
            }
            Some(b'~') => {
                self.bump();
                Tok::Match
            }
            Some(b'@') => {
                self.bump();
                match self.peek() {
                    Some(b'/') => self.lex_regex()?,
                    _ => {
                        let start = self.pos;
                        while self.peek().map_or(false, is_ident_cont) {
                            self.bump();
                        }
                        let text = std::str::from_utf8(&self.src[start..self.pos]).unwrap();
                        match text {
                            "include" => Tok::Include,
                            "global" => Tok::Global,
                            _ => return Err(Error::new(ErrorKind::LxChr, pos)),
                        }
                    }
                }
            }
            Some(b'+') => {
                self.bump();
                match self.peek() {
                    Some(b'+') => {
                        self.bump();
                        Tok::Incr
                    }
                    Some(b'=') => {
                        self.bump();
                        Tok::AddAssign
                    }
                    _ => Tok::Plus,
                }
            }
            Some(b'-') => {
                self.bump();
                match self.peek() {
                    Some(b'-') => {
                        self.bump();
                        Tok::Decr
                    }
                    Some(b'=') => {
                        self.bump();
                        Tok::SubAssign
                    }
                    _ => Tok::Minus,
                }
            }
            Some(b'*') => {
                self.bump();
                match self.peek() {
                    Some(b'*') => {
                        self.bump();
                        if self.peek() == Some(b'=') {
                            self.bump();
                            Tok::PowAssign
                        } else {
                            Tok::StarStar
                        }
                    }
                    Some(b'=') => {
                        self.bump();
                        Tok::MulAssign
                    }
                    _ => Tok::Star,
                }
            }
            Some(b'/') => {
                self.bump();
                if self.peek() == Some(b'=') {
                    self.bump();
                    Tok::DivAssign
                } else {
                    Tok::Slash
                }
            }
            Some(b'%') => {
                self.bump();
                if self.peek() == Some(b'=') {
                    self.bump();
                    Tok::ModAssign
                } else {
                    Tok::Percent
                }
            }
            Some(b'^') => {
                self.bump();
                if self.peek() == Some(b'=') {
                    self.bump();
                    Tok::PowAssign
                } else {
                    Tok::Caret
                }
            }
            Some(b'=') => {
                self.bump();
                if self.peek() == Some(b'=') {
                    self.bump();
                    Tok::Eq
                } else {
                    Tok::Assign
                }
            }
            Some(b'!') => {
                self.bump();
                match self.peek() {
                    Some(b'=') => {
                        self.bump();
                        Tok::Ne
                    }
                    Some(b'~') => {
                        self.bump();
                        Tok::NotMatch
                    }
                    _ => Tok::Not,
                }
            }
            Some(b'<') => {
                self.bump();
                if self.peek() == Some(b'=') {
                    self.bump();
                    Tok::Le
                } else {
                    Tok::Lt
                }
            }
            Some(b'>') => {
                self.bump();
                match self.peek() {
                    Some(b'=') => {
                        self.bump();
                        Tok::Ge
                    }
                    Some(b'>') => {
                        self.bump();
                        Tok::Append
                    }
                    _ => Tok::Gt,
                }
            }
            Some(b'&') => {
                self.bump();
                if self.peek() == Some(b'&') {
                    self.bump();
                    Tok::AndAnd
                } else {
                    return Err(Error::new(ErrorKind::LxChr, pos));
                }
            }
            Some(b'|') => {
                self.bump();
                match self.peek() {
                    Some(b'|') => {
                        self.bump();
                        Tok::OrOr
                    }
                    Some(b'&') => {
                        self.bump();
                        Tok::PipeAmp
                    }
                    _ => Tok::Pipe,
                }
            }
            Some(_) => return Err(Error::new(ErrorKind::LxChr, pos)),
        };
        self.update_ctx(&tok);
        Ok(Token { tok, pos })
    }

    /// Tokenize the whole source in one pass (used by the parser, which
    /// wants unbounded lookahead over a `Vec<Token>`).
    pub fn tokenize(src: &'a str) -> Result<Vec<Token>, Error> {
        let mut lexer = Self::new(src);
        let mut out = Vec::new();
        loop {
            let t = lexer.next_token()?;
            let done = t.tok == Tok::Eof;
            out.push(t);
            if done {
                break;
            }
        }
        Ok(out)
    }
}

/// Supplies the contents of a file named by `@include "path"`. The core
/// doesn't know how to open files (concrete I/O backends are an explicit
/// Non-goal, spec.md §1); hosts that want `@include` support provide one.
pub trait SourceLoader {
    fn load(&self, path: &str) -> Result<String, Error>;
}

/// A loader that always fails; used when a program has no includes to
/// resolve.
pub struct NoIncludes;
impl SourceLoader for NoIncludes {
    fn load(&self, path: &str) -> Result<String, Error> {
        Err(Error::with_detail(
            ErrorKind::NoEnt,
            format!("no source loader configured to resolve @include \"{}\"", path),
            Position::NONE,
        ))
    }
}

const MAX_INCLUDE_DEPTH: usize = 32;

/// Expand every `@include "path"` in `tokens` by splicing in the tokens of
/// the named file, recursively, detecting `@include` cycles by path
/// identity (spec.md §4.3).
pub fn expand_includes(
    tokens: Vec<Token>,
    loader: &dyn SourceLoader,
) -> Result<Vec<Token>, Error> {
    expand_includes_inner(tokens, loader, &mut Vec::new())
}

fn expand_includes_inner(
    tokens: Vec<Token>,
    loader: &dyn SourceLoader,
    stack: &mut Vec<String>,
) -> Result<Vec<Token>, Error> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        if tokens[i].tok == Tok::Include {
            let pos = tokens[i].pos;
            let path = match tokens.get(i + 1).map(|t| &t.tok) {
                Some(Tok::Str(s)) => s.clone(),
                _ => return Err(Error::new(ErrorKind::Syntax, pos)),
            };
            if stack.iter().any(|p| p == &path) {
                return Err(Error::with_detail(
                    ErrorKind::Exist,
                    format!("@include cycle detected at \"{}\"", path),
                    pos,
                ));
            }
            if stack.len() >= MAX_INCLUDE_DEPTH {
                return Err(Error::with_detail(
                    ErrorKind::NoMem,
                    "@include nesting too deep",
                    pos,
                ));
            }
            let child_src = loader.load(&path)?;
            let child_tokens = Lexer::tokenize(&child_src)?;
            stack.push(path);
            let expanded = expand_includes_inner(child_tokens, loader, stack)?;
            stack.pop();
            // drop the trailing Eof of the included file's token stream
            out.extend(expanded.into_iter().filter(|t| t.tok != Tok::Eof));
            i += 2;
        } else {
            out.push(tokens[i].clone());
            i += 1;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(src: &str) -> Vec<Tok> {
        Lexer::tokenize(src)
            .unwrap()
            .into_iter()
            .map(|t| t.tok)
            .collect()
    }

    #[test]
    fn division_vs_regex() {
        // After an identifier, `/` divides.
        assert_eq!(toks("a / b"), vec![Tok::Ident("a".into()), Tok::Slash, Tok::Ident("b".into()), Tok::Eof]);
        // At the start of an expression, `/` opens a regex literal.
        let t = toks("/foo/");
        assert_eq!(t, vec![Tok::Regex("foo".into()), Tok::Eof]);
    }

    #[test]
    fn regex_after_match_operator() {
        let t = toks("$0 ~ /^foo/");
        assert_eq!(
            t,
            vec![Tok::Dollar, Tok::Int(0), Tok::Match, Tok::Regex("^foo".into()), Tok::Eof]
        );
    }

    #[test]
    fn string_escapes() {
        let t = toks(r#""a\tb\n""#);
        assert_eq!(t, vec![Tok::Str("a\tb\n".into()), Tok::Eof]);
    }

    #[test]
    fn numbers() {
        assert_eq!(toks("0x1F"), vec![Tok::Int(31), Tok::Eof]);
        assert_eq!(toks("010"), vec![Tok::Int(8), Tok::Eof]);
        assert_eq!(toks("3.14"), vec![Tok::Flt(3.14), Tok::Eof]);
        assert_eq!(toks("1e3"), vec![Tok::Flt(1000.0), Tok::Eof]);
    }

    #[test]
    fn func_name_vs_ident() {
        assert_eq!(toks("foo(1)")[0], Tok::FuncName("foo".into()));
        assert_eq!(toks("foo (1)")[0], Tok::Ident("foo".into()));
    }
}
