//! Module containing error definitions for lexing, parsing and evaluation.

use std::fmt;

/// A source location, tracked through the lexer, parser and runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub const NONE: Position = Position { line: 0, column: 0 };

    #[must_use]
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    #[must_use]
    pub fn is_none(&self) -> bool {
        self.line == 0
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "?")
        } else {
            write!(f, "{}:{}", self.line, self.column)
        }
    }
}

/// The closed set of error kinds from the specification's failure model
/// (lexical, syntactic, semantic/runtime, and system errors all share one
/// enumeration so a single [`Error`] value can be threaded through every
/// phase of the interpreter).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    NoErr,
    NoMem,
    Inval,
    NoEnt,
    Exist,
    Acces,
    Busy,
    Perm,
    Io,
    Pipe,
    Intr,
    Again,
    Tmout,
    SysErr,

    // lexical
    LxChr,
    LxDig,
    UnexEof,
    CmtNc,
    StrNc,
    RgxNc,

    // syntax
    Syntax,
    Eof,
    BlkBeg,
    BlkEnd,
    LBrace,
    RBrace,
    LParen,
    RParen,
    SColon,
    Colon,
    In,
    NotVar,
    Expr,
    Keyword,
    End,
    Func,
    Fid,
    RBrack,
    Assign,
    Ident,

    // semantic / runtime
    DupGbl,
    DupPar,
    DupLcl,
    BadPar,
    BadArg,
    Undef,
    LValue,
    Recursion,
    FnCImpl,
    IoImpl,
    NoSuchIo,
    IoAttr,
    FmtChr,
    PrintfArg,
    PrePst,
    Glnf,
    DivBy0,
    NegIdx,
    NoMap,
    MapToScalar,
    ScalarToMap,
    NionMpl,
    RexBl,
    RexMat,
    RexRecur,
}

impl ErrorKind {
    #[must_use]
    pub fn message(&self) -> &'static str {
        use ErrorKind::*;
        match self {
            NoErr => "no error",
            NoMem => "out of memory",
            Inval => "invalid value",
            NoEnt => "no such entity",
            Exist => "entity already exists",
            Acces => "access denied",
            Busy => "resource busy",
            Perm => "operation not permitted",
            Io => "i/o error",
            Pipe => "broken pipe",
            Intr => "interrupted",
            Again => "resource temporarily unavailable",
            Tmout => "timed out",
            SysErr => "system error",
            LxChr => "invalid character",
            LxDig => "invalid digit",
            UnexEof => "unexpected end of file",
            CmtNc => "comment not closed",
            StrNc => "string not closed",
            RgxNc => "regular expression literal not closed",
            Syntax => "syntax error",
            Eof => "unexpected end of file",
            BlkBeg => "expected a block to begin",
            BlkEnd => "expected a block to end",
            LBrace => "expected '{'",
            RBrace => "expected '}'",
            LParen => "expected '('",
            RParen => "expected ')'",
            SColon => "expected ';'",
            Colon => "expected ':'",
            In => "expected 'in'",
            NotVar => "not a variable",
            Expr => "expected an expression",
            Keyword => "unexpected keyword",
            End => "unexpected end of program",
            Func => "invalid function definition",
            Fid => "function already defined",
            RBrack => "expected ']'",
            Assign => "expected an assignment target",
            Ident => "expected an identifier",
            DupGbl => "global already declared",
            DupPar => "duplicate parameter name",
            DupLcl => "duplicate local name",
            BadPar => "bad parameter",
            BadArg => "bad argument",
            Undef => "reference to an undefined name",
            LValue => "not an assignable location",
            Recursion => "recursion limit exceeded",
            FnCImpl => "function not implemented",
            IoImpl => "i/o not implemented",
            NoSuchIo => "no such i/o stream",
            IoAttr => "bad i/o redirection",
            FmtChr => "bad format character",
            PrintfArg => "bad printf argument",
            PrePst => "break/continue outside a loop",
            Glnf => "invalid getline form",
            DivBy0 => "division by zero",
            NegIdx => "negative index",
            NoMap => "value is not a map",
            MapToScalar => "cannot use a map in a scalar context",
            ScalarToMap => "cannot use a scalar in a map context",
            NionMpl => "next/nextfile not allowed here",
            RexBl => "regular expression build error",
            RexMat => "regular expression match error",
            RexRecur => "regular expression recursion too deep",
        }
    }
}

/// A single Hawk error: an [`ErrorKind`], a formatted message and the
/// location it occurred at, if tracked.
#[derive(Debug, Clone)]
pub struct Error {
    pub kind: ErrorKind,
    pub detail: String,
    pub pos: Position,
}

impl Error {
    #[must_use]
    pub fn new(kind: ErrorKind, pos: Position) -> Self {
        Self {
            detail: kind.message().to_string(),
            kind,
            pos,
        }
    }

    #[must_use]
    pub fn with_detail(kind: ErrorKind, detail: impl Into<String>, pos: Position) -> Self {
        Self {
            kind,
            detail: detail.into(),
            pos,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.pos.is_none() {
            write!(f, "{}", self.detail)
        } else {
            write!(f, "{} at {}", self.detail, self.pos)
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
