//! The program tree produced by the parser (spec.md §4.3) and annotated
//! in place by the linker (spec.md §4.4).
//!
//! Name resolution is recorded directly on the tree: every place a bare
//! name appears (`Expr::Var`, `Expr::Index`, `Stmt::ForIn`, `Stmt::Delete`,
//! `Expr::Call`) carries a `Cell<Option<Binding>>` that starts `None` from
//! the parser and is filled in by `compile::link` once the full symbol
//! table is known. This keeps the tree single-pass to build while still
//! giving the linker a second pass over it to resolve forward references
//! (mirrors the teacher's `AST` + separate `optimize`/resolution passes
//! operating on one shared tree rather than rebuilding it).

use crate::error::Position;
use std::cell::Cell;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    Global(usize),
    /// A function parameter slot. AWK has no separate `local` declaration;
    /// locals are simply extra formal parameters the caller never supplies
    /// (spec.md §4.5: "missing trailing arguments bind to Nil").
    Param(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallTarget {
    User(usize),
    Intrinsic(usize),
}

#[derive(Debug, Default)]
pub struct Resolved<T>(pub Cell<Option<T>>);

impl<T: Copy> Resolved<T> {
    pub fn new() -> Self {
        Self(Cell::new(None))
    }
    pub fn get(&self) -> Option<T> {
        self.0.get()
    }
    pub fn set(&self, v: T) {
        self.0.set(Some(v));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Pos,
    Not,
}

#[derive(Debug)]
pub enum Expr {
    IntLit(i64),
    FltLit(f64),
    StrLit(String),
    /// A bare `/re/` used as an rvalue matches against `$0`.
    RegexLit(String, Resolved<usize>),
    Var(String, Resolved<Binding>, Position),
    Field(Box<Expr>),
    Index(String, Resolved<Binding>, Vec<Expr>),
    Grouping(Vec<Expr>),
    Assign(Box<Expr>, AssignOp, Box<Expr>, Position),
    PreIncr(Box<Expr>),
    PreDecr(Box<Expr>),
    PostIncr(Box<Expr>),
    PostDecr(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>, Position),
    Unary(UnOp, Box<Expr>),
    Concat(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Ternary(Box<Expr>, Box<Expr>, Box<Expr>),
    Match(Box<Expr>, Box<Expr>, bool),
    In(Vec<Expr>, String, Resolved<Binding>),
    Call(String, Vec<Expr>, Resolved<CallTarget>, Position),
    Getline(GetlineForm, Position),
    Group(Box<Expr>),
}

#[derive(Debug)]
pub enum GetlineForm {
    Simple {
        target: Option<Box<Expr>>,
    },
    FromFile {
        target: Option<Box<Expr>>,
        file: Box<Expr>,
    },
    FromPipe {
        target: Option<Box<Expr>>,
        cmd: Box<Expr>,
    },
    FromCoproc {
        target: Option<Box<Expr>>,
        cmd: Box<Expr>,
    },
}

#[derive(Debug)]
pub enum Redirect {
    File(Expr),
    Append(Expr),
    Pipe(Expr),
    Coproc(Expr),
}

#[derive(Debug)]
pub enum Stmt {
    Expr(Expr),
    Print(Vec<Expr>, Option<Redirect>),
    Printf(Vec<Expr>, Option<Redirect>),
    If(Expr, Box<Stmt>, Option<Box<Stmt>>),
    While(Expr, Box<Stmt>),
    DoWhile(Box<Stmt>, Expr),
    For(Option<Box<Stmt>>, Option<Expr>, Option<Box<Stmt>>, Box<Stmt>),
    ForIn(String, Resolved<Binding>, String, Resolved<Binding>, Box<Stmt>),
    Block(Vec<Stmt>),
    Break(Position),
    Continue(Position),
    Next(Position),
    NextFile(Position),
    Exit(Option<Expr>),
    Return(Option<Expr>, Position),
    Delete(String, Resolved<Binding>, Vec<Expr>),
    Empty,
}

#[derive(Debug)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
    pub pos: Position,
    /// Filled in by the linker: true for each parameter position first used
    /// as a map (pass-by-reference), false for scalar (pass-by-value), per
    /// spec.md §4.5's by-use-site parameter-mode inference.
    pub param_is_map: Cell<Vec<bool>>,
}

#[derive(Debug)]
pub enum Pattern {
    Always,
    Expr(Expr),
    Regex(String, Resolved<usize>),
    Range(Expr, Expr),
}

#[derive(Debug)]
pub struct Rule {
    pub pattern: Pattern,
    /// `None` means the default action `{ print $0 }`.
    pub action: Option<Vec<Stmt>>,
}

#[derive(Debug, Default)]
pub struct ParsedProgram {
    pub functions: Vec<FunctionDecl>,
    pub begin: Vec<Vec<Stmt>>,
    pub end: Vec<Vec<Stmt>>,
    pub rules: Vec<Rule>,
}
