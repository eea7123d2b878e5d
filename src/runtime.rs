//! The tree-walking interpreter (spec.md §4.5): drives the BEGIN/main-loop/
//! END phases, evaluates expressions, executes statements against the
//! linked [`Program`], and owns the live per-run state (global slots, the
//! current record's fields, open streams) that the compiler only reserved
//! room for.

use crate::ast::*;
use crate::compile::Program;
use crate::error::{Error, ErrorKind, Position};
use crate::fields::{self, FieldSep, FieldTable};
use crate::intrinsics::{self, Host as _, IntrinsicKind};
use crate::io::{IoHost, OpenMode, OpenOutcome, StreamKind, Streams};
use crate::map::Map;
use crate::regex::{CompiledRegex, RegexValue};
use crate::scope::SPECIAL_GLOBALS;
use crate::value::{DEFAULT_CONVFMT, Value};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Fixed slot indices for [`SPECIAL_GLOBALS`] — valid only because
/// [`crate::compile::link`] seeds a fresh [`crate::scope::GlobalTable`] with
/// exactly this name list, in this order, before resolving the rest of the
/// program.
mod slot {
    pub const NR: usize = 0;
    pub const NF: usize = 1;
    pub const FNR: usize = 2;
    pub const FS: usize = 3;
    pub const OFS: usize = 4;
    pub const ORS: usize = 5;
    pub const RS: usize = 6;
    pub const FILENAME: usize = 7;
    pub const SUBSEP: usize = 8;
    pub const CONVFMT: usize = 9;
    pub const OFMT: usize = 10;
    pub const RLENGTH: usize = 11;
    pub const RSTART: usize = 12;
    pub const ENVIRON: usize = 13;
    pub const ARGC: usize = 14;
    pub const ARGV: usize = 15;
    pub const IGNORECASE: usize = 16;
}

/// Non-local control transfer, doubling as the interpreter's error channel
/// so `?` threads both faults and the control signals of spec.md §4.5
/// ("every statement returns a control signal") through one call chain.
/// `Ok(())`/`Ok(value)` stands in for the spec's NORMAL; everything else is
/// carried as an `Err` so it unwinds through nested expression evaluation
/// (the only place a signal can originate mid-expression is a user function
/// call) until a loop, function call, or the top-level driver consumes it.
#[derive(Debug)]
enum Signal {
    Error(Error),
    Break,
    Continue,
    Return(Value),
    Next,
    NextFile,
    Exit(i64),
}

impl From<Error> for Signal {
    fn from(e: Error) -> Self {
        Signal::Error(e)
    }
}

type Flow<T> = Result<T, Signal>;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Phase {
    Begin,
    Main,
    End,
}

struct Frame {
    params: Vec<Rc<RefCell<Value>>>,
}

/// Tunables for one run, in the teacher's builder-on-a-settings-struct
/// style (mirrors `engine_settings.rs`'s `set_max_call_levels`).
pub struct Settings {
    max_call_depth: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self { max_call_depth: 1000 }
    }
}

impl Settings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recursion limit enforced by user function calls (spec.md §4.5:
    /// "stack depth is bounded by a configurable maximum").
    pub fn set_max_call_depth(&mut self, depth: usize) -> &mut Self {
        self.max_call_depth = depth;
        self
    }

    #[must_use]
    pub fn max_call_depth(&self) -> usize {
        self.max_call_depth
    }
}

/// Either the linker's precompiled, always-`icase=false` pattern for a
/// static `/regex/` literal, or a freshly (dual-)compiled one for a dynamic
/// string pattern (spec.md §4.6's case-insensitive twin).
enum RegexRef<'p> {
    Static(&'p CompiledRegex),
    Dynamic(Rc<RegexValue>),
}

impl<'p> RegexRef<'p> {
    fn active(&self, icase: bool) -> &CompiledRegex {
        match self {
            RegexRef::Static(r) => r,
            RegexRef::Dynamic(rv) => {
                if icase {
                    rv.icase.as_ref().unwrap_or(&rv.primary)
                } else {
                    &rv.primary
                }
            }
        }
    }
}

fn numeric_value(f: f64) -> Value {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e18 {
        Value::new_int(f as i64)
    } else {
        Value::new_flt(f)
    }
}

/// Interprets one linked [`Program`] against one [`IoHost`]. Cheap to
/// construct and drop; two instances never share mutable state (spec.md
/// §5: "no global mutable state").
pub struct Interpreter<'p, 'h> {
    program: &'p Program,
    host: &'h mut dyn IoHost,
    globals: Vec<Rc<RefCell<Value>>>,
    fields: FieldTable,
    streams: Streams,
    frames: Vec<Frame>,
    settings: Settings,
    call_depth: usize,
    phase: Phase,
    halt: Rc<AtomicBool>,
    range_active: Vec<bool>,
}

impl<'p, 'h> Interpreter<'p, 'h> {
    #[must_use]
    pub fn new(program: &'p Program, host: &'h mut dyn IoHost) -> Self {
        Self::with_settings(program, host, Settings::default())
    }

    #[must_use]
    pub fn with_settings(program: &'p Program, host: &'h mut dyn IoHost, settings: Settings) -> Self {
        debug_assert!(program.globals.len() >= SPECIAL_GLOBALS.len());
        let globals = (0..program.globals.len())
            .map(|_| Rc::new(RefCell::new(Value::Nil)))
            .collect();
        let mut me = Self {
            program,
            host,
            globals,
            fields: FieldTable::new(),
            streams: Streams::new(),
            frames: Vec::new(),
            settings,
            call_depth: 0,
            phase: Phase::Begin,
            halt: Rc::new(AtomicBool::new(false)),
            range_active: Vec::new(),
        };
        me.init_special_globals();
        me
    }

    fn init_special_globals(&mut self) {
        self.set_global_str(slot::FS, " ");
        self.set_global_str(slot::OFS, " ");
        self.set_global_str(slot::ORS, "\n");
        self.set_global_str(slot::RS, "\n");
        self.set_global_str(slot::SUBSEP, "\u{1c}");
        self.set_global_str(slot::CONVFMT, DEFAULT_CONVFMT);
        self.set_global_str(slot::OFMT, DEFAULT_CONVFMT);
        self.set_global_str(slot::FILENAME, "");
        self.set_global_int(slot::NR, 0);
        self.set_global_int(slot::NF, 0);
        self.set_global_int(slot::FNR, 0);
        self.set_global_int(slot::RSTART, 0);
        self.set_global_int(slot::RLENGTH, -1);
        self.set_global_int(slot::IGNORECASE, 0);
        *self.globals[slot::ENVIRON].borrow_mut() = Value::new_map();
        let argv = Value::new_map();
        if let Value::Map(m) = &argv {
            m.borrow_mut().put("0", Value::new_str("awk"));
        }
        *self.globals[slot::ARGV].borrow_mut() = argv;
        self.set_global_int(slot::ARGC, 1);
    }

    /// Populate `ARGV[1..]`/`ARGC` from the embedding host's already-parsed
    /// positional arguments; the command-line driver that would parse raw
    /// `argv` itself is a Non-goal (spec.md §1), so the host supplies the
    /// list instead of Hawk reading `std::env::args()`.
    pub fn set_args(&mut self, args: &[String]) {
        let map = self.globals[slot::ARGV]
            .borrow()
            .as_map()
            .expect("ARGV is always initialized as a map");
        {
            let mut m = map.borrow_mut();
            for (i, a) in args.iter().enumerate() {
                m.put(&(i + 1).to_string(), Value::new_input_str(a.clone()));
            }
        }
        self.set_global_int(slot::ARGC, (args.len() + 1) as i64);
    }

    /// A shared flag an embedding host can set from outside (e.g. a signal
    /// handler) to cooperatively stop the run at the next statement or loop
    /// boundary (spec.md §5).
    #[must_use]
    pub fn halt_handle(&self) -> Rc<AtomicBool> {
        self.halt.clone()
    }

    fn halted(&self) -> bool {
        self.halt.load(Ordering::Relaxed)
    }

    // --- global slot access -------------------------------------------------

    fn global_int(&self, i: usize) -> i64 {
        self.globals[i].borrow().to_int()
    }

    fn global_bool(&self, i: usize) -> bool {
        self.globals[i].borrow().to_bool()
    }

    fn global_str(&self, i: usize) -> String {
        self.globals[i].borrow().to_str().to_string()
    }

    fn set_global_int(&mut self, i: usize, v: i64) {
        *self.globals[i].borrow_mut() = Value::new_int(v);
    }

    fn set_global_str(&mut self, i: usize, v: &str) {
        *self.globals[i].borrow_mut() = Value::new_str(v);
    }

    fn convfmt(&self) -> String {
        self.global_str(slot::CONVFMT)
    }

    fn current_fs(&self) -> FieldSep {
        let v = self.globals[slot::FS].borrow().clone();
        fields::fs_from_value(&v)
    }

    fn record0(&self) -> String {
        self.fields.get(0).to_string()
    }

    fn bump_nr(&mut self) {
        let nr = self.global_int(slot::NR) + 1;
        let fnr = self.global_int(slot::FNR) + 1;
        self.set_global_int(slot::NR, nr);
        self.set_global_int(slot::FNR, fnr);
    }

    fn bump_nr_only(&mut self) {
        let nr = self.global_int(slot::NR) + 1;
        self.set_global_int(slot::NR, nr);
    }

    // --- driver ---------------------------------------------------------

    /// Run BEGIN, the main loop (if the program has any pattern-action
    /// pairs), then END, returning the process exit code `exit <n>` would
    /// report (0 if the program never called `exit`).
    pub fn run(&mut self) -> Result<i64, Error> {
        self.range_active = vec![false; self.program.rules.len()];
        let mut exit_code = None;

        match self.run_phase(Phase::Begin) {
            Ok(()) => {}
            Err(Signal::Exit(n)) => exit_code = Some(n),
            Err(Signal::Error(e)) => return Err(e),
            Err(_other) => {}
        }

        if exit_code.is_none() && !self.program.rules.is_empty() {
            match self.run_main_loop() {
                Ok(()) => {}
                Err(Signal::Exit(n)) => exit_code = Some(n),
                Err(Signal::Error(e)) => return Err(e),
                Err(_other) => {}
            }
        }

        match self.run_phase(Phase::End) {
            Ok(()) => {}
            Err(Signal::Exit(n)) => exit_code = Some(n),
            Err(Signal::Error(e)) => return Err(e),
            Err(_other) => {}
        }

        self.streams.close_all(self.host);
        Ok(exit_code.unwrap_or(0))
    }

    fn run_phase(&mut self, phase: Phase) -> Flow<()> {
        self.phase = phase;
        let program = self.program;
        let blocks = match phase {
            Phase::Begin => &program.begin,
            Phase::End => &program.end,
            Phase::Main => unreachable!("run_phase only drives BEGIN/END"),
        };
        for block in blocks {
            self.exec_stmts(block)?;
        }
        Ok(())
    }

    fn run_main_loop(&mut self) -> Flow<()> {
        self.phase = Phase::Main;
        loop {
            if self.halted() {
                return Err(Signal::Exit(-1));
            }
            let Some(line) = self.next_record()? else {
                return Ok(());
            };
            self.set_record(&line);
            let program = self.program;
            'rules: for (i, rule) in program.rules.iter().enumerate() {
                if self.halted() {
                    return Err(Signal::Exit(-1));
                }
                if !self.pattern_matches(i, &rule.pattern)? {
                    continue;
                }
                match &rule.action {
                    None => self.print_default_record()?,
                    Some(stmts) => match self.exec_stmts(stmts) {
                        Ok(()) => {}
                        Err(Signal::Next) => break 'rules,
                        Err(Signal::NextFile) => {
                            self.host.console_advance()?;
                            break 'rules;
                        }
                        Err(other) => return Err(other),
                    },
                }
            }
        }
    }

    /// Reads the next console record, advancing across input files via
    /// `console_advance` when the current one is exhausted, resetting FNR
    /// at each boundary (spec.md §4.5's "advances to the next" contract).
    fn next_record(&mut self) -> Flow<Option<String>> {
        loop {
            match self.host.console_read_line()? {
                Some(line) => {
                    self.bump_nr();
                    if let Some(name) = self.host.console_filename() {
                        self.set_global_str(slot::FILENAME, &name);
                    }
                    return Ok(Some(line));
                }
                None => {
                    if self.host.console_advance()? {
                        self.set_global_int(slot::FNR, 0);
                        continue;
                    }
                    return Ok(None);
                }
            }
        }
    }

    fn set_record(&mut self, line: &str) {
        let fs = self.current_fs();
        let icase = self.global_bool(slot::IGNORECASE);
        self.fields.set_record(line, &fs, icase);
        let nf = self.fields.nf() as i64;
        self.set_global_int(slot::NF, nf);
    }

    fn print_default_record(&mut self) -> Flow<()> {
        let ors = self.global_str(slot::ORS);
        let rec = self.record0();
        self.host.console_write(&rec)?;
        self.host.console_write(&ors)?;
        Ok(())
    }

    fn pattern_matches(&mut self, rule_idx: usize, pattern: &Pattern) -> Flow<bool> {
        match pattern {
            Pattern::Always => Ok(true),
            Pattern::Expr(e) => Ok(self.eval_expr(e)?.to_bool()),
            Pattern::Regex(_, slot) => {
                let idx = slot.get().expect("regex literal resolved by linker");
                Ok(self.program.regexes[idx].is_match(&self.record0()))
            }
            Pattern::Range(start, end) => {
                if self.range_active[rule_idx] {
                    if self.eval_expr(end)?.to_bool() {
                        self.range_active[rule_idx] = false;
                    }
                    Ok(true)
                } else if self.eval_expr(start)?.to_bool() {
                    if self.eval_expr(end)?.to_bool() {
                        // start and end both match on this record: a
                        // one-record range, not left active.
                    } else {
                        self.range_active[rule_idx] = true;
                    }
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
        }
    }

    // --- statement execution --------------------------------------------

    fn exec_stmts(&mut self, stmts: &[Stmt]) -> Flow<()> {
        for s in stmts {
            self.exec_stmt(s)?;
        }
        Ok(())
    }

    fn exec_stmt(&mut self, stmt: &Stmt) -> Flow<()> {
        if self.halted() {
            return Err(Signal::Exit(-1));
        }
        match stmt {
            Stmt::Expr(e) => {
                self.eval_expr(e)?;
                Ok(())
            }
            Stmt::Print(args, redir) => self.exec_print(args, redir.as_ref()),
            Stmt::Printf(args, redir) => self.exec_printf(args, redir.as_ref()),
            Stmt::If(cond, then_b, else_b) => {
                if self.eval_expr(cond)?.to_bool() {
                    self.exec_stmt(then_b)
                } else if let Some(e) = else_b {
                    self.exec_stmt(e)
                } else {
                    Ok(())
                }
            }
            Stmt::While(cond, body) => self.exec_while(cond, body),
            Stmt::DoWhile(body, cond) => self.exec_do_while(body, cond),
            Stmt::For(init, cond, post, body) => {
                self.exec_for(init.as_deref(), cond.as_ref(), post.as_deref(), body)
            }
            Stmt::ForIn(_, var_bind, _, arr_bind, body) => self.exec_for_in(var_bind, arr_bind, body),
            Stmt::Block(stmts) => self.exec_stmts(stmts),
            Stmt::Break(_) => Err(Signal::Break),
            Stmt::Continue(_) => Err(Signal::Continue),
            Stmt::Next(pos) => {
                if self.phase != Phase::Main {
                    return Err(Error::new(ErrorKind::NionMpl, *pos).into());
                }
                Err(Signal::Next)
            }
            Stmt::NextFile(pos) => {
                if self.phase != Phase::Main {
                    return Err(Error::new(ErrorKind::NionMpl, *pos).into());
                }
                Err(Signal::NextFile)
            }
            Stmt::Exit(e) => {
                let code = match e {
                    Some(expr) => self.eval_expr(expr)?.to_int(),
                    None => 0,
                };
                Err(Signal::Exit(code))
            }
            Stmt::Return(e, _pos) => {
                let v = match e {
                    Some(expr) => self.eval_expr(expr)?,
                    None => Value::Nil,
                };
                Err(Signal::Return(v))
            }
            Stmt::Delete(_, bind, keys) => {
                let map = self.resolve_map(bind.get().expect("resolved"))?;
                if keys.is_empty() {
                    map.borrow_mut().clear();
                } else {
                    let key = self.join_subsep(keys)?;
                    map.borrow_mut().delete(&key);
                }
                Ok(())
            }
            Stmt::Empty => Ok(()),
        }
    }

    fn exec_print(&mut self, args: &[Expr], redir: Option<&Redirect>) -> Flow<()> {
        let mut parts = Vec::with_capacity(args.len().max(1));
        if args.is_empty() {
            parts.push(self.record0());
        } else {
            for a in args {
                let v = self.eval_expr(a)?;
                let ofmt = self.global_str(slot::OFMT);
                parts.push(v.to_str_fmt(&ofmt).to_string());
            }
        }
        let ofs = self.global_str(slot::OFS);
        let ors = self.global_str(slot::ORS);
        let mut line = parts.join(&ofs);
        line.push_str(&ors);
        self.write_output(redir, &line)
    }

    fn exec_printf(&mut self, args: &[Expr], redir: Option<&Redirect>) -> Flow<()> {
        let mut vals = Vec::with_capacity(args.len());
        for a in args {
            vals.push(self.eval_expr(a)?);
        }
        if vals.is_empty() {
            return Err(Error::new(ErrorKind::PrintfArg, Position::NONE).into());
        }
        let convfmt = self.convfmt();
        let fmt = vals[0].to_str_fmt(&convfmt).to_string();
        let text = intrinsics::sprintf::format(&fmt, &vals[1..])?;
        self.write_output(redir, &text)
    }

    fn write_output(&mut self, redir: Option<&Redirect>, text: &str) -> Flow<()> {
        match redir {
            None => {
                self.host.console_write(text)?;
                Ok(())
            }
            Some(r) => {
                let (kind, mode, name_expr) = match r {
                    Redirect::File(e) => (StreamKind::File, OpenMode::Write, e),
                    Redirect::Append(e) => (StreamKind::File, OpenMode::Append, e),
                    Redirect::Pipe(e) => (StreamKind::Pipe, OpenMode::Write, e),
                    Redirect::Coproc(e) => (StreamKind::Coproc, OpenMode::ReadWrite, e),
                };
                let convfmt = self.convfmt();
                let name = self.eval_expr(name_expr)?.to_str_fmt(&convfmt).to_string();
                if !self.streams.is_open(&name) {
                    if let OpenOutcome::Error = self.streams.open(self.host, &name, kind, mode)? {
                        return Err(Error::with_detail(
                            ErrorKind::IoAttr,
                            format!("cannot open '{}' for writing", name),
                            Position::NONE,
                        )
                        .into());
                    }
                }
                self.streams.write(self.host, &name, text)?;
                Ok(())
            }
        }
    }

    fn exec_while(&mut self, cond: &Expr, body: &Stmt) -> Flow<()> {
        loop {
            if self.halted() {
                return Err(Signal::Exit(-1));
            }
            if !self.eval_expr(cond)?.to_bool() {
                return Ok(());
            }
            match self.exec_stmt(body) {
                Ok(()) | Err(Signal::Continue) => {}
                Err(Signal::Break) => return Ok(()),
                Err(other) => return Err(other),
            }
        }
    }

    fn exec_do_while(&mut self, body: &Stmt, cond: &Expr) -> Flow<()> {
        loop {
            if self.halted() {
                return Err(Signal::Exit(-1));
            }
            match self.exec_stmt(body) {
                Ok(()) | Err(Signal::Continue) => {}
                Err(Signal::Break) => return Ok(()),
                Err(other) => return Err(other),
            }
            if !self.eval_expr(cond)?.to_bool() {
                return Ok(());
            }
        }
    }

    fn exec_for(
        &mut self,
        init: Option<&Stmt>,
        cond: Option<&Expr>,
        post: Option<&Stmt>,
        body: &Stmt,
    ) -> Flow<()> {
        if let Some(i) = init {
            self.exec_stmt(i)?;
        }
        loop {
            if self.halted() {
                return Err(Signal::Exit(-1));
            }
            if let Some(c) = cond {
                if !self.eval_expr(c)?.to_bool() {
                    return Ok(());
                }
            }
            match self.exec_stmt(body) {
                Ok(()) | Err(Signal::Continue) => {}
                Err(Signal::Break) => return Ok(()),
                Err(other) => return Err(other),
            }
            if let Some(p) = post {
                self.exec_stmt(p)?;
            }
        }
    }

    /// Iterates a snapshot of the map's current keys, so deleting entries
    /// from inside the loop body can't disturb the cursor (spec.md §4.1).
    fn exec_for_in(
        &mut self,
        var_bind: &Resolved<Binding>,
        arr_bind: &Resolved<Binding>,
        body: &Stmt,
    ) -> Flow<()> {
        let map = self.resolve_map(arr_bind.get().expect("resolved"))?;
        let keys = map.borrow().keys();
        let var_slot = self.binding_slot(var_bind.get().expect("resolved"));
        for k in keys {
            if self.halted() {
                return Err(Signal::Exit(-1));
            }
            *var_slot.borrow_mut() = Value::new_input_str(k.as_str());
            match self.exec_stmt(body) {
                Ok(()) | Err(Signal::Continue) => {}
                Err(Signal::Break) => break,
                Err(other) => return Err(other),
            }
        }
        Ok(())
    }

    // --- lvalues ----------------------------------------------------------

    fn binding_slot(&self, b: Binding) -> Rc<RefCell<Value>> {
        match b {
            Binding::Global(i) => self.globals[i].clone(),
            Binding::Param(i) => self.frames.last().expect("Param binding outside a function call").params[i].clone(),
        }
    }

    /// Promotes a Nil/empty-string scalar to an empty map on first map use
    /// (spec.md §4.5); any other scalar content is an error.
    fn resolve_map(&mut self, b: Binding) -> Flow<Rc<RefCell<Map>>> {
        let target = self.binding_slot(b);
        let promote = {
            let v = target.borrow();
            match &*v {
                Value::Map(m) => return Ok(m.clone()),
                Value::Nil => true,
                Value::Str(s) if s.is_empty() => true,
                _ => false,
            }
        };
        if promote {
            let m = Rc::new(RefCell::new(Map::new()));
            *target.borrow_mut() = Value::Map(m.clone());
            Ok(m)
        } else {
            Err(Error::new(ErrorKind::ScalarToMap, Position::NONE).into())
        }
    }

    fn join_subsep(&mut self, keys: &[Expr]) -> Flow<String> {
        let subsep = self.global_str(slot::SUBSEP);
        let convfmt = self.convfmt();
        let mut parts = Vec::with_capacity(keys.len());
        for k in keys {
            let v = self.eval_expr(k)?;
            parts.push(v.to_str_fmt(&convfmt).to_string());
        }
        Ok(parts.join(&subsep))
    }

    fn set_field(&mut self, i: i64, val: Value) -> Flow<()> {
        if i < 0 {
            return Err(Error::new(ErrorKind::NegIdx, Position::NONE).into());
        }
        let convfmt = self.convfmt();
        let text = val.to_str_fmt(&convfmt).to_string();
        if i == 0 {
            let fs = self.current_fs();
            let icase = self.global_bool(slot::IGNORECASE);
            self.fields.set_record(&text, &fs, icase);
        } else {
            let ofs = self.global_str(slot::OFS);
            self.fields.set_field(i, text, &ofs);
        }
        let nf = self.fields.nf() as i64;
        self.set_global_int(slot::NF, nf);
        Ok(())
    }

    fn assign_lvalue(&mut self, e: &Expr, val: Value) -> Flow<()> {
        match e {
            Expr::Var(_, bind, _) => {
                match bind.get().expect("resolved") {
                    Binding::Global(i) if i == slot::NF => {
                        let ofs = self.global_str(slot::OFS);
                        self.fields.set_nf(val.to_int(), &ofs);
                        let nf = self.fields.nf() as i64;
                        self.set_global_int(slot::NF, nf);
                    }
                    b => *self.binding_slot(b).borrow_mut() = val,
                }
                Ok(())
            }
            Expr::Field(idx) => {
                let i = self.eval_expr(idx)?.to_int();
                self.set_field(i, val)
            }
            Expr::Index(_, bind, keys) => {
                let key = self.join_subsep(keys)?;
                let map = self.resolve_map(bind.get().expect("resolved"))?;
                map.borrow_mut().put(&key, val);
                Ok(())
            }
            Expr::Group(inner) => self.assign_lvalue(inner, val),
            _ => Err(Error::new(ErrorKind::LValue, Position::NONE).into()),
        }
    }

    // --- expressions --------------------------------------------------------

    fn eval_expr(&mut self, expr: &Expr) -> Flow<Value> {
        match expr {
            Expr::IntLit(n) => Ok(Value::new_int(*n)),
            Expr::FltLit(f) => Ok(Value::new_flt(*f)),
            Expr::StrLit(s) => Ok(Value::new_str(s.as_str())),
            Expr::RegexLit(_, slot) => {
                let idx = slot.get().expect("regex literal resolved by linker");
                let m = self.program.regexes[idx].is_match(&self.record0());
                Ok(Value::new_int(m as i64))
            }
            Expr::Var(_, bind, _) => Ok(self.binding_slot(bind.get().expect("resolved")).borrow().clone()),
            Expr::Field(idx) => {
                let i = self.eval_expr(idx)?.to_int();
                Ok(Value::new_input_str(self.fields.get(i)))
            }
            Expr::Index(_, bind, keys) => {
                let key = self.join_subsep(keys)?;
                let map = self.resolve_map(bind.get().expect("resolved"))?;
                let existing = map.borrow().get(&key).cloned();
                match existing {
                    Some(v) => Ok(v),
                    None => {
                        // reading a missing key auto-vivifies it (spec.md §4.5)
                        map.borrow_mut().put(&key, Value::Nil);
                        Ok(Value::Nil)
                    }
                }
            }
            Expr::Grouping(items) => {
                let mut last = Value::Nil;
                for it in items {
                    last = self.eval_expr(it)?;
                }
                Ok(last)
            }
            Expr::Assign(lhs, op, rhs, pos) => self.eval_assign(lhs, *op, rhs, *pos),
            Expr::PreIncr(e) => {
                let v = numeric_value(self.eval_expr(e)?.to_flt() + 1.0);
                self.assign_lvalue(e, v.clone())?;
                Ok(v)
            }
            Expr::PreDecr(e) => {
                let v = numeric_value(self.eval_expr(e)?.to_flt() - 1.0);
                self.assign_lvalue(e, v.clone())?;
                Ok(v)
            }
            Expr::PostIncr(e) => {
                let old = numeric_value(self.eval_expr(e)?.to_flt());
                let new = numeric_value(old.to_flt() + 1.0);
                self.assign_lvalue(e, new)?;
                Ok(old)
            }
            Expr::PostDecr(e) => {
                let old = numeric_value(self.eval_expr(e)?.to_flt());
                let new = numeric_value(old.to_flt() - 1.0);
                self.assign_lvalue(e, new)?;
                Ok(old)
            }
            Expr::Binary(op, a, b, pos) => {
                let av = self.eval_expr(a)?;
                let bv = self.eval_expr(b)?;
                self.eval_binop(*op, &av, &bv, *pos)
            }
            Expr::Unary(op, e) => {
                let v = self.eval_expr(e)?;
                Ok(match op {
                    UnOp::Neg => numeric_value(-v.to_flt()),
                    UnOp::Pos => numeric_value(v.to_flt()),
                    UnOp::Not => Value::new_int(!v.to_bool() as i64),
                })
            }
            Expr::Concat(a, b) => {
                let convfmt = self.convfmt();
                let a_s = self.eval_expr(a)?.to_str_fmt(&convfmt);
                let b_s = self.eval_expr(b)?.to_str_fmt(&convfmt);
                Ok(Value::new_str(a_s.concat(b_s.as_str())))
            }
            Expr::And(a, b) => {
                if !self.eval_expr(a)?.to_bool() {
                    return Ok(Value::new_int(0));
                }
                Ok(Value::new_int(self.eval_expr(b)?.to_bool() as i64))
            }
            Expr::Or(a, b) => {
                if self.eval_expr(a)?.to_bool() {
                    return Ok(Value::new_int(1));
                }
                Ok(Value::new_int(self.eval_expr(b)?.to_bool() as i64))
            }
            Expr::Ternary(c, t, f) => {
                if self.eval_expr(c)?.to_bool() {
                    self.eval_expr(t)
                } else {
                    self.eval_expr(f)
                }
            }
            Expr::Match(a, b, neg) => {
                let convfmt = self.convfmt();
                let text = self.eval_expr(a)?.to_str_fmt(&convfmt).to_string();
                let re = self.eval_regex(b)?;
                let icase = self.global_bool(slot::IGNORECASE);
                let m = re.active(icase).is_match(&text);
                Ok(Value::new_int((m != *neg) as i64))
            }
            Expr::In(keys, _name, bind) => {
                let key = self.join_subsep(keys)?;
                let map = self.resolve_map(bind.get().expect("resolved"))?;
                let present = map.borrow().contains(&key);
                Ok(Value::new_int(present as i64))
            }
            Expr::Call(_, args, target, pos) => match target.get().expect("resolved") {
                CallTarget::User(i) => self.call_user_function(i, args, *pos),
                CallTarget::Intrinsic(i) => self.call_intrinsic(i, args, *pos),
            },
            Expr::Getline(form, pos) => self.eval_getline(form, *pos),
            Expr::Group(e) => self.eval_expr(e),
        }
    }

    fn eval_assign(&mut self, lhs: &Expr, op: AssignOp, rhs: &Expr, pos: Position) -> Flow<Value> {
        let rhs_val = self.eval_expr(rhs)?;
        let new_val = if op == AssignOp::Assign {
            rhs_val
        } else {
            let cur = self.eval_expr(lhs)?;
            let a = cur.to_flt();
            let b = rhs_val.to_flt();
            let r = match op {
                AssignOp::Add => a + b,
                AssignOp::Sub => a - b,
                AssignOp::Mul => a * b,
                AssignOp::Div => {
                    if b == 0.0 {
                        return Err(Error::new(ErrorKind::DivBy0, pos).into());
                    }
                    a / b
                }
                AssignOp::Mod => {
                    if b == 0.0 {
                        return Err(Error::new(ErrorKind::DivBy0, pos).into());
                    }
                    a % b
                }
                AssignOp::Pow => a.powf(b),
                AssignOp::Assign => unreachable!(),
            };
            numeric_value(r)
        };
        self.assign_lvalue(lhs, new_val.clone())?;
        Ok(new_val)
    }

    fn eval_binop(&self, op: BinOp, a: &Value, b: &Value, pos: Position) -> Flow<Value> {
        use std::cmp::Ordering;
        Ok(match op {
            BinOp::Add => numeric_value(a.to_flt() + b.to_flt()),
            BinOp::Sub => numeric_value(a.to_flt() - b.to_flt()),
            BinOp::Mul => numeric_value(a.to_flt() * b.to_flt()),
            BinOp::Div => {
                let d = b.to_flt();
                if d == 0.0 {
                    return Err(Error::new(ErrorKind::DivBy0, pos).into());
                }
                numeric_value(a.to_flt() / d)
            }
            BinOp::Mod => {
                let d = b.to_flt();
                if d == 0.0 {
                    return Err(Error::new(ErrorKind::DivBy0, pos).into());
                }
                numeric_value(a.to_flt() % d)
            }
            BinOp::Pow => numeric_value(a.to_flt().powf(b.to_flt())),
            BinOp::Lt => Value::new_int((a.cmp(b) == Ordering::Less) as i64),
            BinOp::Le => Value::new_int((a.cmp(b) != Ordering::Greater) as i64),
            BinOp::Gt => Value::new_int((a.cmp(b) == Ordering::Greater) as i64),
            BinOp::Ge => Value::new_int((a.cmp(b) != Ordering::Less) as i64),
            BinOp::Eq => Value::new_int((a.cmp(b) == Ordering::Equal) as i64),
            BinOp::Ne => Value::new_int((a.cmp(b) != Ordering::Equal) as i64),
        })
    }

    /// Resolves an expression used where a regex is expected: a `/re/`
    /// literal reuses the linker's precompiled (always case-sensitive)
    /// pattern; anything else is stringified and compiled fresh, both
    /// case-sensitive and case-insensitive, so `IGNORECASE` can pick
    /// between them at match time (spec.md §4.6; static literals not
    /// honoring a runtime `IGNORECASE` toggle is a documented limitation,
    /// see `DESIGN.md`).
    fn eval_regex(&mut self, e: &Expr) -> Flow<RegexRef<'p>> {
        if let Expr::RegexLit(_, slot) = e {
            let idx = slot.get().expect("regex literal resolved by linker");
            return Ok(RegexRef::Static(&self.program.regexes[idx]));
        }
        match self.eval_expr(e)? {
            Value::Regex(rv) => Ok(RegexRef::Dynamic(rv)),
            other => {
                let convfmt = self.convfmt();
                let pattern = other.to_str_fmt(&convfmt).to_string();
                Ok(RegexRef::Dynamic(self.compile_dynamic_regex(&pattern)?))
            }
        }
    }

    // --- function calls -----------------------------------------------------

    fn call_user_function(&mut self, idx: usize, args: &[Expr], pos: Position) -> Flow<Value> {
        if self.call_depth >= self.settings.max_call_depth() {
            return Err(Error::new(ErrorKind::Recursion, pos).into());
        }
        let program = self.program;
        let func = &program.function_bodies[idx];
        let param_is_map = {
            let flags = func.param_is_map.take();
            func.param_is_map.set(flags.clone());
            flags
        };
        let mut params = Vec::with_capacity(func.params.len());
        for i in 0..func.params.len() {
            let is_map = param_is_map.get(i).copied().unwrap_or(false);
            let value = match args.get(i) {
                Some(arg_expr) if is_map => {
                    let bind = match arg_expr {
                        Expr::Var(_, b, _) => b.get().expect("resolved"),
                        _ => return Err(Error::new(ErrorKind::BadArg, pos).into()),
                    };
                    Value::Map(self.resolve_map(bind)?)
                }
                Some(arg_expr) => self.eval_expr(arg_expr)?,
                None => Value::Nil,
            };
            params.push(Rc::new(RefCell::new(value)));
        }
        self.frames.push(Frame { params });
        self.call_depth += 1;
        let result = self.exec_stmts(&func.body);
        self.call_depth -= 1;
        self.frames.pop();
        match result {
            Ok(()) => Ok(Value::Nil),
            Err(Signal::Return(v)) => Ok(v),
            Err(other) => Err(other),
        }
    }

    fn call_intrinsic(&mut self, idx: usize, args: &[Expr], pos: Position) -> Flow<Value> {
        match intrinsics::INTRINSICS[idx].kind {
            IntrinsicKind::Simple => {
                let mut vals = Vec::with_capacity(args.len());
                for a in args {
                    vals.push(self.eval_expr(a)?);
                }
                Ok(intrinsics::call(idx, &vals, self)?)
            }
            IntrinsicKind::Split => self.call_split(args, true),
            IntrinsicKind::SplitA => self.call_split(args, false),
            IntrinsicKind::Sub => self.call_sub_gsub(args, false),
            IntrinsicKind::Gsub => self.call_sub_gsub(args, true),
            IntrinsicKind::Match => self.call_match(args),
            IntrinsicKind::Close => self.call_close(args),
            IntrinsicKind::Fflush => self.call_fflush(args),
        }
    }

    fn array_arg_binding(&self, e: &Expr, pos: Position) -> Flow<Binding> {
        match e {
            Expr::Var(_, bind, _) => Ok(bind.get().expect("resolved")),
            _ => Err(Error::new(ErrorKind::BadArg, pos).into()),
        }
    }

    /// `split`/`splita(s, arr[, fs])`: clears `arr`, splits `s`, returns the
    /// element count. `numeric` selects whether elements are re-detected as
    /// NumericStr (`split`) or stored as plain strings (`splita`'s "preserve
    /// separators" contract, see `DESIGN.md`).
    fn call_split(&mut self, args: &[Expr], numeric: bool) -> Flow<Value> {
        let convfmt = self.convfmt();
        let s = self.eval_expr(&args[0])?.to_str_fmt(&convfmt).to_string();
        let bind = self.array_arg_binding(&args[1], Position::NONE)?;
        let map = self.resolve_map(bind)?;
        let fs = match args.get(2) {
            Some(fe) => {
                let v = self.eval_expr(fe)?;
                fields::fs_from_value(&v)
            }
            None => self.current_fs(),
        };
        let icase = self.global_bool(slot::IGNORECASE);
        let parts = fields::split_fields(&s, &fs, icase);
        let count = parts.len();
        let mut m = map.borrow_mut();
        m.clear();
        for (i, p) in parts.into_iter().enumerate() {
            let v = if numeric { Value::new_input_str(p) } else { Value::new_str(p) };
            m.put(&(i + 1).to_string(), v);
        }
        Ok(Value::new_int(count as i64))
    }

    fn call_sub_gsub(&mut self, args: &[Expr], global: bool) -> Flow<Value> {
        let convfmt = self.convfmt();
        let re = self.eval_regex(&args[0])?;
        let repl = self.eval_expr(&args[1])?.to_str_fmt(&convfmt).to_string();
        let target_expr = args.get(2);
        let subject = match target_expr {
            Some(e) => self.eval_expr(e)?.to_str_fmt(&convfmt).to_string(),
            None => self.record0(),
        };
        let icase = self.global_bool(slot::IGNORECASE);
        let compiled = re.active(icase);
        let (new_s, count) = if global {
            intrinsics::pattern::gsub_all(compiled, &repl, &subject)
        } else {
            intrinsics::pattern::sub_once(compiled, &repl, &subject)
        };
        if count > 0 {
            match target_expr {
                Some(e) => self.assign_lvalue(e, Value::new_str(new_s))?,
                None => self.set_field(0, Value::new_str(new_s))?,
            }
        }
        Ok(Value::new_int(count))
    }

    fn call_match(&mut self, args: &[Expr]) -> Flow<Value> {
        let convfmt = self.convfmt();
        let s = self.eval_expr(&args[0])?.to_str_fmt(&convfmt).to_string();
        let re = self.eval_regex(&args[1])?;
        let icase = self.global_bool(slot::IGNORECASE);
        match intrinsics::pattern::do_match(re.active(icase), &s) {
            Some((start, len)) => {
                self.set_global_int(slot::RSTART, start);
                self.set_global_int(slot::RLENGTH, len);
                Ok(Value::new_int(start))
            }
            None => {
                self.set_global_int(slot::RSTART, 0);
                self.set_global_int(slot::RLENGTH, -1);
                Ok(Value::new_int(0))
            }
        }
    }

    fn call_close(&mut self, args: &[Expr]) -> Flow<Value> {
        let convfmt = self.convfmt();
        let name = self.eval_expr(&args[0])?.to_str_fmt(&convfmt).to_string();
        match self.streams.close(self.host, &name) {
            None => Ok(Value::new_int(-1)),
            Some(Ok(())) => Ok(Value::new_int(0)),
            Some(Err(_)) => Ok(Value::new_int(-1)),
        }
    }

    fn call_fflush(&mut self, args: &[Expr]) -> Flow<Value> {
        match args.first() {
            None => {
                // IoHost has no standalone console-flush method; flushing
                // every named stream is the full extent of fflush() with
                // no argument that the capability interface can express.
                self.streams.flush_all(self.host)?;
                Ok(Value::new_int(0))
            }
            Some(e) => {
                let convfmt = self.convfmt();
                let name = self.eval_expr(e)?.to_str_fmt(&convfmt).to_string();
                match self.streams.flush(self.host, &name) {
                    Ok(()) => Ok(Value::new_int(0)),
                    Err(_) => Ok(Value::new_int(-1)),
                }
            }
        }
    }

    // --- getline ------------------------------------------------------------

    /// getline reports I/O failure through its return value (-1), never as
    /// an abort (spec.md §4.5); any other signal (e.g. a nested function
    /// call's `exit`) still propagates normally.
    fn eval_getline(&mut self, form: &GetlineForm, _pos: Position) -> Flow<Value> {
        let result = match form {
            GetlineForm::Simple { target } => match self.next_record()? {
                None => Ok(Value::new_int(0)),
                Some(line) => {
                    match target {
                        None => self.set_record(&line),
                        Some(t) => self.assign_lvalue(t, Value::new_input_str(line))?,
                    }
                    Ok(Value::new_int(1))
                }
            },
            GetlineForm::FromFile { target, file } => {
                let convfmt = self.convfmt();
                let name = self.eval_expr(file)?.to_str_fmt(&convfmt).to_string();
                self.getline_named(&name, StreamKind::File, OpenMode::Read, target, false)
            }
            GetlineForm::FromPipe { target, cmd } | GetlineForm::FromCoproc { target, cmd } => {
                let convfmt = self.convfmt();
                let name = self.eval_expr(cmd)?.to_str_fmt(&convfmt).to_string();
                self.getline_named(&name, StreamKind::Pipe, OpenMode::Read, target, true)
            }
        };
        match result {
            Err(Signal::Error(err)) if err.kind == ErrorKind::Io => Ok(Value::new_int(-1)),
            other => other,
        }
    }

    fn getline_named(
        &mut self,
        name: &str,
        kind: StreamKind,
        mode: OpenMode,
        target: &Option<Box<Expr>>,
        bump_nr: bool,
    ) -> Flow<Value> {
        if !self.streams.is_open(name) {
            match self.streams.open(self.host, name, kind, mode)? {
                OpenOutcome::Error => return Ok(Value::new_int(-1)),
                OpenOutcome::ImmediateEof => return Ok(Value::new_int(0)),
                OpenOutcome::Ready => {}
            }
        }
        match self.streams.read_line(self.host, name)? {
            None => Ok(Value::new_int(0)),
            Some(line) => {
                if bump_nr {
                    self.bump_nr_only();
                }
                match target {
                    None => self.set_record(&line),
                    Some(t) => self.assign_lvalue(t, Value::new_input_str(line))?,
                }
                Ok(Value::new_int(1))
            }
        }
    }
}

impl intrinsics::Host for Interpreter<'_, '_> {
    fn convfmt(&self) -> String {
        self.global_str(slot::CONVFMT)
    }

    fn compile_dynamic_regex(&mut self, pattern: &str) -> Result<Rc<RegexValue>, Error> {
        let primary = CompiledRegex::compile(pattern, false)
            .map_err(|e| Error::with_detail(ErrorKind::RexBl, e.to_string(), Position::NONE))?;
        let icase = CompiledRegex::compile(pattern, true)
            .map_err(|e| Error::with_detail(ErrorKind::RexBl, e.to_string(), Position::NONE))?;
        Ok(Rc::new(RegexValue { primary, icase: Some(icase) }))
    }
}
