//! Recursive-descent parser (spec.md §4.3): consumes the token stream and
//! builds a [`ParsedProgram`]. Name *resolution* happens afterwards in
//! [`crate::compile`]; this module only assembles the tree and tracks
//! function arities so forward calls within one parse unit can be checked.

use crate::ast::*;
use crate::error::{Error, ErrorKind, Position};
use crate::lexer::{Tok, Token};

pub struct Parser {
    toks: Vec<Token>,
    pos: usize,
    suppress_gt: bool,
    func_arities: std::collections::HashMap<String, usize>,
}

type PResult<T> = Result<T, Error>;

/// Tokens after which a following bare newline is insignificant
/// whitespace rather than a statement terminator (spec.md §4.2).
fn continues_after(tok: &Tok) -> bool {
    matches!(
        tok,
        Tok::LBrace
            | Tok::LParen
            | Tok::LBracket
            | Tok::Comma
            | Tok::Semi
            | Tok::AndAnd
            | Tok::OrOr
            | Tok::Do
            | Tok::Else
            | Tok::Question
            | Tok::Colon
            | Tok::Assign
            | Tok::AddAssign
            | Tok::SubAssign
            | Tok::MulAssign
            | Tok::DivAssign
            | Tok::ModAssign
            | Tok::PowAssign
            | Tok::Pipe
            | Tok::PipeAmp
    )
}

impl Parser {
    #[must_use]
    pub fn new(toks: Vec<Token>) -> Self {
        Self {
            toks,
            pos: 0,
            suppress_gt: false,
            func_arities: Default::default(),
        }
    }

    fn cur(&self) -> &Tok {
        &self.toks[self.pos].tok
    }
    fn cur_pos(&self) -> Position {
        self.toks[self.pos].pos
    }
    fn advance(&mut self) -> Tok {
        let t = self.toks[self.pos].tok.clone();
        if self.pos + 1 < self.toks.len() {
            self.pos += 1;
        }
        if continues_after(&t) {
            self.skip_newlines();
        }
        t
    }
    fn skip_newlines(&mut self) {
        while matches!(self.cur(), Tok::Newline) {
            self.pos += 1;
        }
    }
    /// Skip statement terminators (newline and `;`), for between top-level
    /// items and at the top of blocks.
    fn skip_terminators(&mut self) {
        while matches!(self.cur(), Tok::Newline | Tok::Semi) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, tok: &Tok, kind: ErrorKind) -> PResult<()> {
        if self.cur() == tok {
            self.advance();
            Ok(())
        } else {
            Err(Error::new(kind, self.cur_pos()))
        }
    }

    fn expect_ident(&mut self) -> PResult<String> {
        match self.cur().clone() {
            Tok::Ident(s) => {
                self.advance();
                Ok(s)
            }
            Tok::FuncName(s) => {
                self.advance();
                Ok(s)
            }
            _ => Err(Error::new(ErrorKind::Ident, self.cur_pos())),
        }
    }

    fn at_end_of_statement(&self) -> bool {
        matches!(self.cur(), Tok::Semi | Tok::Newline | Tok::RBrace | Tok::Eof)
    }

    fn end_statement(&mut self) -> PResult<()> {
        match self.cur() {
            Tok::Semi | Tok::Newline => {
                self.advance();
                self.skip_terminators();
                Ok(())
            }
            Tok::RBrace | Tok::Eof => Ok(()),
            _ => Err(Error::new(ErrorKind::SColon, self.cur_pos())),
        }
    }

    // ---- top level ----------------------------------------------------

    pub fn parse_program(mut self) -> PResult<ParsedProgram> {
        let mut prog = ParsedProgram::default();
        self.skip_terminators();
        while !matches!(self.cur(), Tok::Eof) {
            match self.cur().clone() {
                Tok::Begin => {
                    self.advance();
                    self.skip_newlines();
                    prog.begin.push(self.parse_block_stmts()?);
                }
                Tok::End => {
                    self.advance();
                    self.skip_newlines();
                    prog.end.push(self.parse_block_stmts()?);
                }
                Tok::Function => {
                    let f = self.parse_function()?;
                    prog.functions.push(f);
                }
                Tok::Global => {
                    self.advance();
                    loop {
                        self.expect_ident()?;
                        if matches!(self.cur(), Tok::Comma) {
                            self.advance();
                        } else {
                            break;
                        }
                    }
                    self.end_statement()?;
                }
                _ => {
                    let rule = self.parse_rule()?;
                    prog.rules.push(rule);
                }
            }
            self.skip_terminators();
        }
        Ok(prog)
    }

    fn parse_function(&mut self) -> PResult<FunctionDecl> {
        let pos = self.cur_pos();
        self.advance(); // 'function'
        let name = self.expect_ident()?;
        self.expect(&Tok::LParen, ErrorKind::LParen)?;
        let mut params = Vec::new();
        if !matches!(self.cur(), Tok::RParen) {
            loop {
                params.push(self.expect_ident()?);
                if matches!(self.cur(), Tok::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(&Tok::RParen, ErrorKind::RParen)?;
        self.skip_newlines();
        if self.func_arities.contains_key(&name) {
            return Err(Error::new(ErrorKind::Fid, pos));
        }
        self.func_arities.insert(name.clone(), params.len());
        let body = self.parse_block_stmts()?;
        let nparams = params.len();
        Ok(FunctionDecl {
            name,
            params,
            body,
            pos,
            param_is_map: std::cell::Cell::new(vec![false; nparams]),
        })
    }

    fn parse_rule(&mut self) -> PResult<Rule> {
        let pattern = if matches!(self.cur(), Tok::LBrace) {
            Pattern::Always
        } else {
            let first = self.parse_expr()?;
            if matches!(self.cur(), Tok::Comma) {
                self.advance();
                self.skip_newlines();
                let second = self.parse_expr()?;
                Pattern::Range(first, second)
            } else if let Expr::RegexLit(s, idx) = first {
                Pattern::Regex(s, idx)
            } else {
                Pattern::Expr(first)
            }
        };
        self.skip_newlines();
        let action = if matches!(self.cur(), Tok::LBrace) {
            Some(self.parse_block_stmts()?)
        } else {
            None
        };
        Ok(Rule { pattern, action })
    }

    fn parse_block_stmts(&mut self) -> PResult<Vec<Stmt>> {
        self.expect(&Tok::LBrace, ErrorKind::LBrace)?;
        self.skip_terminators();
        let mut stmts = Vec::new();
        while !matches!(self.cur(), Tok::RBrace | Tok::Eof) {
            stmts.push(self.parse_stmt()?);
            self.skip_terminators();
        }
        self.expect(&Tok::RBrace, ErrorKind::RBrace)?;
        Ok(stmts)
    }

    // ---- statements -----------------------------------------------------

    fn parse_stmt(&mut self) -> PResult<Stmt> {
        match self.cur().clone() {
            Tok::LBrace => Ok(Stmt::Block(self.parse_block_stmts()?)),
            Tok::Semi => {
                self.advance();
                Ok(Stmt::Empty)
            }
            Tok::If => self.parse_if(),
            Tok::While => self.parse_while(),
            Tok::Do => self.parse_do_while(),
            Tok::For => self.parse_for(),
            Tok::Break => {
                let p = self.cur_pos();
                self.advance();
                self.end_statement()?;
                Ok(Stmt::Break(p))
            }
            Tok::Continue => {
                let p = self.cur_pos();
                self.advance();
                self.end_statement()?;
                Ok(Stmt::Continue(p))
            }
            Tok::Next => {
                let p = self.cur_pos();
                self.advance();
                self.end_statement()?;
                Ok(Stmt::Next(p))
            }
            Tok::NextFile => {
                let p = self.cur_pos();
                self.advance();
                self.end_statement()?;
                Ok(Stmt::NextFile(p))
            }
            Tok::Exit => {
                self.advance();
                let e = if self.at_end_of_statement() {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                self.end_statement()?;
                Ok(Stmt::Exit(e))
            }
            Tok::Return => {
                let p = self.cur_pos();
                self.advance();
                let e = if self.at_end_of_statement() {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                self.end_statement()?;
                Ok(Stmt::Return(e, p))
            }
            Tok::Delete => {
                self.advance();
                let name = self.expect_ident()?;
                let mut keys = Vec::new();
                if matches!(self.cur(), Tok::LBracket) {
                    self.advance();
                    loop {
                        keys.push(self.parse_expr()?);
                        if matches!(self.cur(), Tok::Comma) {
                            self.advance();
                        } else {
                            break;
                        }
                    }
                    self.expect(&Tok::RBracket, ErrorKind::RBrack)?;
                }
                self.end_statement()?;
                Ok(Stmt::Delete(name, Resolved::new(), keys))
            }
            Tok::Print => {
                self.advance();
                let (args, redir) = self.parse_print_args()?;
                self.end_statement()?;
                Ok(Stmt::Print(args, redir))
            }
            Tok::Printf => {
                self.advance();
                let (args, redir) = self.parse_print_args()?;
                self.end_statement()?;
                Ok(Stmt::Printf(args, redir))
            }
            _ => {
                let e = self.parse_expr()?;
                self.end_statement()?;
                Ok(Stmt::Expr(e))
            }
        }
    }

    fn parse_if(&mut self) -> PResult<Stmt> {
        self.advance();
        self.expect(&Tok::LParen, ErrorKind::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(&Tok::RParen, ErrorKind::RParen)?;
        self.skip_newlines();
        let then_branch = Box::new(self.parse_stmt()?);
        let save = self.pos;
        self.skip_terminators();
        let else_branch = if matches!(self.cur(), Tok::Else) {
            self.advance();
            self.skip_newlines();
            Some(Box::new(self.parse_stmt()?))
        } else {
            self.pos = save;
            None
        };
        Ok(Stmt::If(cond, then_branch, else_branch))
    }

    fn parse_while(&mut self) -> PResult<Stmt> {
        self.advance();
        self.expect(&Tok::LParen, ErrorKind::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(&Tok::RParen, ErrorKind::RParen)?;
        self.skip_newlines();
        let body = Box::new(self.parse_stmt()?);
        Ok(Stmt::While(cond, body))
    }

    fn parse_do_while(&mut self) -> PResult<Stmt> {
        self.advance();
        self.skip_newlines();
        let body = Box::new(self.parse_stmt()?);
        self.skip_terminators();
        self.expect(&Tok::While, ErrorKind::Keyword)?;
        self.expect(&Tok::LParen, ErrorKind::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(&Tok::RParen, ErrorKind::RParen)?;
        self.end_statement()?;
        Ok(Stmt::DoWhile(body, cond))
    }

    fn parse_for(&mut self) -> PResult<Stmt> {
        self.advance();
        self.expect(&Tok::LParen, ErrorKind::LParen)?;
        // Disambiguate `for (k in arr)` from `for (init; cond; post)`.
        if let Tok::Ident(name) = self.cur().clone() {
            if matches!(self.toks[self.pos + 1].tok, Tok::In) {
                self.advance();
                self.advance();
                let arr = self.expect_ident()?;
                self.expect(&Tok::RParen, ErrorKind::RParen)?;
                self.skip_newlines();
                let body = Box::new(self.parse_stmt()?);
                return Ok(Stmt::ForIn(name, Resolved::new(), arr, Resolved::new(), body));
            }
        }
        let init = if matches!(self.cur(), Tok::Semi) {
            None
        } else {
            Some(Box::new(self.parse_simple_for_stmt()?))
        };
        self.expect(&Tok::Semi, ErrorKind::SColon)?;
        self.skip_newlines();
        let cond = if matches!(self.cur(), Tok::Semi) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(&Tok::Semi, ErrorKind::SColon)?;
        self.skip_newlines();
        let post = if matches!(self.cur(), Tok::RParen) {
            None
        } else {
            Some(Box::new(self.parse_simple_for_stmt()?))
        };
        self.expect(&Tok::RParen, ErrorKind::RParen)?;
        self.skip_newlines();
        let body = Box::new(self.parse_stmt()?);
        Ok(Stmt::For(init, cond, post, body))
    }

    fn parse_simple_for_stmt(&mut self) -> PResult<Stmt> {
        let e = self.parse_expr()?;
        Ok(Stmt::Expr(e))
    }

    /// `>` inside a `print`/`printf` argument list means redirection unless
    /// parenthesized (spec.md §4.3); suppressed via `suppress_gt` while
    /// parsing the argument list itself.
    fn parse_print_args(&mut self) -> PResult<(Vec<Expr>, Option<Redirect>)> {
        let mut args = Vec::new();
        if !self.at_end_of_statement()
            && !matches!(self.cur(), Tok::Gt | Tok::Append | Tok::Pipe | Tok::PipeAmp)
        {
            let save = self.suppress_gt;
            self.suppress_gt = true;
            loop {
                args.push(self.parse_ternary()?);
                if matches!(self.cur(), Tok::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
            self.suppress_gt = save;
        }
        let redir = match self.cur() {
            Tok::Gt => {
                self.advance();
                Some(Redirect::File(self.parse_ternary()?))
            }
            Tok::Append => {
                self.advance();
                Some(Redirect::Append(self.parse_ternary()?))
            }
            Tok::Pipe => {
                self.advance();
                Some(Redirect::Pipe(self.parse_ternary()?))
            }
            Tok::PipeAmp => {
                self.advance();
                Some(Redirect::Coproc(self.parse_ternary()?))
            }
            _ => None,
        };
        Ok((args, redir))
    }

    // ---- expressions, by precedence (spec.md §4.3) ----------------------

    pub fn parse_expr(&mut self) -> PResult<Expr> {
        self.parse_assignment()
    }

    fn is_lvalue(e: &Expr) -> bool {
        matches!(e, Expr::Var(..) | Expr::Field(_) | Expr::Index(..))
    }

    fn parse_assignment(&mut self) -> PResult<Expr> {
        let lhs = self.parse_ternary()?;
        let op = match self.cur() {
            Tok::Assign => Some(AssignOp::Assign),
            Tok::AddAssign => Some(AssignOp::Add),
            Tok::SubAssign => Some(AssignOp::Sub),
            Tok::MulAssign => Some(AssignOp::Mul),
            Tok::DivAssign => Some(AssignOp::Div),
            Tok::ModAssign => Some(AssignOp::Mod),
            Tok::PowAssign => Some(AssignOp::Pow),
            _ => None,
        };
        if let Some(op) = op {
            let pos = self.cur_pos();
            if !Self::is_lvalue(&lhs) {
                return Err(Error::new(ErrorKind::LValue, pos));
            }
            self.advance();
            let rhs = self.parse_assignment()?; // right-assoc
            return Ok(Expr::Assign(Box::new(lhs), op, Box::new(rhs), pos));
        }
        Ok(lhs)
    }

    fn parse_ternary(&mut self) -> PResult<Expr> {
        let cond = self.parse_or()?;
        if matches!(self.cur(), Tok::Question) {
            self.advance();
            let t = self.parse_ternary()?;
            self.expect(&Tok::Colon, ErrorKind::Colon)?;
            let f = self.parse_ternary()?;
            Ok(Expr::Ternary(Box::new(cond), Box::new(t), Box::new(f)))
        } else {
            Ok(cond)
        }
    }

    fn parse_or(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_and()?;
        while matches!(self.cur(), Tok::OrOr) {
            self.advance();
            let rhs = self.parse_and()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_in()?;
        while matches!(self.cur(), Tok::AndAnd) {
            self.advance();
            let rhs = self.parse_in()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_in(&mut self) -> PResult<Expr> {
        let lhs = self.parse_match()?;
        if matches!(self.cur(), Tok::In) {
            self.advance();
            let arr = self.expect_ident()?;
            let keys = match lhs {
                Expr::Grouping(es) => es,
                other => vec![other],
            };
            Ok(Expr::In(keys, arr, Resolved::new()))
        } else {
            Ok(lhs)
        }
    }

    fn parse_match(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_equality()?;
        loop {
            let neg = match self.cur() {
                Tok::Match => false,
                Tok::NotMatch => true,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_equality()?;
            lhs = Expr::Match(Box::new(lhs), Box::new(rhs), neg);
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> PResult<Expr> {
        let lhs = self.parse_relational()?;
        let op = match self.cur() {
            Tok::Eq => Some(BinOp::Eq),
            Tok::Ne => Some(BinOp::Ne),
            _ => None,
        };
        if let Some(op) = op {
            let pos = self.cur_pos();
            self.advance();
            let rhs = self.parse_relational()?;
            return Ok(Expr::Binary(op, Box::new(lhs), Box::new(rhs), pos));
        }
        Ok(lhs)
    }

    fn parse_relational(&mut self) -> PResult<Expr> {
        let lhs = self.parse_concat()?;
        let op = match self.cur() {
            Tok::Lt => Some(BinOp::Lt),
            Tok::Le => Some(BinOp::Le),
            Tok::Ge => Some(BinOp::Ge),
            Tok::Gt if !self.suppress_gt => Some(BinOp::Gt),
            _ => None,
        };
        if let Some(op) = op {
            let pos = self.cur_pos();
            self.advance();
            let rhs = self.parse_concat()?;
            return Ok(Expr::Binary(op, Box::new(lhs), Box::new(rhs), pos));
        }
        Ok(lhs)
    }

    fn starts_primary(&self) -> bool {
        matches!(
            self.cur(),
            Tok::Int(_)
                | Tok::Flt(_)
                | Tok::Str(_)
                | Tok::Regex(_)
                | Tok::Ident(_)
                | Tok::FuncName(_)
                | Tok::Dollar
                | Tok::Not
                | Tok::Minus
                | Tok::Plus
                | Tok::LParen
                | Tok::Incr
                | Tok::Decr
                | Tok::Getline
        )
    }

    fn parse_concat(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_getline_pipe()?;
        while self.starts_primary() {
            let rhs = self.parse_getline_pipe()?;
            lhs = Expr::Concat(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_getline_pipe(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_additive()?;
        while matches!(self.cur(), Tok::Pipe) && matches!(self.toks[self.pos + 1].tok, Tok::Getline)
        {
            let pos = self.cur_pos();
            self.advance(); // |
            self.advance(); // getline
            let target = self.parse_optional_getline_target()?;
            lhs = Expr::Getline(
                GetlineForm::FromPipe {
                    target,
                    cmd: Box::new(lhs),
                },
                pos,
            );
        }
        Ok(lhs)
    }

    fn parse_optional_getline_target(&mut self) -> PResult<Option<Box<Expr>>> {
        match self.cur() {
            Tok::Ident(_) | Tok::Dollar => {
                let e = self.parse_postfix()?;
                if Self::is_lvalue(&e) {
                    Ok(Some(Box::new(e)))
                } else {
                    Ok(None)
                }
            }
            _ => Ok(None),
        }
    }

    fn parse_additive(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.cur() {
                Tok::Plus => BinOp::Add,
                Tok::Minus => BinOp::Sub,
                _ => break,
            };
            let pos = self.cur_pos();
            self.advance();
            let rhs = self.parse_multiplicative()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs), pos);
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_exponent()?;
        loop {
            let op = match self.cur() {
                Tok::Star => BinOp::Mul,
                Tok::Slash => BinOp::Div,
                Tok::Percent => BinOp::Mod,
                _ => break,
            };
            let pos = self.cur_pos();
            self.advance();
            let rhs = self.parse_exponent()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs), pos);
        }
        Ok(lhs)
    }

    fn parse_exponent(&mut self) -> PResult<Expr> {
        let lhs = self.parse_unary()?;
        if matches!(self.cur(), Tok::Caret | Tok::StarStar) {
            let pos = self.cur_pos();
            self.advance();
            let rhs = self.parse_exponent()?; // right-assoc
            Ok(Expr::Binary(BinOp::Pow, Box::new(lhs), Box::new(rhs), pos))
        } else {
            Ok(lhs)
        }
    }

    fn parse_unary(&mut self) -> PResult<Expr> {
        match self.cur() {
            Tok::Not => {
                self.advance();
                Ok(Expr::Unary(UnOp::Not, Box::new(self.parse_unary()?)))
            }
            Tok::Minus => {
                self.advance();
                Ok(Expr::Unary(UnOp::Neg, Box::new(self.parse_unary()?)))
            }
            Tok::Plus => {
                self.advance();
                Ok(Expr::Unary(UnOp::Pos, Box::new(self.parse_unary()?)))
            }
            Tok::Incr => {
                self.advance();
                Ok(Expr::PreIncr(Box::new(self.parse_unary()?)))
            }
            Tok::Decr => {
                self.advance();
                Ok(Expr::PreDecr(Box::new(self.parse_unary()?)))
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> PResult<Expr> {
        let mut e = self.parse_primary()?;
        loop {
            match self.cur() {
                Tok::Incr if Self::is_lvalue(&e) => {
                    self.advance();
                    e = Expr::PostIncr(Box::new(e));
                }
                Tok::Decr if Self::is_lvalue(&e) => {
                    self.advance();
                    e = Expr::PostDecr(Box::new(e));
                }
                _ => break,
            }
        }
        Ok(e)
    }

    fn parse_primary(&mut self) -> PResult<Expr> {
        let pos = self.cur_pos();
        match self.cur().clone() {
            Tok::Int(i) => {
                self.advance();
                Ok(Expr::IntLit(i))
            }
            Tok::Flt(f) => {
                self.advance();
                Ok(Expr::FltLit(f))
            }
            Tok::Str(s) => {
                self.advance();
                Ok(Expr::StrLit(s))
            }
            Tok::Regex(s) => {
                self.advance();
                Ok(Expr::RegexLit(s, Resolved::new()))
            }
            Tok::Dollar => {
                self.advance();
                let idx = self.parse_postfix_for_dollar()?;
                Ok(Expr::Field(Box::new(idx)))
            }
            Tok::Getline => {
                self.advance();
                let target = self.parse_optional_getline_target()?;
                if matches!(self.cur(), Tok::Lt) {
                    self.advance();
                    let file = self.parse_concat()?;
                    Ok(Expr::Getline(
                        GetlineForm::FromFile {
                            target,
                            file: Box::new(file),
                        },
                        pos,
                    ))
                } else {
                    Ok(Expr::Getline(GetlineForm::Simple { target }, pos))
                }
            }
            Tok::FuncName(name) => {
                self.advance();
                self.expect(&Tok::LParen, ErrorKind::LParen)?;
                let mut args = Vec::new();
                if !matches!(self.cur(), Tok::RParen) {
                    loop {
                        args.push(self.parse_ternary()?);
                        if matches!(self.cur(), Tok::Comma) {
                            self.advance();
                        } else {
                            break;
                        }
                    }
                }
                self.expect(&Tok::RParen, ErrorKind::RParen)?;
                Ok(Expr::Call(name, args, Resolved::new(), pos))
            }
            Tok::Ident(name) => {
                self.advance();
                if matches!(self.cur(), Tok::LBracket) {
                    self.advance();
                    let mut keys = Vec::new();
                    loop {
                        keys.push(self.parse_ternary()?);
                        if matches!(self.cur(), Tok::Comma) {
                            self.advance();
                        } else {
                            break;
                        }
                    }
                    self.expect(&Tok::RBracket, ErrorKind::RBrack)?;
                    Ok(Expr::Index(name, Resolved::new(), keys))
                } else {
                    Ok(Expr::Var(name, Resolved::new(), pos))
                }
            }
            Tok::LParen => {
                self.advance();
                let save = self.suppress_gt;
                self.suppress_gt = false;
                let mut items = vec![self.parse_expr()?];
                while matches!(self.cur(), Tok::Comma) {
                    self.advance();
                    items.push(self.parse_expr()?);
                }
                self.suppress_gt = save;
                self.expect(&Tok::RParen, ErrorKind::RParen)?;
                if items.len() == 1 {
                    Ok(Expr::Group(Box::new(items.pop().unwrap())))
                } else {
                    Ok(Expr::Grouping(items))
                }
            }
            _ => Err(Error::new(ErrorKind::Expr, pos)),
        }
    }

    /// `$` binds tighter than binary operators but looser than another
    /// leading `$`/unary; `$i++` means `($i)++`, `$++i` means `$(++i)`.
    fn parse_postfix_for_dollar(&mut self) -> PResult<Expr> {
        match self.cur() {
            Tok::Incr => {
                self.advance();
                Ok(Expr::PreIncr(Box::new(self.parse_postfix_for_dollar()?)))
            }
            Tok::Decr => {
                self.advance();
                Ok(Expr::PreDecr(Box::new(self.parse_postfix_for_dollar()?)))
            }
            Tok::Minus => {
                self.advance();
                Ok(Expr::Unary(UnOp::Neg, Box::new(self.parse_postfix_for_dollar()?)))
            }
            Tok::Dollar => {
                self.advance();
                Ok(Expr::Field(Box::new(self.parse_postfix_for_dollar()?)))
            }
            _ => self.parse_primary(),
        }
    }
}

/// Parse a complete Hawk source unit (after `@include` expansion) into a
/// [`ParsedProgram`].
pub fn parse(tokens: Vec<Token>) -> PResult<ParsedProgram> {
    Parser::new(tokens).parse_program()
}
