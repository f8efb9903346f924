//! The syntax tree produced by the parser (spec.md §2, §3, §4.2).
//!
//! The teacher keeps one file per node kind under `src/ast/`; here the whole
//! tree is small enough (one line-oriented grammar, eleven commands) to live
//! in a single module, grouped the same way the teacher groups expression
//! nodes (`binary_expr.rs`, `binary_op.rs`, `fn_call.rs`) next to each other.

use std::collections::HashMap;

pub type Position = (usize, usize);

/// A call-site's entry in the tag table: where its commands start in
/// [`TopLevel::commands`], and the parameter names it binds on entry
/// (spec.md §4.4).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TagInfo {
    pub index: usize,
    pub params: Vec<String>,
}

/// The parser's output: a flat, source-ordered sequence of top-level
/// commands plus the tag table addressing into it (spec.md §2, §4.4). Only
/// top-level commands are flattened this way; a `do` block's nested body
/// lives inside its [`CommandKind::DoBlock`] node, not in this list.
#[derive(Debug, Clone, Default)]
pub struct TopLevel {
    pub commands: Vec<Command>,
    pub tags: HashMap<String, TagInfo>,
}

#[derive(Debug, Clone)]
pub struct Command {
    pub kind: CommandKind,
    pub postcond: Option<Expr>,
    pub position: Position,
}

#[derive(Debug, Clone)]
pub enum CommandKind {
    Write(Vec<WriteArg>),
    Quit(Option<Expr>),
    /// `do name(args)` — a call executed for effect.
    DoCall(CallExpr),
    /// Bare `do` followed by whitespace: opens a nested, indentation-scoped
    /// block (spec.md §4.2.1).
    DoBlock(Vec<Command>),
    If(Vec<Expr>, Vec<Command>),
    Else(Vec<Command>),
    For(Option<ForArg>, Vec<Command>),
    Set(Vec<(SetTarget, Expr)>),
    New(Vec<String>),
    /// Empty means "reset all locals" (spec.md §4.3.4).
    Kill(Vec<VarRef>),
    Merge(VarRef, VarRef),
    Halt,
}

#[derive(Debug, Clone)]
pub enum WriteArg {
    Expr(Expr),
    /// `#` — reset the output buffer and column.
    Reset,
    /// `!` — newline, then reset column.
    Newline,
    /// `?<expr>` — pad with spaces up to the given minimum column.
    Pad(Expr),
}

#[derive(Debug, Clone)]
pub enum SetTarget {
    Var(VarRef),
    /// `$E(var, start[, end])` as a `set` target (spec.md §4.3.4).
    Extract(VarRef, Box<Expr>, Option<Box<Expr>>),
}

#[derive(Debug, Clone)]
pub struct ForArg {
    pub var: String,
    pub params: Vec<ForParam>,
}

#[derive(Debug, Clone)]
pub enum ForParam {
    Start(Expr),
    StartStep(Expr, Expr),
    StartStepLimit(Expr, Expr, Expr),
}

/// A variable reference: a name plus zero or more subscript expressions
/// (spec.md §3, §4.3.3).
#[derive(Debug, Clone)]
pub struct VarRef {
    pub name: String,
    pub subscripts: Vec<Expr>,
    pub position: Position,
}

impl VarRef {
    pub fn bare(name: impl Into<String>, position: Position) -> Self {
        Self {
            name: name.into(),
            subscripts: Vec::new(),
            position,
        }
    }
}

/// A call argument: either an ordinary value expression, or a `.name`
/// by-reference argument (spec.md §4.2.3).
#[derive(Debug, Clone)]
pub enum CallArg {
    Expr(Expr),
    Ref(String),
}

#[derive(Debug, Clone)]
pub struct CallExpr {
    pub name: String,
    pub args: Vec<CallArg>,
    pub position: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Plus,
    Minus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Or,
    And,
    Eq,
    Lt,
    Gt,
    Add,
    Sub,
    Mul,
    Pow,
    Div,
    IntDiv,
    Mod,
    Concat,
}

#[derive(Debug, Clone)]
pub enum Builtin {
    /// `$O(var[, dir])` — `var` names the array slot whose parent is
    /// searched (spec.md §4.3.5).
    Order(VarRef, Option<Box<Expr>>),
    Length(Box<Expr>),
    Extract(Box<Expr>, Option<Box<Expr>>, Option<Box<Expr>>),
    Select(Vec<(Expr, Expr)>),
    Find(Box<Expr>, Box<Expr>, Option<Box<Expr>>),
    Random(Box<Expr>),
    Ascii(Box<Expr>),
    Char(Box<Expr>),
}

#[derive(Debug, Clone)]
pub enum Expr {
    Num(f64),
    Str(String),
    Var(VarRef),
    Paren(Box<Expr>),
    Unary(UnaryOp, Box<Expr>, Position),
    /// `negated` records a leading `'` immediately before a binary operator
    /// (spec.md §4.2.4: "a leading `'` immediately before a binary operator
    /// negates that comparison").
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
        negated: bool,
        position: Position,
    },
    /// `$$name(args)` — call used for its return value.
    Call(CallExpr),
    Builtin(Builtin, Position),
}

impl Expr {
    pub fn position(&self) -> Position {
        match self {
            Expr::Num(_) | Expr::Str(_) => (0, 0),
            Expr::Var(v) => v.position,
            Expr::Paren(e) => e.position(),
            Expr::Unary(_, _, p) => *p,
            Expr::Binary { position, .. } => *position,
            Expr::Call(c) => c.position,
            Expr::Builtin(_, p) => *p,
        }
    }
}
