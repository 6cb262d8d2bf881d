//! AST definitions for trigger snippets.

use chrono::{DateTime, Utc};
use std::fmt;

/// Source location information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }
}

/// A parsed snippet: a sequence of statements.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub stmts: Vec<Stmt>,
}

/// A braced sequence of statements.
pub type Block = Vec<Stmt>;

/// A statement in the snippet language.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `let name = value`
    Let(LetStmt),
    /// `target = value`
    Assign(AssignStmt),
    /// `import re, math`
    Import(ImportStmt),
    /// `if cond { } else if cond { } else { }`
    If(IfStmt),
    /// `for var in iterable { }`
    For(ForStmt),
    /// `while cond { }`
    While(WhileStmt),
    Break(Span),
    Continue(Span),
    /// Ends the snippet successfully with the current record.
    Return(Span),
    /// An expression evaluated for its effect, usually a call.
    Expr(Expr),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Let(s) => s.span,
            Stmt::Assign(s) => s.span,
            Stmt::Import(s) => s.span,
            Stmt::If(s) => s.span,
            Stmt::For(s) => s.span,
            Stmt::While(s) => s.span,
            Stmt::Break(span) | Stmt::Continue(span) | Stmt::Return(span) => *span,
            Stmt::Expr(e) => e.span(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LetStmt {
    pub name: String,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignStmt {
    pub target: AssignTarget,
    pub value: Expr,
    pub span: Span,
}

/// The left-hand side of an assignment. Field and index targets are
/// restricted to a plain name as their base.
#[derive(Debug, Clone, PartialEq)]
pub enum AssignTarget {
    /// `name = value`
    Var(String, Span),
    /// `base.field = value`
    Field {
        base: String,
        field: String,
        span: Span,
    },
    /// `base[index] = value`
    Index {
        base: String,
        index: Expr,
        span: Span,
    },
}

impl AssignTarget {
    /// The name of the variable being written.
    pub fn root(&self) -> &str {
        match self {
            AssignTarget::Var(name, _) => name,
            AssignTarget::Field { base, .. } | AssignTarget::Index { base, .. } => base,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            AssignTarget::Var(_, span) => *span,
            AssignTarget::Field { span, .. } | AssignTarget::Index { span, .. } => *span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportStmt {
    pub modules: Vec<(String, Span)>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    /// `if` and `else if` arms in source order.
    pub branches: Vec<(Expr, Block)>,
    pub else_block: Option<Block>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForStmt {
    pub var: String,
    pub iterable: Expr,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStmt {
    pub condition: Expr,
    pub body: Block,
    pub span: Span,
}

/// An expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal value
    Literal(Literal),
    /// Variable reference
    Var(String, Span),
    /// Field access: expr.field
    Field(Box<Expr>, String, Span),
    /// Index access: expr[index]
    Index(Box<Expr>, Box<Expr>, Span),
    /// Function call: name(args)
    Call(Call),
    /// Method-style call: receiver.name(args). Resolves to a module function
    /// when the receiver names a module, otherwise to `name(receiver, args)`.
    MethodCall(Box<Expr>, Call),
    /// Binary operation
    BinaryOp(BinaryOp, Box<Expr>, Box<Expr>, Span),
    /// Unary operation
    UnaryOp(UnaryOp, Box<Expr>, Span),
    /// List literal: [a, b, c]
    List(Vec<Expr>, Span),
    /// Map literal: {"a": 1}
    Map(Vec<(String, Expr)>, Span),
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal(lit) => lit.span,
            Expr::Var(_, span) => *span,
            Expr::Field(_, _, span) => *span,
            Expr::Index(_, _, span) => *span,
            Expr::Call(call) => call.span,
            Expr::MethodCall(_, call) => call.span,
            Expr::BinaryOp(_, _, _, span) => *span,
            Expr::UnaryOp(_, _, span) => *span,
            Expr::List(_, span) => *span,
            Expr::Map(_, span) => *span,
        }
    }
}

/// Literal values.
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub kind: LiteralKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralKind {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Timestamp(DateTime<Utc>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub name: String,
    pub args: Vec<Expr>,
    pub span: Span,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    // Comparison
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    // Membership
    In,
    NotIn,
    // Logical
    And,
    Or,
    // Null coalescing
    NullCoalesce,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinaryOp::Add => write!(f, "+"),
            BinaryOp::Sub => write!(f, "-"),
            BinaryOp::Mul => write!(f, "*"),
            BinaryOp::Div => write!(f, "/"),
            BinaryOp::Mod => write!(f, "%"),
            BinaryOp::Eq => write!(f, "=="),
            BinaryOp::NotEq => write!(f, "!="),
            BinaryOp::Lt => write!(f, "<"),
            BinaryOp::LtEq => write!(f, "<="),
            BinaryOp::Gt => write!(f, ">"),
            BinaryOp::GtEq => write!(f, ">="),
            BinaryOp::In => write!(f, "in"),
            BinaryOp::NotIn => write!(f, "not in"),
            BinaryOp::And => write!(f, "and"),
            BinaryOp::Or => write!(f, "or"),
            BinaryOp::NullCoalesce => write!(f, "??"),
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Neg => write!(f, "-"),
            UnaryOp::Not => write!(f, "not"),
        }
    }
}
