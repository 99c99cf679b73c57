//! Statement AST nodes

use super::Expr;
use crate::common::Span;

/// Statement node
#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn is_empty(&self) -> bool {
        match &self.kind {
            StmtKind::Empty => true,
            StmtKind::Compound(stmts) => stmts.iter().all(Stmt::is_empty),
            _ => false,
        }
    }
}

/// Statement kinds
#[derive(Debug, Clone)]
pub enum StmtKind {
    /// `target = value؛`
    Assignment { target: Expr, value: Expr },

    /// `اقرأ(target)؛`
    Input { target: Expr },

    /// `اطبع(a، b)؛`
    Output { items: Vec<Expr> },

    /// `name(args)؛`
    Call { name: String, args: Vec<Expr> },

    /// `اذا (c) فان s { وإلا اذا (c) فان s } [وإلا s]`
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        elif_parts: Vec<(Expr, Stmt)>,
        else_branch: Option<Box<Stmt>>,
    },

    /// `لكل v من start الى end [بخطوة step] نفذ body`
    ForLoop {
        variable: String,
        start: Expr,
        end: Expr,
        step: Option<Expr>,
        body: Box<Stmt>,
    },

    /// `طالما (c) نفذ body`
    WhileLoop { condition: Expr, body: Box<Stmt> },

    /// `كرر body حتى (c)؛`
    RepeatUntil { body: Box<Stmt>, condition: Expr },

    /// `{ ... }`
    Compound(Vec<Stmt>),

    /// `؛`
    Empty,
}
