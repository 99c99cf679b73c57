//! Expression AST nodes

use crate::common::Span;
use crate::frontend::sema::TypeInfo;

/// Expression node
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
    /// Resolved type, `None` once an error for this node has been reported
    pub ty: Option<TypeInfo>,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span, ty: Option<TypeInfo>) -> Self {
        Self { kind, span, ty }
    }

    pub fn is_variable_access(&self) -> bool {
        matches!(self.kind, ExprKind::VarAccess { .. })
    }
}

/// Expression kinds
#[derive(Debug, Clone)]
pub enum ExprKind {
    /// Binary operation: `a + b`, `a && b`, `a =! b`
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Unary operation: `-a`, `!a`
    Unary { op: UnaryOp, operand: Box<Expr> },

    /// Variable or parameter, optionally followed by selectors: `a[i].f`
    VarAccess { name: String, selectors: Vec<Selector> },

    /// Literal value
    Literal(ConstValue),

    /// Reference to a named constant, with the constant's literal value
    ConstantRef {
        name: String,
        value: Option<ConstValue>,
    },
}

/// One step of a variable access
#[derive(Debug, Clone)]
pub struct Selector {
    pub kind: SelectorKind,
    pub span: Span,
    /// Type after this step (element or field type)
    pub ty: Option<TypeInfo>,
}

#[derive(Debug, Clone)]
pub enum SelectorKind {
    /// `[index]`
    Index(Box<Expr>),
    /// `.field`
    Field(String),
}

/// Literal values of constants and expressions
#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    Integer(i64),
    Real(f64),
    Boolean(bool),
    Char(char),
    String(String),
}

impl ConstValue {
    pub fn type_info(&self) -> TypeInfo {
        match self {
            ConstValue::Integer(_) => TypeInfo::integer(),
            ConstValue::Real(_) => TypeInfo::real(),
            ConstValue::Boolean(_) => TypeInfo::boolean(),
            ConstValue::Char(_) => TypeInfo::char(),
            ConstValue::String(_) => TypeInfo::string(),
        }
    }
}

impl std::fmt::Display for ConstValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConstValue::Integer(v) => write!(f, "{}", v),
            ConstValue::Real(v) => write!(f, "{:?}", v),
            ConstValue::Boolean(true) => write!(f, "صح"),
            ConstValue::Boolean(false) => write!(f, "خطأ"),
            ConstValue::Char(c) => write!(f, "'{}'", c),
            ConstValue::String(s) => write!(f, "\"{}\"", s),
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,    // +
    Sub,    // -
    Mul,    // *
    Div,    // /
    IntDiv, // \
    Mod,    // %
    Eq,     // ==
    NotEq,  // =!
    Lt,     // <
    Gt,     // >
    LtEq,   // <=
    GtEq,   // >=
    And,    // &&
    Or,     // ||
}

impl BinaryOp {
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Add
                | BinaryOp::Sub
                | BinaryOp::Mul
                | BinaryOp::Div
                | BinaryOp::IntDiv
                | BinaryOp::Mod
        )
    }

    pub fn is_relational(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::NotEq
                | BinaryOp::Lt
                | BinaryOp::Gt
                | BinaryOp::LtEq
                | BinaryOp::GtEq
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }

    /// Spelling in the source language
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::IntDiv => "\\",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "=!",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::LtEq => "<=",
            BinaryOp::GtEq => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
            UnaryOp::Not => "!",
        }
    }
}
