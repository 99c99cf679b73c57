//! Concrete parse tree
//!
//! One node kind per grammar rule. The tree keeps the source structure
//! as written (sections, expression levels, raw identifiers); resolution
//! and typing happen in the semantic analyzer.

use crate::common::Span;
use crate::frontend::ast::{BinaryOp, PassMode, UnaryOp};

/// Identifier occurrence
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub text: String,
    pub span: Span,
}

impl Ident {
    pub fn new(text: impl Into<String>, span: Span) -> Self {
        Self {
            text: text.into(),
            span,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProgramTree {
    pub name: Ident,
    pub block: BlockTree,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct BlockTree {
    pub constants: Vec<ConstantDefTree>,
    pub types: Vec<TypeDefTree>,
    pub variables: Vec<NameGroupTree>,
    pub procedures: Vec<ProcedureTree>,
    pub body: CompoundTree,
    pub span: Span,
}

// ============================================================================
// Definitions
// ============================================================================

#[derive(Debug, Clone)]
pub struct ConstantDefTree {
    pub name: Ident,
    pub value: ConstantValueTree,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum ConstantValueTree {
    /// Literal, with a leading sign already folded into numbers
    Literal(LiteralTree),
    /// Name of a previously defined constant
    Name(Ident),
}

#[derive(Debug, Clone)]
pub struct TypeDefTree {
    pub name: Ident,
    pub spec: CompositeTypeTree,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum CompositeTypeTree {
    List { size: usize, element: Ident },
    Record { fields: Vec<NameGroupTree> },
}

/// `a، b: type`, used for variables and record fields
#[derive(Debug, Clone)]
pub struct NameGroupTree {
    pub names: Vec<Ident>,
    pub type_name: Ident,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ParamGroupTree {
    /// `None` when no passing mode is written
    pub mode: Option<PassMode>,
    pub group: NameGroupTree,
}

#[derive(Debug, Clone)]
pub struct ProcedureTree {
    pub name: Ident,
    pub params: Vec<ParamGroupTree>,
    pub block: BlockTree,
    pub span: Span,
}

// ============================================================================
// Instructions
// ============================================================================

#[derive(Debug, Clone)]
pub struct CompoundTree {
    pub instructions: Vec<InstructionTree>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct InstructionTree {
    pub kind: InstructionKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum InstructionKind {
    Assignment {
        target: VariableAccessTree,
        value: ExpressionTree,
    },
    Input(VariableAccessTree),
    Output(Vec<ExpressionTree>),
    Call {
        name: Ident,
        args: Vec<ExpressionTree>,
    },
    If(IfTree),
    For {
        variable: Ident,
        start: ExpressionTree,
        end: ExpressionTree,
        step: Option<ExpressionTree>,
        body: Box<InstructionTree>,
    },
    While {
        condition: ExpressionTree,
        body: Box<InstructionTree>,
    },
    Repeat {
        body: Box<InstructionTree>,
        condition: ExpressionTree,
    },
    Compound(CompoundTree),
    Empty,
}

/// Conditional chain
///
/// `instructions[i]` is the body guarded by `conditions[i]`; when
/// `instructions` has one more entry than `conditions`, that last entry is
/// the final else body.
#[derive(Debug, Clone)]
pub struct IfTree {
    pub conditions: Vec<ExpressionTree>,
    pub instructions: Vec<InstructionTree>,
}

impl IfTree {
    pub fn else_body(&self) -> Option<&InstructionTree> {
        if self.instructions.len() > self.conditions.len() {
            self.instructions.last()
        } else {
            None
        }
    }
}

// ============================================================================
// Expressions
// ============================================================================

/// `simple [relop simple]`
#[derive(Debug, Clone)]
pub struct ExpressionTree {
    pub left: SimpleExpressionTree,
    pub relation: Option<(BinaryOp, SimpleExpressionTree)>,
    pub span: Span,
}

/// `[sign] term {addop term}`, the sign applies to the first term
#[derive(Debug, Clone)]
pub struct SimpleExpressionTree {
    pub sign: Option<(UnaryOp, Span)>,
    pub first: TermTree,
    pub rest: Vec<(BinaryOp, TermTree)>,
    pub span: Span,
}

/// `factor {mulop factor}`
#[derive(Debug, Clone)]
pub struct TermTree {
    pub first: FactorTree,
    pub rest: Vec<(BinaryOp, FactorTree)>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct FactorTree {
    pub kind: FactorKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum FactorKind {
    Variable(VariableAccessTree),
    Literal(LiteralTree),
    Parenthesized(Box<ExpressionTree>),
    Not(Box<FactorTree>),
}

#[derive(Debug, Clone)]
pub struct VariableAccessTree {
    pub name: Ident,
    pub selectors: Vec<SelectorTree>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct SelectorTree {
    pub kind: SelectorTreeKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum SelectorTreeKind {
    Index(Box<ExpressionTree>),
    Field(Ident),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiteralTree {
    pub kind: LiteralKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralKind {
    Integer(i64),
    Real(f64),
    String(String),
    Char(char),
    Boolean(bool),
}
