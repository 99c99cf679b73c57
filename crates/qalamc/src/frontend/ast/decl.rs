//! Declaration AST nodes

use super::{ConstValue, Stmt};
use crate::common::Span;
use crate::frontend::sema::TypeInfo;

/// A block: definitions in fixed order followed by its instructions
#[derive(Debug, Clone)]
pub struct Block {
    pub constants: Vec<ConstantDef>,
    pub types: Vec<TypeDef>,
    pub variables: Vec<VarDecl>,
    pub procedures: Vec<ProcedureDef>,
    /// Always a compound statement
    pub body: Stmt,
    pub span: Span,
}

/// Constant definition: `ثابت باي = 3.14؛`
#[derive(Debug, Clone)]
pub struct ConstantDef {
    pub name: String,
    pub value: ConstValue,
    pub ty: TypeInfo,
    pub span: Span,
}

/// Type definition: `نوع نقطة = سجل { ... }؛`
#[derive(Debug, Clone)]
pub struct TypeDef {
    pub name: String,
    pub spec: TypeSpec,
    pub ty: TypeInfo,
    pub span: Span,
}

/// Composite type as written in the source
#[derive(Debug, Clone)]
pub enum TypeSpec {
    List { element: String, size: usize },
    Record { fields: Vec<FieldDef> },
}

/// One field group of a record: `س، ص: حقيقي؛`
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub names: Vec<String>,
    pub type_name: String,
    pub span: Span,
}

/// Variable group sharing one declared type
#[derive(Debug, Clone)]
pub struct VarDecl {
    pub names: Vec<String>,
    pub type_name: String,
    /// Resolved type; unresolved names have already fallen back to Integer
    pub ty: TypeInfo,
    pub span: Span,
}

/// Procedure definition with its own block
#[derive(Debug, Clone)]
pub struct ProcedureDef {
    pub name: String,
    pub params: Vec<Param>,
    pub block: Block,
    pub span: Span,
}

impl ProcedureDef {
    pub fn by_reference_params(&self) -> impl Iterator<Item = &Param> {
        self.params.iter().filter(|p| p.mode == PassMode::ByReference)
    }
}

/// Parameter passing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PassMode {
    #[default]
    ByValue,
    ByReference,
}

impl std::fmt::Display for PassMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PassMode::ByValue => write!(f, "بالقيمة"),
            PassMode::ByReference => write!(f, "بالمرجع"),
        }
    }
}

/// Formal parameter
#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub type_name: String,
    pub ty: TypeInfo,
    pub mode: PassMode,
    pub span: Span,
}
