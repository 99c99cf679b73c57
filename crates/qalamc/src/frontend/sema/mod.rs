//! Semantic analysis: scope resolution, type checking and AST construction

mod analyzer;
mod error;
mod expressions;
mod symbol_table;
mod types;

pub use analyzer::{Analysis, SemanticAnalyzer};
pub use error::{SemanticError, SemanticErrorKind};
pub use symbol_table::{
    ParamSymbol, Symbol, SymbolEntry, SymbolError, SymbolKind, SymbolReport, SymbolTable,
    GLOBAL_SCOPE,
};
pub use types::{PrimitiveType, TypeChecker, TypeInfo};
