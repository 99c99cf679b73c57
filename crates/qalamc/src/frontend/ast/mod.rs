//! Typed abstract syntax tree produced by semantic analysis
//!
//! The tree is built once by the analyzer and never mutated afterwards.
//! Expressions carry their resolved type from the moment they are built;
//! `None` marks a node whose type error has already been reported.

mod decl;
mod expr;
mod stmt;

pub use decl::*;
pub use expr::*;
pub use stmt::*;

use crate::common::Span;

/// Root of a compiled program
#[derive(Debug, Clone)]
pub struct Program {
    pub name: String,
    pub block: Block,
    pub span: Span,
}

impl Program {
    pub fn new(name: String, block: Block, span: Span) -> Self {
        Self { name, block, span }
    }
}
