//! Syntax analysis: tokens to concrete parse tree

mod parser;
pub mod tree;

pub use parser::Parser;

/// Default limit on nested instructions and expressions
pub const DEFAULT_MAX_DEPTH: usize = 256;
