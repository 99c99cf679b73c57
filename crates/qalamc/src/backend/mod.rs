//! Backend trait and the Python backend
//!
//! Backends are responsible for:
//! 1. Mapping the checked AST onto target constructs
//! 2. Emitting output text for the target

pub mod python;

use crate::common::CompileResult;
use crate::frontend::ast::Program;
use std::path::Path;

pub use python::PythonBackend;

/// Configuration options for backends
#[derive(Debug, Clone, Default)]
pub struct BackendConfig {
    pub verbose: bool,
}

/// Output from a backend
#[derive(Debug, Clone, PartialEq)]
pub struct BackendOutput {
    text: String,
}

impl BackendOutput {
    pub fn new(text: String) -> Self {
        Self { text }
    }

    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, &self.text)
    }

    pub fn as_text(&self) -> &str {
        &self.text
    }
}

/// Trait for code generation backends
///
/// A backend converts a program that passed semantic analysis into
/// target source text.
pub trait Backend: Send + Sync {
    /// The name of this backend (e.g., "python")
    fn name(&self) -> &'static str;

    /// Target language description
    fn target(&self) -> &'static str;

    /// Generate output from the AST
    fn generate(&self, program: &Program, config: &BackendConfig) -> CompileResult<BackendOutput>;
}
