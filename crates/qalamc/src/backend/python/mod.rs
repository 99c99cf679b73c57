//! Python code generation backend
//!
//! Translates a checked Qalam program into a self-contained Python 3
//! module with a `main()` entry point.

mod emit;

pub use emit::CodeGenerator;

use crate::backend::{Backend, BackendConfig, BackendOutput};
use crate::common::CompileResult;
use crate::frontend::ast::Program;

/// Python 3 source backend
pub struct PythonBackend;

impl PythonBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PythonBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for PythonBackend {
    fn name(&self) -> &'static str {
        "python"
    }

    fn target(&self) -> &'static str {
        "Python 3"
    }

    fn generate(&self, program: &Program, config: &BackendConfig) -> CompileResult<BackendOutput> {
        if config.verbose {
            log::info!("generating Python for program '{}'", program.name);
        }

        let mut codegen = CodeGenerator::new();
        let code = codegen.generate(program)?;
        log::debug!("generated {} line(s) of Python", code.lines().count());

        Ok(BackendOutput::new(code))
    }
}
