//! Qalam Compiler - Arabic-keyword teaching language to Python 3
//!
//! ## Architecture
//!
//! The compiler is organized into:
//! - **Frontend** (`frontend/`): lexing, parsing and semantic analysis
//! - **Backends** (`backend/`): code generation (Python)
//! - **Driver** (`driver/`): file-level pipeline
//! - **Runner** (`runner/`): running generated programs under a time limit
//! - **Common** (`common/`): shared infrastructure (errors, spans)

pub mod common;
pub mod frontend;
pub mod backend;
pub mod driver;
pub mod runner;

// Re-exports for convenience
pub use common::{CompileError, CompileResult, DiagnosticReporter, Span};
pub use frontend::{CompileContext, Frontend, FrontendConfig, QalamFrontend};
pub use backend::{Backend, BackendConfig, BackendOutput, PythonBackend};
pub use driver::Pipeline;
pub use runner::{RunConfig, RunOutcome, RunnerError};
