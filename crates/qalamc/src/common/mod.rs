//! Common infrastructure shared by the frontend, backend and driver

mod error;
mod span;

pub use error::{CompileError, CompileResult, DiagnosticReporter};
pub use span::{LineIndex, Span};
