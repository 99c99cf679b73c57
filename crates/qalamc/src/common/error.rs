//! Error types and diagnostic reporting

use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use thiserror::Error;
use super::Span;

/// Compile error with source location
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Lexer error at {span}: {message}")]
    Lexer { message: String, span: Span },

    #[error("Parser error at {span}: {message}")]
    Parser { message: String, span: Span },

    /// Semantic analysis finished with `count` collected errors
    #[error("semantic analysis failed with {count} error(s)")]
    Semantic { count: usize },

    #[error("Code generation error: {message}")]
    Codegen { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CompileError {
    pub fn lexer(message: impl Into<String>, span: Span) -> Self {
        Self::Lexer {
            message: message.into(),
            span,
        }
    }

    pub fn parser(message: impl Into<String>, span: Span) -> Self {
        Self::Parser {
            message: message.into(),
            span,
        }
    }

    pub fn semantic(count: usize) -> Self {
        Self::Semantic { count }
    }

    pub fn codegen(message: impl Into<String>) -> Self {
        Self::Codegen {
            message: message.into(),
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            Self::Lexer { span, .. } | Self::Parser { span, .. } => Some(*span),
            _ => None,
        }
    }

    /// Single-line form used outside a terminal: `السطر line:column - message`
    pub fn format_plain(&self) -> String {
        match self {
            Self::Lexer { message, span } | Self::Parser { message, span } => {
                format!("السطر {} - {}", span, message)
            }
            other => other.to_string(),
        }
    }
}

pub type CompileResult<T> = Result<T, CompileError>;

/// Diagnostic reporter for pretty error output
pub struct DiagnosticReporter {
    files: SimpleFiles<String, String>,
    writer: StandardStream,
    config: term::Config,
}

impl DiagnosticReporter {
    pub fn new() -> Self {
        Self::with_color(ColorChoice::Auto)
    }

    pub fn with_color(choice: ColorChoice) -> Self {
        Self {
            files: SimpleFiles::new(),
            writer: StandardStream::stderr(choice),
            config: term::Config::default(),
        }
    }

    pub fn add_file(&mut self, name: impl Into<String>, source: impl Into<String>) -> usize {
        self.files.add(name.into(), source.into())
    }

    pub fn report_error(&self, file_id: usize, error: &CompileError) {
        let diagnostic = match error {
            CompileError::Lexer { message, span } => Diagnostic::error()
                .with_message("Lexer error")
                .with_labels(vec![
                    Label::primary(file_id, span.start..span.end).with_message(message)
                ]),

            CompileError::Parser { message, span } => Diagnostic::error()
                .with_message("Syntax error")
                .with_labels(vec![
                    Label::primary(file_id, span.start..span.end).with_message(message)
                ]),

            CompileError::Semantic { count } => Diagnostic::error()
                .with_message(format!("compilation failed with {} semantic error(s)", count)),

            CompileError::Codegen { message } => {
                Diagnostic::error().with_message(format!("Code generation error: {}", message))
            }

            CompileError::Io(err) => {
                Diagnostic::error().with_message(format!("IO error: {}", err))
            }
        };

        self.emit(&diagnostic);
    }

    /// Report a located problem that is not a `CompileError`, such as one
    /// entry of the semantic error list.
    pub fn report_at(&self, file_id: usize, heading: &str, message: &str, span: Option<Span>) {
        let mut diagnostic = Diagnostic::error().with_message(heading);
        match span {
            Some(span) => {
                diagnostic = diagnostic.with_labels(vec![
                    Label::primary(file_id, span.start..span.end).with_message(message)
                ]);
            }
            None => {
                diagnostic = diagnostic.with_notes(vec![message.to_string()]);
            }
        }
        self.emit(&diagnostic);
    }

    fn emit(&self, diagnostic: &Diagnostic<usize>) {
        if let Err(e) = term::emit(&mut self.writer.lock(), &self.config, &self.files, diagnostic) {
            log::warn!("failed to render diagnostic: {}", e);
        }
    }
}

impl Default for DiagnosticReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_format_for_syntax_errors() {
        let err = CompileError::parser("expected ';'", Span::new(4, 5, 3, 7));
        assert_eq!(err.format_plain(), "السطر 3:7 - expected ';'");
    }

    #[test]
    fn test_semantic_summary_message() {
        let err = CompileError::semantic(2);
        assert_eq!(err.to_string(), "semantic analysis failed with 2 error(s)");
        assert!(err.span().is_none());
    }
}
