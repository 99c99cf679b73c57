//! Semantic diagnostics
//!
//! Semantic problems are collected as data during analysis instead of
//! aborting it; any entry marks the compilation as failed.

use crate::common::Span;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticErrorKind {
    DuplicateDeclaration,
    UndefinedSymbol,
    NotAProcedure,
    NotAVariable,
    NotAList,
    NotARecord,
    ArityMismatch,
    TypeMismatch,
    ConditionNotBoolean,
    IndexNotNumeric,
    FieldNotFound,
    OperatorTypeError,
    NumericRequired,
    NestingTooDeep,
}

#[derive(Debug, Clone, Error, PartialEq)]
#[error("{message}")]
pub struct SemanticError {
    pub kind: SemanticErrorKind,
    pub message: String,
    pub span: Option<Span>,
}

impl SemanticError {
    pub fn new(kind: SemanticErrorKind, message: impl Into<String>, span: Option<Span>) -> Self {
        Self {
            kind,
            message: message.into(),
            span,
        }
    }

    pub fn line(&self) -> Option<usize> {
        self.span.map(|s| s.line)
    }

    pub fn column(&self) -> Option<usize> {
        self.span.map(|s| s.column)
    }

    /// `خطأ دلالي في السطر 3, العمود 4: message`
    pub fn format(&self) -> String {
        match self.span {
            Some(span) => format!(
                "خطأ دلالي في السطر {}, العمود {}: {}",
                span.line, span.column, self.message
            ),
            None => format!("خطأ دلالي: {}", self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_format_with_position() {
        let err = SemanticError::new(
            SemanticErrorKind::UndefinedSymbol,
            "undefined identifier 'س'",
            Some(Span::new(12, 14, 3, 4)),
        );
        assert_eq!(err.format(), "خطأ دلالي في السطر 3, العمود 4: undefined identifier 'س'");
        assert_eq!(err.to_string(), "undefined identifier 'س'");
        assert_eq!((err.line(), err.column()), (Some(3), Some(4)));
    }

    #[test]
    fn test_format_without_position() {
        let err = SemanticError::new(SemanticErrorKind::NestingTooDeep, "too deep", None);
        assert_eq!(err.format(), "خطأ دلالي: too deep");
        assert_eq!(err.line(), None);
    }
}
