//! Lexer implementation using logos

use super::token::{Token, TokenKind};
use crate::common::{CompileError, CompileResult, LineIndex, Span};
use logos::Logos;

/// Lexer for Qalam source code
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, TokenKind>,
    lines: LineIndex,
    peeked: Option<Token>,
    at_eof: bool,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source code
    pub fn new(source: &'a str) -> Self {
        Self {
            inner: TokenKind::lexer(source),
            lines: LineIndex::new(source),
            peeked: None,
            at_eof: false,
        }
    }

    fn span(&self, start: usize, end: usize) -> Span {
        self.lines.span(self.inner.source(), start, end)
    }

    /// Get the next token
    pub fn next_token(&mut self) -> CompileResult<Token> {
        if let Some(token) = self.peeked.take() {
            return Ok(token);
        }

        if self.at_eof {
            let len = self.inner.source().len();
            return Ok(Token::new(TokenKind::Eof, self.span(len, len)));
        }

        match self.inner.next() {
            Some(Ok(kind)) => {
                let kind = match kind {
                    TokenKind::Identifier(word) => {
                        TokenKind::keyword(&word).unwrap_or(TokenKind::Identifier(word))
                    }
                    other => other,
                };
                let range = self.inner.span();
                Ok(Token::new(kind, self.span(range.start, range.end)))
            }
            Some(Err(())) => {
                let range = self.inner.span();
                Err(CompileError::lexer(
                    format!("unexpected character '{}'", self.inner.slice()),
                    self.span(range.start, range.end),
                ))
            }
            None => {
                self.at_eof = true;
                let len = self.inner.source().len();
                Ok(Token::new(TokenKind::Eof, self.span(len, len)))
            }
        }
    }

    /// Peek at the next token without consuming it
    pub fn peek(&mut self) -> CompileResult<&Token> {
        let token = match self.peeked.take() {
            Some(token) => token,
            None => self.next_token()?,
        };
        Ok(self.peeked.insert(token))
    }

    /// Check if the next token matches the expected kind
    pub fn check(&mut self, expected: &TokenKind) -> CompileResult<bool> {
        Ok(std::mem::discriminant(&self.peek()?.kind) == std::mem::discriminant(expected))
    }

    /// Tokenize the entire source and return all tokens
    pub fn tokenize_all(mut self) -> CompileResult<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = matches!(token.kind, TokenKind::Eof);
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }
}
