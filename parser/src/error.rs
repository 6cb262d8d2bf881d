//! Syntax errors raised while tokenizing or parsing trigger source.

use crate::Span;
use thiserror::Error;

/// What went wrong, independent of where.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxErrorKind {
    #[error("expected {expected}, found {found}")]
    UnexpectedToken { expected: String, found: String },

    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: String },

    #[error("nesting exceeds the limit of {limit} levels")]
    NestingTooDeep { limit: usize },

    /// Malformed literals, stray characters and bad assignment targets.
    #[error("{0}")]
    Malformed(String),
}

/// A syntax error anchored to a source position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("syntax error at line {}, column {}: {kind}", .span.line, .span.column)]
pub struct ParseError {
    pub kind: SyntaxErrorKind,
    pub span: Span,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            kind: SyntaxErrorKind::Malformed(message.into()),
            span,
        }
    }

    pub fn unexpected_eof(span: Span, expected: &str) -> Self {
        Self {
            kind: SyntaxErrorKind::UnexpectedEof {
                expected: expected.to_string(),
            },
            span,
        }
    }

    pub fn unexpected_token(span: Span, expected: &str, found: &str) -> Self {
        Self {
            kind: SyntaxErrorKind::UnexpectedToken {
                expected: expected.to_string(),
                found: found.to_string(),
            },
            span,
        }
    }

    pub fn nesting_too_deep(span: Span, limit: usize) -> Self {
        Self {
            kind: SyntaxErrorKind::NestingTooDeep { limit },
            span,
        }
    }

    /// The error text without the location prefix.
    pub fn message(&self) -> String {
        self.kind.to_string()
    }

    /// Name of the token that was found instead of the expected one.
    pub fn found(&self) -> Option<&str> {
        match &self.kind {
            SyntaxErrorKind::UnexpectedToken { found, .. } => Some(found),
            SyntaxErrorKind::UnexpectedEof { .. } => Some("end of input"),
            _ => None,
        }
    }

    pub fn line(&self) -> usize {
        self.span.line
    }

    pub fn column(&self) -> usize {
        self.span.column
    }
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;
