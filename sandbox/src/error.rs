//! Sandbox error types.

use std::fmt;
use thiserror::Error;
use warden_analyzer::{AnalyzerError, Diagnostic, DiagnosticKind};

/// A snippet failed static validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    pub diagnostics: Vec<Diagnostic>,
}

impl CompileError {
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }

    pub fn single(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self::new(vec![Diagnostic::new(kind, message, 0, 0)])
    }

    /// Human-readable messages, one per diagnostic.
    pub fn messages(&self) -> Vec<String> {
        self.diagnostics.iter().map(ToString::to_string).collect()
    }

    /// The first capability diagnostic, if any.
    pub fn capability_violation(&self) -> Option<&Diagnostic> {
        self.diagnostics
            .iter()
            .find(|d| d.kind == DiagnosticKind::Capability)
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.messages().join("; "))
    }
}

impl std::error::Error for CompileError {}

impl From<Vec<AnalyzerError>> for CompileError {
    fn from(errors: Vec<AnalyzerError>) -> Self {
        Self::new(errors.iter().map(Diagnostic::from).collect())
    }
}

/// Faults raised while a snippet runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// Operand or argument of the wrong type.
    #[error("type error: {message}")]
    TypeError { message: String },

    #[error("division by zero")]
    DivisionByZero,

    /// Checked integer or decimal arithmetic overflowed.
    #[error("arithmetic overflow in {operation}")]
    Overflow { operation: String },

    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    /// A well-typed argument with an unusable value (bad regex, bad date, ...).
    #[error("invalid argument to {function}: {message}")]
    InvalidArgument { function: String, message: String },

    /// The snippet called `reject(...)`.
    #[error("rejected: {}", messages.join("; "))]
    Rejected { messages: Vec<String> },

    /// A step, time or size quota was exceeded.
    #[error("{resource} limit exceeded: {detail}")]
    QuotaExceeded {
        resource: &'static str,
        detail: String,
    },

    /// A call outside the capability set reached the interpreter.
    #[error("'{name}' is not available in the sandbox")]
    Forbidden { name: String },
}

impl EvalError {
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::TypeError {
            message: message.into(),
        }
    }

    pub fn overflow(operation: impl Into<String>) -> Self {
        Self::Overflow {
            operation: operation.into(),
        }
    }

    pub fn invalid_argument(function: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            function: function.into(),
            message: message.into(),
        }
    }

    pub fn quota(resource: &'static str, detail: impl Into<String>) -> Self {
        Self::QuotaExceeded {
            resource,
            detail: detail.into(),
        }
    }

    pub fn forbidden(name: impl Into<String>) -> Self {
        Self::Forbidden { name: name.into() }
    }

    /// Whether this fault is a breach of the capability set.
    pub fn is_capability(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. } | Self::Forbidden { .. })
    }
}

/// Result type for evaluation.
pub type EvalResult<T> = Result<T, EvalError>;

/// Failure of a standalone expression evaluation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SandboxError {
    #[error("{0}")]
    Compile(#[from] CompileError),

    #[error("{0}")]
    Eval(#[from] EvalError),
}
