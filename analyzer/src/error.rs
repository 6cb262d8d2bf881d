//! Analyzer error types.

use std::fmt;
use thiserror::Error;
use warden_parser::{ParseError, Span};

/// Errors that can occur during analysis.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalyzerError {
    /// The source did not parse.
    #[error("{message} at line {line}, column {column}")]
    Syntax {
        message: String,
        line: usize,
        column: usize,
    },

    /// Undefined variable.
    #[error("Undefined variable '{name}' at line {line}, column {column}")]
    UndefinedVariable {
        name: String,
        line: usize,
        column: usize,
    },

    /// Duplicate variable in the same block.
    #[error("Duplicate variable '{name}' at line {line}, column {column}")]
    DuplicateVariable {
        name: String,
        line: usize,
        column: usize,
    },

    /// A global name used where a local was expected.
    #[error("'{name}' is a reserved name at line {line}, column {column}")]
    ReservedName {
        name: String,
        line: usize,
        column: usize,
    },

    /// Assignment to something the snippet may only read.
    #[error("Cannot assign to read-only '{name}' at line {line}, column {column}")]
    ReadOnly {
        name: String,
        line: usize,
        column: usize,
    },

    /// Call to a function that does not exist.
    #[error("Unknown function '{name}' at line {line}, column {column}")]
    UnknownFunction {
        name: String,
        line: usize,
        column: usize,
    },

    /// A module or builtin name used as a plain value.
    #[error("'{name}' is not a value at line {line}, column {column}")]
    NotAValue {
        name: String,
        line: usize,
        column: usize,
    },

    /// Module function used before `import`.
    #[error("Module '{module}' is used without 'import {module}' at line {line}, column {column}")]
    ModuleNotImported {
        module: String,
        line: usize,
        column: usize,
    },

    /// Wrong number of arguments.
    #[error("'{name}' expects {expected} argument(s), got {actual} at line {line}, column {column}")]
    WrongArity {
        name: String,
        expected: String,
        actual: usize,
        line: usize,
        column: usize,
    },

    /// `break` or `continue` outside a loop.
    #[error("'{keyword}' outside of a loop at line {line}, column {column}")]
    LoopControlOutsideLoop {
        keyword: &'static str,
        line: usize,
        column: usize,
    },

    /// Import of a module that is not on the allow-list.
    #[error("Import of module '{module}' is not allowed at line {line}, column {column}")]
    ForbiddenImport {
        module: String,
        line: usize,
        column: usize,
    },

    /// Any name or field starting with a double underscore.
    #[error("Access to '{name}' is not allowed at line {line}, column {column}")]
    DunderAccess {
        name: String,
        line: usize,
        column: usize,
    },

    /// Reference to a host primitive outside the capability set.
    #[error("'{name}' is not available in the sandbox at line {line}, column {column}")]
    ForbiddenPrimitive {
        name: String,
        line: usize,
        column: usize,
    },
}

impl AnalyzerError {
    pub fn undefined_variable(name: impl Into<String>, span: Span) -> Self {
        Self::UndefinedVariable {
            name: name.into(),
            line: span.line,
            column: span.column,
        }
    }

    pub fn duplicate_variable(name: impl Into<String>, span: Span) -> Self {
        Self::DuplicateVariable {
            name: name.into(),
            line: span.line,
            column: span.column,
        }
    }

    pub fn reserved_name(name: impl Into<String>, span: Span) -> Self {
        Self::ReservedName {
            name: name.into(),
            line: span.line,
            column: span.column,
        }
    }

    pub fn read_only(name: impl Into<String>, span: Span) -> Self {
        Self::ReadOnly {
            name: name.into(),
            line: span.line,
            column: span.column,
        }
    }

    pub fn unknown_function(name: impl Into<String>, span: Span) -> Self {
        Self::UnknownFunction {
            name: name.into(),
            line: span.line,
            column: span.column,
        }
    }

    pub fn not_a_value(name: impl Into<String>, span: Span) -> Self {
        Self::NotAValue {
            name: name.into(),
            line: span.line,
            column: span.column,
        }
    }

    pub fn module_not_imported(module: impl Into<String>, span: Span) -> Self {
        Self::ModuleNotImported {
            module: module.into(),
            line: span.line,
            column: span.column,
        }
    }

    pub fn wrong_arity(
        name: impl Into<String>,
        min: usize,
        max: Option<usize>,
        actual: usize,
        span: Span,
    ) -> Self {
        let expected = match max {
            Some(max) if max == min => min.to_string(),
            Some(max) => format!("{} to {}", min, max),
            None => format!("at least {}", min),
        };
        Self::WrongArity {
            name: name.into(),
            expected,
            actual,
            line: span.line,
            column: span.column,
        }
    }

    pub fn loop_control_outside_loop(keyword: &'static str, span: Span) -> Self {
        Self::LoopControlOutsideLoop {
            keyword,
            line: span.line,
            column: span.column,
        }
    }

    pub fn forbidden_import(module: impl Into<String>, span: Span) -> Self {
        Self::ForbiddenImport {
            module: module.into(),
            line: span.line,
            column: span.column,
        }
    }

    pub fn dunder_access(name: impl Into<String>, span: Span) -> Self {
        Self::DunderAccess {
            name: name.into(),
            line: span.line,
            column: span.column,
        }
    }

    pub fn forbidden_primitive(name: impl Into<String>, span: Span) -> Self {
        Self::ForbiddenPrimitive {
            name: name.into(),
            line: span.line,
            column: span.column,
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            Self::Syntax { .. } => DiagnosticKind::Syntax,
            Self::ForbiddenImport { .. }
            | Self::DunderAccess { .. }
            | Self::ForbiddenPrimitive { .. } => DiagnosticKind::Capability,
            _ => DiagnosticKind::Semantic,
        }
    }

    pub fn is_capability(&self) -> bool {
        self.kind() == DiagnosticKind::Capability
    }
}

impl From<ParseError> for AnalyzerError {
    fn from(err: ParseError) -> Self {
        Self::Syntax {
            message: err.message(),
            line: err.span.line,
            column: err.span.column,
        }
    }
}

/// Result type for analyzer operations.
pub type AnalyzerResult<T> = Result<T, AnalyzerError>;

/// Category of a compile-time diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    Syntax,
    Semantic,
    Capability,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::Syntax => write!(f, "syntax error"),
            DiagnosticKind::Semantic => write!(f, "error"),
            DiagnosticKind::Capability => write!(f, "capability violation"),
        }
    }
}

/// A rendered compile-time diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            kind,
            message: message.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl From<&AnalyzerError> for Diagnostic {
    fn from(err: &AnalyzerError) -> Self {
        let (line, column) = match err {
            AnalyzerError::Syntax { line, column, .. }
            | AnalyzerError::UndefinedVariable { line, column, .. }
            | AnalyzerError::DuplicateVariable { line, column, .. }
            | AnalyzerError::ReservedName { line, column, .. }
            | AnalyzerError::ReadOnly { line, column, .. }
            | AnalyzerError::UnknownFunction { line, column, .. }
            | AnalyzerError::NotAValue { line, column, .. }
            | AnalyzerError::ModuleNotImported { line, column, .. }
            | AnalyzerError::WrongArity { line, column, .. }
            | AnalyzerError::LoopControlOutsideLoop { line, column, .. }
            | AnalyzerError::ForbiddenImport { line, column, .. }
            | AnalyzerError::DunderAccess { line, column, .. }
            | AnalyzerError::ForbiddenPrimitive { line, column, .. } => (*line, *column),
        };
        Diagnostic::new(err.kind(), err.to_string(), line, column)
    }
}

impl From<AnalyzerError> for Diagnostic {
    fn from(err: AnalyzerError) -> Self {
        Diagnostic::from(&err)
    }
}
