//! Warden Analyzer
//!
//! Static validation of parsed snippets, performed before any snippet is
//! registered or executed:
//! - Name resolution (locals, `record`, `old_record`, builtins, imported modules)
//! - Arity checks against the capability catalog
//! - Capability enforcement (module allow-list, `__` names, host primitives)
//! - Read-only enforcement for `old_record` and global names

mod analyzer;
pub mod catalog;
mod error;
mod scope;

pub use analyzer::{analyze_expression_source, analyze_source, Analyzer};
pub use error::{AnalyzerError, AnalyzerResult, Diagnostic, DiagnosticKind};
pub use scope::{Scope, VarBinding};
