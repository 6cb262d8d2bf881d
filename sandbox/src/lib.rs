//! Warden Sandbox
//!
//! Runs one untrusted trigger snippet against one record binding with a fixed,
//! non-extensible capability set.
//!
//! Responsibilities:
//! - Static validation (`Evaluator::validate`) before anything is registered
//! - Execution with exactly `record`, `old_record`, the builtins and the
//!   imported allow-listed modules in scope
//! - Step, wall-clock and allocation quotas
//! - Classifying every way a run can end into an `ExecutionOutcome`

mod builtins;
mod config;
mod error;
mod evaluator;
mod interpreter;
mod modules;
mod ops;
mod outcome;
mod quota;

pub use config::SandboxConfig;
pub use error::{CompileError, EvalError, EvalResult, SandboxError};
pub use evaluator::{CompiledSnippet, Evaluator};
pub use outcome::{ExecutionBinding, ExecutionOutcome, ExecutionResult};
pub use warden_analyzer::{Diagnostic, DiagnosticKind};

/// Tracing target for text snippets emit through `print`.
pub const SNIPPET_LOG_TARGET: &str = "warden::snippet";
