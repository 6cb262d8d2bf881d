//! Execution binding and result types.

use crate::{CompileError, EvalError};
use warden_core::Record;

/// The names a snippet sees: the record being written and, for updates and
/// deletes, the stored snapshot it replaces.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExecutionBinding {
    pub record: Record,
    pub old_record: Option<Record>,
}

impl ExecutionBinding {
    /// Binding for an insert: no prior snapshot.
    pub fn insert(record: Record) -> Self {
        Self {
            record,
            old_record: None,
        }
    }

    /// Binding for an update or delete.
    pub fn with_old(record: Record, old_record: Record) -> Self {
        Self {
            record,
            old_record: Some(old_record),
        }
    }
}

/// How a snippet run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    /// The snippet completed; carries the (possibly rewritten) record.
    Success(Record),
    /// The snippet rejected the record via `reject(...)`.
    ValidationFailure(Vec<String>),
    /// An uncaught fault in otherwise permitted code.
    RuntimeFailure(String),
    /// The snippet attempted something outside its capability set.
    CapabilityViolation(String),
    /// The source failed re-validation for a reason other than capabilities.
    CompileFailure(Vec<String>),
}

impl ExecutionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionOutcome::Success(_))
    }

    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            ExecutionOutcome::Success(_) => "success",
            ExecutionOutcome::ValidationFailure(_) => "validation_failure",
            ExecutionOutcome::RuntimeFailure(_) => "runtime_failure",
            ExecutionOutcome::CapabilityViolation(_) => "capability_violation",
            ExecutionOutcome::CompileFailure(_) => "compile_failure",
        }
    }

    /// Human-readable messages describing a failure; empty on success.
    pub fn messages(&self) -> Vec<String> {
        match self {
            ExecutionOutcome::Success(_) => Vec::new(),
            ExecutionOutcome::ValidationFailure(messages)
            | ExecutionOutcome::CompileFailure(messages) => messages.clone(),
            ExecutionOutcome::RuntimeFailure(message)
            | ExecutionOutcome::CapabilityViolation(message) => vec![message.clone()],
        }
    }
}

impl From<EvalError> for ExecutionOutcome {
    fn from(err: EvalError) -> Self {
        match err {
            EvalError::Rejected { messages } => ExecutionOutcome::ValidationFailure(messages),
            err if err.is_capability() => ExecutionOutcome::CapabilityViolation(err.to_string()),
            err => ExecutionOutcome::RuntimeFailure(err.to_string()),
        }
    }
}

impl From<CompileError> for ExecutionOutcome {
    /// A capability diagnostic anywhere in the snippet dominates, whatever
    /// precedes it.
    fn from(err: CompileError) -> Self {
        match err.capability_violation() {
            Some(diagnostic) => ExecutionOutcome::CapabilityViolation(diagnostic.message.clone()),
            None => ExecutionOutcome::CompileFailure(err.messages()),
        }
    }
}

/// Outcome of one run plus everything the snippet printed.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    pub outcome: ExecutionOutcome,
    pub diagnostics: Vec<String>,
    /// Interpreter steps consumed.
    pub steps: u64,
}

impl ExecutionResult {
    pub fn new(outcome: ExecutionOutcome) -> Self {
        Self {
            outcome,
            diagnostics: Vec::new(),
            steps: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }

    /// The rewritten record, if the run succeeded.
    pub fn record(&self) -> Option<&Record> {
        match &self.outcome {
            ExecutionOutcome::Success(record) => Some(record),
            _ => None,
        }
    }
}
