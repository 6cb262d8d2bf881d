//! Mutation error types.

use crate::StorageError;
use thiserror::Error;
use warden_core::{PrimaryKey, Record, TableId};
use warden_sandbox::ExecutionOutcome;

/// Result type for mutation operations.
pub type MutationResult<T> = Result<T, MutationError>;

/// Why a mutation did not happen, or did not complete.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MutationError {
    /// The trigger failed static validation when it was re-checked.
    #[error("trigger failed to compile: {}", messages.join("; "))]
    CompileError { messages: Vec<String> },

    #[error("capability violation: {message}")]
    CapabilityViolation { message: String },

    /// The trigger rejected the record.
    #[error("validation failed: {}", messages.join("; "))]
    ValidationFailure { messages: Vec<String> },

    #[error("trigger failed: {message}")]
    RuntimeFailure { message: String },

    #[error("record {key} not found in table {table_id}")]
    NotFound { table_id: TableId, key: PrimaryKey },

    /// Storage refused the write.
    #[error("persistence failed: {0}")]
    PersistenceFailure(#[from] StorageError),
}

impl MutationError {
    pub fn not_found(table_id: &TableId, key: PrimaryKey) -> Self {
        Self::NotFound {
            table_id: table_id.clone(),
            key,
        }
    }

    /// Human-readable messages. Validation failures keep each message the
    /// trigger raised; everything else yields one line.
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::CompileError { messages } | Self::ValidationFailure { messages } => {
                messages.clone()
            }
            Self::CapabilityViolation { message } | Self::RuntimeFailure { message } => {
                vec![message.clone()]
            }
            other => vec![other.to_string()],
        }
    }

    /// Take the record out of a successful trigger run, or map the failure.
    pub(crate) fn check_outcome(outcome: ExecutionOutcome) -> MutationResult<Record> {
        match outcome {
            ExecutionOutcome::Success(record) => Ok(record),
            ExecutionOutcome::ValidationFailure(messages) => {
                Err(Self::ValidationFailure { messages })
            }
            ExecutionOutcome::RuntimeFailure(message) => Err(Self::RuntimeFailure { message }),
            ExecutionOutcome::CapabilityViolation(message) => {
                Err(Self::CapabilityViolation { message })
            }
            ExecutionOutcome::CompileFailure(messages) => Err(Self::CompileError { messages }),
        }
    }
}
