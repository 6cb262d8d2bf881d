//! Registry error types.

use thiserror::Error;
use warden_core::{EventKind, TableId};
use warden_sandbox::CompileError;

/// Errors raised while loading trigger definitions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    #[error("invalid trigger for {table_id}/{event_kind}: {error}")]
    InvalidTrigger {
        table_id: TableId,
        event_kind: EventKind,
        error: CompileError,
    },
}

impl RegistryError {
    pub fn invalid_trigger(table_id: TableId, event_kind: EventKind, error: CompileError) -> Self {
        Self::InvalidTrigger {
            table_id,
            event_kind,
            error,
        }
    }
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
