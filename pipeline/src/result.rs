//! Mutation result types.

use warden_core::{Record, Value};

/// Outcome of a successful mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationOutcome {
    /// Insert and update: the record as persisted, key included.
    /// Delete: the snapshot taken before removal.
    pub record: Record,
    /// Whether a trigger ran. `false` means no trigger was registered.
    pub executed: bool,
    /// Lines the trigger printed.
    pub diagnostics: Vec<String>,
}

impl MutationOutcome {
    /// Get a field of the resulting record.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.record.get(field)
    }
}
