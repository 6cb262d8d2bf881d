//! Trigger definitions and reload inputs.

use crate::RegistryError;
use serde::{Deserialize, Serialize};
use warden_core::{EventKind, TableId};
use warden_sandbox::CompiledSnippet;

/// A registered trigger.
#[derive(Debug, Clone)]
pub struct TriggerDefinition {
    pub table_id: TableId,
    pub event_kind: EventKind,
    /// Snippet text exactly as registered.
    pub source: String,
    /// Always true: unvalidated snippets are never stored.
    pub validated: bool,
    /// The checked program, reused by every mutation.
    pub compiled: CompiledSnippet,
}

/// A trigger as held by the source of truth, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerSource {
    pub table_id: TableId,
    pub event_kind: EventKind,
    pub source: String,
}

impl TriggerSource {
    pub fn new(table_id: impl Into<TableId>, event_kind: EventKind, source: impl Into<String>) -> Self {
        Self {
            table_id: table_id.into(),
            event_kind,
            source: source.into(),
        }
    }
}

/// What a `reload` did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReloadReport {
    /// Definitions now active.
    pub loaded: usize,
    /// Entries skipped because their snippet failed validation.
    pub rejected: Vec<RegistryError>,
}

impl ReloadReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}
