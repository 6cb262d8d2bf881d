//! Trigger event kinds.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The mutation event a trigger is attached to. Every trigger runs before
/// persistence, so it can still rewrite the record or abort the write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    BeforeInsert,
    BeforeUpdate,
    BeforeDelete,
}

impl EventKind {
    pub const ALL: [EventKind; 3] = [
        EventKind::BeforeInsert,
        EventKind::BeforeUpdate,
        EventKind::BeforeDelete,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EventKind::BeforeInsert => "before_insert",
            EventKind::BeforeUpdate => "before_update",
            EventKind::BeforeDelete => "before_delete",
        }
    }

    /// Whether the binding for this event carries an `old_record` snapshot.
    pub fn has_old_record(&self) -> bool {
        !matches!(self, EventKind::BeforeInsert)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown event kind: {0}")]
pub struct UnknownEventKind(pub String);

impl FromStr for EventKind {
    type Err = UnknownEventKind;

    /// Accepts the canonical names as well as the bare `insert`/`update`/`delete`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "before_insert" | "insert" => Ok(EventKind::BeforeInsert),
            "before_update" | "update" => Ok(EventKind::BeforeUpdate),
            "before_delete" | "delete" => Ok(EventKind::BeforeDelete),
            _ => Err(UnknownEventKind(s.to_string())),
        }
    }
}
