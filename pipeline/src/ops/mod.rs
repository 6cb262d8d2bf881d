//! Mutation operation implementations.
//!
//! Each operation (INSERT, UPDATE, DELETE) is implemented in its own module.
//! They share `run_trigger`, which looks up and runs the trigger for one
//! event and turns any failure into a `MutationError`.

mod delete;
mod insert;
mod update;

pub use delete::execute_delete;
pub use insert::execute_insert;
pub use update::execute_update;

use crate::config::PipelineConfig;
use crate::error::{MutationError, MutationResult};
use crate::storage::Storage;
use tracing::{debug, warn};
use warden_core::{Clock, EventKind, Record, TableId};
use warden_registry::TriggerRegistry;
use warden_sandbox::{ExecutionBinding, ExecutionOutcome};

/// Collaborators an operation needs for one call.
pub struct MutationContext<'a, S: Storage + ?Sized> {
    pub registry: &'a TriggerRegistry,
    pub storage: &'a S,
    pub clock: &'a dyn Clock,
    pub config: &'a PipelineConfig,
}

/// What the trigger step produced.
#[derive(Debug)]
pub struct TriggerRun {
    pub record: Record,
    pub executed: bool,
    pub diagnostics: Vec<String>,
}

/// Run the trigger for `(table_id, event_kind)` against `binding`.
///
/// Without a registered trigger the bound record passes through unchanged.
pub fn run_trigger(
    registry: &TriggerRegistry,
    table_id: &TableId,
    event_kind: EventKind,
    binding: ExecutionBinding,
) -> MutationResult<TriggerRun> {
    let Some(trigger) = registry.lookup(table_id, event_kind) else {
        return Ok(TriggerRun {
            record: binding.record,
            executed: false,
            diagnostics: Vec::new(),
        });
    };

    let result = registry.evaluator().run_compiled(&trigger.compiled, binding);
    match &result.outcome {
        ExecutionOutcome::Success(_) => {}
        ExecutionOutcome::CapabilityViolation(message) => {
            warn!(table = %table_id, event = event_kind.name(), %message, "trigger aborted the mutation")
        }
        outcome => {
            debug!(table = %table_id, event = event_kind.name(), outcome = outcome.label(), "trigger aborted the mutation")
        }
    }

    let record = MutationError::check_outcome(result.outcome)?;
    Ok(TriggerRun {
        record,
        executed: true,
        diagnostics: result.diagnostics,
    })
}
