//! DELETE operation - removes a row unless the delete trigger vetoes it.

use warden_core::{EventKind, PrimaryKey, TableId};
use warden_sandbox::ExecutionBinding;

use super::{run_trigger, MutationContext};
use crate::error::{MutationError, MutationResult};
use crate::result::MutationOutcome;
use crate::storage::{RowWrite, Storage};

/// Execute a delete and return the pre-deletion snapshot.
///
/// Any trigger failure keeps the row; `reject(...)` is the intended veto.
/// Whatever the trigger writes to `record` is discarded.
pub fn execute_delete<S: Storage + ?Sized>(
    cx: &MutationContext<'_, S>,
    table_id: &TableId,
    key: PrimaryKey,
) -> MutationResult<MutationOutcome> {
    let mut outcome = None;

    cx.storage.write_row(table_id, key, &mut |current| {
        let run = run_trigger(
            cx.registry,
            table_id,
            EventKind::BeforeDelete,
            ExecutionBinding::with_old(current.clone(), current.clone()),
        )?;
        outcome = Some(MutationOutcome {
            record: current.clone(),
            executed: run.executed,
            diagnostics: run.diagnostics,
        });
        Ok(RowWrite::Delete)
    })?;

    outcome.ok_or_else(|| MutationError::not_found(table_id, key))
}
