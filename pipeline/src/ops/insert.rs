//! INSERT operation - persists a new record after the insert trigger.

use warden_core::{EventKind, Record, TableId, Value};
use warden_sandbox::ExecutionBinding;

use super::{run_trigger, MutationContext};
use crate::error::MutationResult;
use crate::result::MutationOutcome;
use crate::storage::Storage;

/// Execute an insert.
///
/// Defaults are filled before the trigger sees the record. The primary key
/// field is whatever storage declares for the table. It is
/// stripped both from the caller's fields and from whatever the trigger
/// returns, so only the storage-assigned key ends up in the result.
pub fn execute_insert<S: Storage + ?Sized>(
    cx: &MutationContext<'_, S>,
    table_id: &TableId,
    mut record: Record,
) -> MutationResult<MutationOutcome> {
    let primary_key = cx.storage.primary_key(table_id)?;
    record.remove(&primary_key);
    cx.storage.fill_defaults(table_id, &mut record)?;

    let run = run_trigger(
        cx.registry,
        table_id,
        EventKind::BeforeInsert,
        ExecutionBinding::insert(record),
    )?;

    let mut record = run.record;
    record.remove(&primary_key);
    let key = cx.storage.insert_record(table_id, record.clone())?;
    record.insert(primary_key, Value::Int(key));

    Ok(MutationOutcome {
        record,
        executed: run.executed,
        diagnostics: run.diagnostics,
    })
}
