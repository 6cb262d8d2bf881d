//! UPDATE operation - persists only the fields that changed.

use warden_core::{EventKind, PrimaryKey, Record, TableId, Value};
use warden_sandbox::ExecutionBinding;

use super::{run_trigger, MutationContext};
use crate::config::PipelineConfig;
use crate::error::{MutationError, MutationResult};
use crate::result::MutationOutcome;
use crate::storage::{RowWrite, Storage};

/// Execute an update of row `key` with the requested `changes`.
///
/// The trigger sees the stored row merged with the changes and a fresh
/// modification timestamp; `old_record` is the stored row itself. The read,
/// the trigger and the write happen under one `Storage::write_row`, so
/// concurrent updates of the same row do not overwrite each other.
pub fn execute_update<S: Storage + ?Sized>(
    cx: &MutationContext<'_, S>,
    table_id: &TableId,
    key: PrimaryKey,
    changes: Record,
) -> MutationResult<MutationOutcome> {
    let primary_key = cx.storage.primary_key(table_id)?;
    let mut outcome = None;

    cx.storage.write_row(table_id, key, &mut |current| {
        let stamp = Value::Timestamp(cx.clock.now());
        let mut merged = current.clone();
        merged.extend(
            changes
                .iter()
                .filter(|(field, _)| **field != primary_key)
                .map(|(field, value)| (field.clone(), value.clone())),
        );
        merged.insert(cx.config.updated_at_field.clone(), stamp.clone());

        let run = run_trigger(
            cx.registry,
            table_id,
            EventKind::BeforeUpdate,
            ExecutionBinding::with_old(merged, current.clone()),
        )?;

        let delta = changed_fields(cx.config, &primary_key, current, &run.record, stamp);
        let mut record = current.clone();
        record.extend(delta.clone());
        outcome = Some(MutationOutcome {
            record,
            executed: run.executed,
            diagnostics: run.diagnostics,
        });
        Ok(RowWrite::Update(delta))
    })?;

    outcome.ok_or_else(|| MutationError::not_found(table_id, key))
}

/// Fields of `new` whose value differs from `old`.
///
/// The primary key and the creation timestamp are never included. The
/// modification timestamp always is: the trigger's value if it kept one,
/// otherwise `stamp`. A field set to its stored value is not a change, and
/// a field the trigger dropped keeps its stored value.
pub fn changed_fields(
    config: &PipelineConfig,
    primary_key: &str,
    old: &Record,
    new: &Record,
    stamp: Value,
) -> Record {
    let mut delta: Record = new
        .iter()
        .filter(|(field, _)| field.as_str() != primary_key && **field != config.created_at_field)
        .filter(|(field, value)| old.get(field.as_str()) != Some(*value))
        .map(|(field, value)| (field.clone(), value.clone()))
        .collect();

    let updated_at = new.get(&config.updated_at_field).cloned().unwrap_or(stamp);
    delta.insert(config.updated_at_field.clone(), updated_at);
    delta
}
