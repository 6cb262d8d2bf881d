//! The trigger registry.

use crate::{RegistryError, ReloadReport, TriggerDefinition, TriggerSource};
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use warden_core::{EventKind, TableId};
use warden_sandbox::{CompileError, Evaluator};

type TriggerKey = (TableId, EventKind);

/// Maps `(table, event)` to at most one validated trigger.
///
/// Validation happens before the write lock is taken, so a slow or failing
/// compile never blocks readers. Lookups hand out `Arc`s; a definition that
/// is replaced stays alive for any mutation still running it.
pub struct TriggerRegistry {
    evaluator: Arc<Evaluator>,
    triggers: RwLock<HashMap<TriggerKey, Arc<TriggerDefinition>>>,
}

impl TriggerRegistry {
    pub fn new(evaluator: Arc<Evaluator>) -> Self {
        Self {
            evaluator,
            triggers: RwLock::new(HashMap::new()),
        }
    }

    /// The evaluator used to validate and run registered snippets.
    pub fn evaluator(&self) -> &Arc<Evaluator> {
        &self.evaluator
    }

    fn compile(
        &self,
        table_id: TableId,
        event_kind: EventKind,
        source: String,
    ) -> Result<TriggerDefinition, CompileError> {
        let compiled = self.evaluator.compile(&source)?;
        Ok(TriggerDefinition {
            table_id,
            event_kind,
            source,
            validated: true,
            compiled,
        })
    }

    // ==================== Writes ====================

    /// Validate `source` and make it the trigger for `(table_id, event_kind)`,
    /// replacing any prior definition. On failure the prior definition is
    /// left untouched.
    #[instrument(name = "registry::register", level = "debug", skip(self, source))]
    pub fn register(
        &self,
        table_id: TableId,
        event_kind: EventKind,
        source: impl Into<String>,
    ) -> Result<(), CompileError> {
        let definition = self.compile(table_id.clone(), event_kind, source.into())?;
        let replaced = self
            .triggers
            .write()
            .insert((table_id, event_kind), Arc::new(definition))
            .is_some();
        debug!(replaced, "trigger registered");
        Ok(())
    }

    /// Remove one trigger. Returns whether one existed.
    #[instrument(name = "registry::unregister", level = "debug", skip(self))]
    pub fn unregister(&self, table_id: &TableId, event_kind: EventKind) -> bool {
        self.triggers
            .write()
            .remove(&(table_id.clone(), event_kind))
            .is_some()
    }

    /// Remove every trigger of a table. Returns how many were removed.
    #[instrument(name = "registry::unregister_all", level = "debug", skip(self))]
    pub fn unregister_all(&self, table_id: &TableId) -> usize {
        let mut triggers = self.triggers.write();
        let before = triggers.len();
        triggers.retain(|(table, _), _| table != table_id);
        before - triggers.len()
    }

    /// Replace the whole map with the definitions in `sources`.
    ///
    /// The new map is built and validated without holding the lock and then
    /// swapped in, so readers see either the old set or the new one. Entries
    /// that fail validation are skipped and reported. Later entries for the
    /// same key win.
    #[instrument(name = "registry::reload", level = "debug", skip_all)]
    pub fn reload(&self, sources: impl IntoIterator<Item = TriggerSource>) -> ReloadReport {
        let mut fresh = HashMap::new();
        let mut rejected = Vec::new();

        for TriggerSource {
            table_id,
            event_kind,
            source,
        } in sources
        {
            match self.compile(table_id.clone(), event_kind, source) {
                Ok(definition) => {
                    fresh.insert((table_id, event_kind), Arc::new(definition));
                }
                Err(error) => {
                    warn!(table = %table_id, event = %event_kind, %error, "skipping invalid trigger");
                    rejected.push(RegistryError::invalid_trigger(table_id, event_kind, error));
                }
            }
        }

        let loaded = fresh.len();
        *self.triggers.write() = fresh;
        debug!(loaded, rejected = rejected.len(), "triggers reloaded");
        ReloadReport { loaded, rejected }
    }

    // ==================== Reads ====================

    pub fn lookup(&self, table_id: &TableId, event_kind: EventKind) -> Option<Arc<TriggerDefinition>> {
        self.triggers
            .read()
            .get(&(table_id.clone(), event_kind))
            .cloned()
    }

    pub fn has_trigger(&self, table_id: &TableId, event_kind: EventKind) -> bool {
        self.triggers
            .read()
            .contains_key(&(table_id.clone(), event_kind))
    }

    pub fn len(&self) -> usize {
        self.triggers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.read().is_empty()
    }

    /// Tables with at least one trigger, sorted.
    pub fn tables(&self) -> Vec<TableId> {
        self.triggers
            .read()
            .keys()
            .map(|(table, _)| table.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

impl Default for TriggerRegistry {
    fn default() -> Self {
        Self::new(Arc::new(Evaluator::default()))
    }
}
