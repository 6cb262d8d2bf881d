//! Mutation pipeline - the host-facing entry points.
//!
//! The pipeline delegates each mutation to an operation module in `ops/`:
//! - `ops/insert.rs` - INSERT (key assignment, defaults)
//! - `ops/update.rs` - UPDATE (delta persistence)
//! - `ops/delete.rs` - DELETE (veto, snapshot)

use std::sync::Arc;
use tracing::{debug, instrument};
use warden_core::{Clock, EventKind, PrimaryKey, Record, SystemClock, TableId};
use warden_registry::{ReloadReport, TriggerRegistry};
use warden_sandbox::{CompileError, Evaluator};

use crate::config::{EngineConfig, PipelineConfig};
use crate::error::MutationResult;
use crate::ops::{self, MutationContext};
use crate::result::MutationOutcome;
use crate::storage::Storage;

/// Runs triggers around every write to `S`.
///
/// Cheap to share: clone the `Arc`s into another pipeline, or wrap this one
/// in an `Arc`; every method takes `&self`.
pub struct MutationPipeline<S: Storage> {
    registry: Arc<TriggerRegistry>,
    storage: Arc<S>,
    clock: Arc<dyn Clock>,
    config: PipelineConfig,
}

impl<S: Storage> MutationPipeline<S> {
    /// Create a pipeline with default configuration and the system clock.
    pub fn new(registry: Arc<TriggerRegistry>, storage: Arc<S>) -> Self {
        Self {
            registry,
            storage,
            clock: Arc::new(SystemClock),
            config: PipelineConfig::default(),
        }
    }

    /// Build the evaluator, registry and pipeline from one configuration,
    /// sharing `clock` between `datetime.now` and update stamping.
    pub fn from_config(config: &EngineConfig, storage: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        let evaluator = Evaluator::new(config.sandbox.clone()).with_clock(Arc::clone(&clock));
        let registry = Arc::new(TriggerRegistry::new(Arc::new(evaluator)));
        Self {
            registry,
            storage,
            clock,
            config: config.pipeline.clone(),
        }
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Use `clock` for the modification timestamp.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn registry(&self) -> &Arc<TriggerRegistry> {
        &self.registry
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn context(&self) -> MutationContext<'_, S> {
        MutationContext {
            registry: &self.registry,
            storage: self.storage.as_ref(),
            clock: self.clock.as_ref(),
            config: &self.config,
        }
    }

    // ==================== Triggers ====================

    /// Validate and register a trigger.
    pub fn register_trigger(
        &self,
        table_id: impl Into<TableId>,
        event_kind: EventKind,
        source: impl Into<String>,
    ) -> Result<(), CompileError> {
        self.registry.register(table_id.into(), event_kind, source)
    }

    pub fn unregister_trigger(&self, table_id: &TableId, event_kind: EventKind) -> bool {
        self.registry.unregister(table_id, event_kind)
    }

    /// Replace the registry's contents with the trigger sources storage holds.
    #[instrument(name = "pipeline::reload_triggers", level = "debug", skip(self))]
    pub fn reload_triggers(&self) -> MutationResult<ReloadReport> {
        let sources = self.storage.list_trigger_definitions()?;
        let report = self.registry.reload(sources);
        debug!(loaded = report.loaded, rejected = report.rejected.len(), "triggers reloaded");
        Ok(report)
    }

    // ==================== Mutations ====================

    /// Insert a record and return it as persisted, key included.
    #[instrument(name = "pipeline::insert", level = "debug", skip(self, record))]
    pub fn insert(&self, table_id: &TableId, record: Record) -> MutationResult<MutationOutcome> {
        ops::execute_insert(&self.context(), table_id, record)
    }

    /// Apply `changes` to row `key` and return the row as persisted.
    #[instrument(name = "pipeline::update", level = "debug", skip(self, changes))]
    pub fn update(
        &self,
        table_id: &TableId,
        key: PrimaryKey,
        changes: Record,
    ) -> MutationResult<MutationOutcome> {
        ops::execute_update(&self.context(), table_id, key, changes)
    }

    /// Delete row `key` and return its last state.
    #[instrument(name = "pipeline::delete", level = "debug", skip(self))]
    pub fn delete(&self, table_id: &TableId, key: PrimaryKey) -> MutationResult<MutationOutcome> {
        ops::execute_delete(&self.context(), table_id, key)
    }

    // ==================== Reads ====================

    pub fn get(&self, table_id: &TableId, key: PrimaryKey) -> MutationResult<Option<Record>> {
        Ok(self.storage.get_record(table_id, key)?)
    }

    /// Rows whose fields equal every field of `conditions`, in key order.
    pub fn search(&self, table_id: &TableId, conditions: &Record) -> MutationResult<Vec<Record>> {
        Ok(self.storage.search_records(table_id, conditions)?)
    }

    /// Rows in key order.
    pub fn list(
        &self,
        table_id: &TableId,
        limit: usize,
        offset: usize,
    ) -> MutationResult<Vec<Record>> {
        Ok(self.storage.list_records(table_id, limit, offset)?)
    }
}
