//! Scenario definition and runner.

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;
use warden_core::{Clock, EventKind, FixedClock, PrimaryKey, Record, TableId};
use warden_pipeline::{EngineConfig, MemoryStorage, MutationPipeline, TableSchema};
use warden_sandbox::SandboxConfig;

use crate::assertion::{Assertion, StepError, StepResult};
use crate::error::{ScenarioError, ScenarioResult};

/// One operation a step performs.
#[derive(Debug, Clone)]
pub enum Op {
    Register {
        table_id: TableId,
        event_kind: EventKind,
        source: String,
    },
    Unregister {
        table_id: TableId,
        event_kind: EventKind,
    },
    /// Write (or clear) a trigger source in storage without touching the registry.
    StoreTrigger {
        table_id: TableId,
        event_kind: EventKind,
        source: Option<String>,
    },
    Reload,
    Insert {
        table_id: TableId,
        record: Record,
    },
    Update {
        table_id: TableId,
        key: PrimaryKey,
        changes: Record,
    },
    Delete {
        table_id: TableId,
        key: PrimaryKey,
    },
    AdvanceClock(Duration),
}

impl Op {
    pub fn register(
        table_id: impl Into<TableId>,
        event_kind: EventKind,
        source: impl Into<String>,
    ) -> Self {
        Op::Register {
            table_id: table_id.into(),
            event_kind,
            source: source.into(),
        }
    }

    pub fn unregister(table_id: impl Into<TableId>, event_kind: EventKind) -> Self {
        Op::Unregister {
            table_id: table_id.into(),
            event_kind,
        }
    }

    pub fn store_trigger(
        table_id: impl Into<TableId>,
        event_kind: EventKind,
        source: Option<&str>,
    ) -> Self {
        Op::StoreTrigger {
            table_id: table_id.into(),
            event_kind,
            source: source.map(str::to_string),
        }
    }

    pub fn reload() -> Self {
        Op::Reload
    }

    pub fn insert(table_id: impl Into<TableId>, record: Record) -> Self {
        Op::Insert {
            table_id: table_id.into(),
            record,
        }
    }

    pub fn update(table_id: impl Into<TableId>, key: PrimaryKey, changes: Record) -> Self {
        Op::Update {
            table_id: table_id.into(),
            key,
            changes,
        }
    }

    pub fn delete(table_id: impl Into<TableId>, key: PrimaryKey) -> Self {
        Op::Delete {
            table_id: table_id.into(),
            key,
        }
    }

    pub fn advance_clock(seconds: i64) -> Self {
        Op::AdvanceClock(Duration::seconds(seconds))
    }

    /// The table storage assertions of this step look at.
    fn table_id(&self) -> Option<&TableId> {
        match self {
            Op::Register { table_id, .. }
            | Op::Unregister { table_id, .. }
            | Op::StoreTrigger { table_id, .. }
            | Op::Insert { table_id, .. }
            | Op::Update { table_id, .. }
            | Op::Delete { table_id, .. } => Some(table_id),
            Op::Reload | Op::AdvanceClock(_) => None,
        }
    }
}

struct Step {
    name: String,
    op: Op,
    assertion: Assertion,
}

/// A sequence of steps against a fresh pipeline over `MemoryStorage`.
///
/// The clock is a `FixedClock` starting at `2024-01-15T10:30:00Z` unless
/// `starting_at` says otherwise; it only moves on `Op::AdvanceClock`.
pub struct Scenario {
    name: String,
    config: EngineConfig,
    start: DateTime<Utc>,
    tables: Vec<(TableId, TableSchema)>,
    steps: Vec<Step>,
}

impl Scenario {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: EngineConfig::default(),
            start: Utc
                .with_ymd_and_hms(2024, 1, 15, 10, 30, 0)
                .single()
                .unwrap_or_default(),
            tables: Vec::new(),
            steps: Vec::new(),
        }
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn sandbox(mut self, sandbox: SandboxConfig) -> Self {
        self.config.sandbox = sandbox;
        self
    }

    pub fn starting_at(mut self, start: DateTime<Utc>) -> Self {
        self.start = start;
        self
    }

    pub fn table(mut self, table_id: impl Into<TableId>, schema: TableSchema) -> Self {
        self.tables.push((table_id.into(), schema));
        self
    }

    /// Add a step. `build` receives an empty assertion to configure.
    pub fn step<F>(mut self, name: impl Into<String>, op: Op, build: F) -> Self
    where
        F: FnOnce(Assertion) -> Assertion,
    {
        self.steps.push(Step {
            name: name.into(),
            op,
            assertion: build(Assertion::new()),
        });
        self
    }

    /// Run every step in order, stopping at the first failed assertion.
    /// Returns the pipeline for further inspection.
    pub fn run(self) -> ScenarioResult<MutationPipeline<MemoryStorage>> {
        let clock = Arc::new(FixedClock::new(self.start));
        let storage = MemoryStorage::new().with_clock(Arc::clone(&clock) as Arc<dyn Clock>);
        for (table_id, schema) in self.tables {
            storage
                .create_table(table_id, schema)
                .map_err(|e| ScenarioError::setup(format!("{}: {}", self.name, e)))?;
        }
        let pipeline = MutationPipeline::from_config(
            &self.config,
            Arc::new(storage),
            Arc::clone(&clock) as Arc<dyn Clock>,
        );

        for step in &self.steps {
            let result = execute(&pipeline, &clock, &step.op);
            step.assertion.verify(
                &format!("{}/{}", self.name, step.name),
                &result,
                pipeline.storage(),
                step.op.table_id(),
            )?;
        }

        Ok(pipeline)
    }
}

fn execute(
    pipeline: &MutationPipeline<MemoryStorage>,
    clock: &FixedClock,
    op: &Op,
) -> Result<StepResult, StepError> {
    match op {
        Op::Register {
            table_id,
            event_kind,
            source,
        } => {
            pipeline.register_trigger(table_id.clone(), *event_kind, source.as_str())?;
            Ok(StepResult::Registered)
        }
        Op::Unregister {
            table_id,
            event_kind,
        } => {
            pipeline.unregister_trigger(table_id, *event_kind);
            Ok(StepResult::Empty)
        }
        Op::StoreTrigger {
            table_id,
            event_kind,
            source,
        } => {
            pipeline
                .storage()
                .set_trigger_source(table_id, *event_kind, source.clone())
                .map_err(warden_pipeline::MutationError::from)?;
            Ok(StepResult::Empty)
        }
        Op::Reload => Ok(StepResult::Reloaded(pipeline.reload_triggers()?)),
        Op::Insert { table_id, record } => {
            Ok(StepResult::Mutation(pipeline.insert(table_id, record.clone())?))
        }
        Op::Update {
            table_id,
            key,
            changes,
        } => Ok(StepResult::Mutation(
            pipeline.update(table_id, *key, changes.clone())?,
        )),
        Op::Delete { table_id, key } => Ok(StepResult::Mutation(pipeline.delete(table_id, *key)?)),
        Op::AdvanceClock(by) => {
            clock.advance(*by);
            Ok(StepResult::Empty)
        }
    }
}
