//! In-memory storage with table schemas.

use super::{RowWrite, Storage, StorageError, StorageResult};
use crate::error::MutationResult;
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use warden_core::{Clock, EventKind, PrimaryKey, Record, SystemClock, TableId, Value};
use warden_registry::TriggerSource;

/// Default applied when an inserted record leaves a column unset.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnDefault {
    Value(Value),
    /// The storage clock's current time.
    Now,
}

/// A declared column. Undeclared fields are stored as given.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    /// Must be present and non-null.
    pub required: bool,
    /// No two rows may hold the same non-null value.
    pub unique: bool,
    pub default: Option<ColumnDefault>,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: false,
            unique: false,
            default: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(ColumnDefault::Value(value.into()));
        self
    }

    pub fn default_now(mut self) -> Self {
        self.default = Some(ColumnDefault::Now);
        self
    }
}

/// Table definition plus the trigger sources stored with it.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    pub primary_key: String,
    pub columns: Vec<ColumnDef>,
    pub triggers: BTreeMap<EventKind, String>,
}

impl TableSchema {
    pub fn new() -> Self {
        Self {
            primary_key: "id".to_string(),
            columns: Vec::new(),
            triggers: BTreeMap::new(),
        }
    }

    pub fn with_primary_key(mut self, name: impl Into<String>) -> Self {
        self.primary_key = name.into();
        self
    }

    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    pub fn trigger(mut self, event_kind: EventKind, source: impl Into<String>) -> Self {
        self.triggers.insert(event_kind, source.into());
        self
    }
}

impl Default for TableSchema {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
struct Table {
    schema: TableSchema,
    rows: BTreeMap<PrimaryKey, Record>,
    next_key: PrimaryKey,
}

impl Table {
    fn new(schema: TableSchema) -> Self {
        Self {
            schema,
            rows: BTreeMap::new(),
            next_key: 1,
        }
    }

    fn alloc_key(&mut self) -> PrimaryKey {
        let key = self.next_key;
        self.next_key += 1;
        key
    }

    /// Check required and unique columns for `record`, ignoring row `exclude`.
    fn check(
        &self,
        table_id: &TableId,
        record: &Record,
        exclude: Option<PrimaryKey>,
    ) -> StorageResult<()> {
        for column in &self.schema.columns {
            let value = record.get(&column.name).filter(|v| !v.is_null());
            if column.required && value.is_none() {
                return Err(StorageError::missing_required(table_id.clone(), &column.name));
            }
            if let (true, Some(value)) = (column.unique, value) {
                let taken = self
                    .rows
                    .iter()
                    .filter(|(key, _)| Some(**key) != exclude)
                    .any(|(_, row)| row.get(&column.name) == Some(value));
                if taken {
                    return Err(StorageError::unique_violation(table_id.clone(), &column.name));
                }
            }
        }
        Ok(())
    }
}

type RowLock = Arc<Mutex<()>>;

/// A `Storage` that keeps every table in memory.
///
/// One lock guards all tables for the length of a single call. `write_row`
/// additionally holds a per-row lock from its read to its write, so the
/// table lock is never held while a trigger runs.
pub struct MemoryStorage {
    tables: RwLock<HashMap<TableId, Table>>,
    row_locks: Mutex<HashMap<(TableId, PrimaryKey), RowLock>>,
    clock: Arc<dyn Clock>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            row_locks: Mutex::new(HashMap::new()),
            clock: Arc::new(SystemClock),
        }
    }

    /// Use `clock` for `ColumnDefault::Now`.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    // ==================== Table Operations ====================

    /// Define a table. Fails if it already exists.
    pub fn create_table(&self, table_id: impl Into<TableId>, schema: TableSchema) -> StorageResult<()> {
        let table_id = table_id.into();
        let mut tables = self.tables.write();
        if tables.contains_key(&table_id) {
            return Err(StorageError::backend(format!("table {} already exists", table_id)));
        }
        tables.insert(table_id, Table::new(schema));
        Ok(())
    }

    /// Remove a table and its rows. Returns whether it existed.
    pub fn drop_table(&self, table_id: &TableId) -> bool {
        self.tables.write().remove(table_id).is_some()
    }

    /// Store or clear the trigger source kept with a table.
    pub fn set_trigger_source(
        &self,
        table_id: &TableId,
        event_kind: EventKind,
        source: Option<String>,
    ) -> StorageResult<()> {
        let mut tables = self.tables.write();
        let table = tables
            .get_mut(table_id)
            .ok_or_else(|| StorageError::unknown_table(table_id.clone()))?;
        match source {
            Some(source) => table.schema.triggers.insert(event_kind, source),
            None => table.schema.triggers.remove(&event_kind),
        };
        Ok(())
    }

    fn row_lock(&self, table_id: &TableId, key: PrimaryKey) -> RowLock {
        let mut locks = self.row_locks.lock();
        Arc::clone(locks.entry((table_id.clone(), key)).or_default())
    }

    pub fn row_count(&self, table_id: &TableId) -> StorageResult<usize> {
        self.tables
            .read()
            .get(table_id)
            .map(|table| table.rows.len())
            .ok_or_else(|| StorageError::unknown_table(table_id.clone()))
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for MemoryStorage {
    fn primary_key(&self, table_id: &TableId) -> StorageResult<String> {
        let tables = self.tables.read();
        let table = tables
            .get(table_id)
            .ok_or_else(|| StorageError::unknown_table(table_id.clone()))?;
        Ok(table.schema.primary_key.clone())
    }

    fn get_record(&self, table_id: &TableId, key: PrimaryKey) -> StorageResult<Option<Record>> {
        let tables = self.tables.read();
        let table = tables
            .get(table_id)
            .ok_or_else(|| StorageError::unknown_table(table_id.clone()))?;
        Ok(table.rows.get(&key).cloned())
    }

    fn write_row(
        &self,
        table_id: &TableId,
        key: PrimaryKey,
        decide: &mut dyn FnMut(&Record) -> MutationResult<RowWrite>,
    ) -> MutationResult<bool> {
        let lock = self.row_lock(table_id, key);
        let _row = lock.lock();
        let Some(current) = self.get_record(table_id, key)? else {
            return Ok(false);
        };

        match decide(&current)? {
            RowWrite::Update(changes) => self.update_record(table_id, key, changes)?,
            RowWrite::Delete => {
                self.delete_record(table_id, key)?;
                // Keys are never reused; late waiters on this lock find no row.
                self.row_locks.lock().remove(&(table_id.clone(), key));
            }
        }
        Ok(true)
    }

    fn fill_defaults(&self, table_id: &TableId, record: &mut Record) -> StorageResult<()> {
        let tables = self.tables.read();
        let table = tables
            .get(table_id)
            .ok_or_else(|| StorageError::unknown_table(table_id.clone()))?;
        for column in &table.schema.columns {
            let Some(default) = &column.default else {
                continue;
            };
            if record.get(&column.name).map_or(true, Value::is_null) {
                let value = match default {
                    ColumnDefault::Value(value) => value.clone(),
                    ColumnDefault::Now => Value::Timestamp(self.clock.now()),
                };
                record.insert(column.name.clone(), value);
            }
        }
        Ok(())
    }

    fn insert_record(&self, table_id: &TableId, mut record: Record) -> StorageResult<PrimaryKey> {
        let mut tables = self.tables.write();
        let table = tables
            .get_mut(table_id)
            .ok_or_else(|| StorageError::unknown_table(table_id.clone()))?;
        record.remove(&table.schema.primary_key);
        table.check(table_id, &record, None)?;

        let key = table.alloc_key();
        record.insert(table.schema.primary_key.clone(), Value::Int(key));
        table.rows.insert(key, record);
        Ok(key)
    }

    fn update_record(
        &self,
        table_id: &TableId,
        key: PrimaryKey,
        changes: Record,
    ) -> StorageResult<()> {
        let mut tables = self.tables.write();
        let table = tables
            .get_mut(table_id)
            .ok_or_else(|| StorageError::unknown_table(table_id.clone()))?;
        let mut updated = table
            .rows
            .get(&key)
            .cloned()
            .ok_or_else(|| StorageError::not_found(table_id.clone(), key))?;

        let primary_key = table.schema.primary_key.clone();
        updated.extend(changes.into_iter().filter(|(field, _)| *field != primary_key));
        table.check(table_id, &updated, Some(key))?;
        table.rows.insert(key, updated);
        Ok(())
    }

    fn delete_record(&self, table_id: &TableId, key: PrimaryKey) -> StorageResult<()> {
        let mut tables = self.tables.write();
        let table = tables
            .get_mut(table_id)
            .ok_or_else(|| StorageError::unknown_table(table_id.clone()))?;
        table
            .rows
            .remove(&key)
            .map(|_| ())
            .ok_or_else(|| StorageError::not_found(table_id.clone(), key))
    }

    fn list_records(
        &self,
        table_id: &TableId,
        limit: usize,
        offset: usize,
    ) -> StorageResult<Vec<Record>> {
        let tables = self.tables.read();
        let table = tables
            .get(table_id)
            .ok_or_else(|| StorageError::unknown_table(table_id.clone()))?;
        Ok(table.rows.values().skip(offset).take(limit).cloned().collect())
    }

    fn search_records(&self, table_id: &TableId, conditions: &Record) -> StorageResult<Vec<Record>> {
        let tables = self.tables.read();
        let table = tables
            .get(table_id)
            .ok_or_else(|| StorageError::unknown_table(table_id.clone()))?;
        let matches = |row: &Record| {
            conditions.iter().all(|(field, wanted)| {
                !wanted.is_null() && row.get(field).map_or(false, |value| value.loose_eq(wanted))
            })
        };
        Ok(table.rows.values().filter(|row| matches(row)).cloned().collect())
    }

    fn list_trigger_definitions(&self) -> StorageResult<Vec<TriggerSource>> {
        let tables = self.tables.read();
        let mut sources: Vec<TriggerSource> = tables
            .iter()
            .flat_map(|(table_id, table)| {
                table.schema.triggers.iter().map(move |(event_kind, source)| {
                    TriggerSource::new(table_id.clone(), *event_kind, source.clone())
                })
            })
            .collect();
        sources.sort_by(|a, b| (&a.table_id, a.event_kind).cmp(&(&b.table_id, b.event_kind)));
        Ok(sources)
    }
}
