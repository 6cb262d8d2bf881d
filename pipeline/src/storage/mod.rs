//! The storage collaborator.
//!
//! The pipeline never talks to a database directly. It reads and writes rows
//! through `Storage`, which also owns the schema: defaults, the primary key
//! field, and row-level atomicity of a read followed by a write.

mod memory;

pub use memory::{ColumnDef, ColumnDefault, MemoryStorage, TableSchema};

use crate::error::MutationResult;
use thiserror::Error;
use warden_core::{PrimaryKey, Record, TableId};
use warden_registry::TriggerSource;

/// The write chosen for a row by `Storage::write_row`.
#[derive(Debug, Clone, PartialEq)]
pub enum RowWrite {
    /// Merge these fields into the row.
    Update(Record),
    Delete,
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors reported by a storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("unknown table: {0}")]
    UnknownTable(TableId),

    #[error("record {key} not found in table {table_id}")]
    NotFound { table_id: TableId, key: PrimaryKey },

    #[error("missing required field '{field}' in table {table_id}")]
    MissingRequired { table_id: TableId, field: String },

    #[error("duplicate value for unique field '{field}' in table {table_id}")]
    UniqueViolation { table_id: TableId, field: String },

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StorageError {
    pub fn unknown_table(table_id: impl Into<TableId>) -> Self {
        Self::UnknownTable(table_id.into())
    }

    pub fn not_found(table_id: impl Into<TableId>, key: PrimaryKey) -> Self {
        Self::NotFound {
            table_id: table_id.into(),
            key,
        }
    }

    pub fn missing_required(table_id: impl Into<TableId>, field: impl Into<String>) -> Self {
        Self::MissingRequired {
            table_id: table_id.into(),
            field: field.into(),
        }
    }

    pub fn unique_violation(table_id: impl Into<TableId>, field: impl Into<String>) -> Self {
        Self::UniqueViolation {
            table_id: table_id.into(),
            field: field.into(),
        }
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }
}

/// Row persistence as seen by the mutation pipeline.
pub trait Storage: Send + Sync {
    /// Name of the field that carries a table's primary key.
    fn primary_key(&self, table_id: &TableId) -> StorageResult<String>;

    /// Fetch one row, primary key field included.
    fn get_record(&self, table_id: &TableId, key: PrimaryKey) -> StorageResult<Option<Record>>;

    /// Read row `key`, let `decide` pick a write from its current state, and
    /// apply that write. No other `write_row` on the same row may interleave
    /// between the read and the write.
    ///
    /// Returns `false` without calling `decide` when the row does not exist.
    /// An error from `decide` leaves the row untouched.
    fn write_row(
        &self,
        table_id: &TableId,
        key: PrimaryKey,
        decide: &mut dyn FnMut(&Record) -> MutationResult<RowWrite>,
    ) -> MutationResult<bool>;

    /// Fill in schema defaults for fields the record does not set.
    fn fill_defaults(&self, table_id: &TableId, record: &mut Record) -> StorageResult<()>;

    /// Store a new row and return the key assigned to it. The record carries
    /// no primary key field.
    fn insert_record(&self, table_id: &TableId, record: Record) -> StorageResult<PrimaryKey>;

    /// Apply `changes` to an existing row. Fields not in `changes` keep their
    /// stored values.
    fn update_record(
        &self,
        table_id: &TableId,
        key: PrimaryKey,
        changes: Record,
    ) -> StorageResult<()>;

    fn delete_record(&self, table_id: &TableId, key: PrimaryKey) -> StorageResult<()>;

    /// Rows in key order.
    fn list_records(
        &self,
        table_id: &TableId,
        limit: usize,
        offset: usize,
    ) -> StorageResult<Vec<Record>>;

    /// Rows, in key order, whose fields equal every field of `conditions`.
    /// A null condition matches no row.
    fn search_records(&self, table_id: &TableId, conditions: &Record) -> StorageResult<Vec<Record>>;

    /// The stored trigger sources, used to rebuild the registry.
    fn list_trigger_definitions(&self) -> StorageResult<Vec<TriggerSource>>;
}
