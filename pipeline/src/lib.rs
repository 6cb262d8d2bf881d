//! Warden Pipeline
//!
//! Sequence trigger execution around record persistence.
//!
//! Responsibilities:
//! - Build the snippet binding for insert, update and delete
//! - Abort the write on any trigger failure, with zero storage mutation
//! - Persist what a successful trigger returned: the storage-assigned key on
//!   insert, only the changed fields on update, the deletion on delete
//!
//! # Module Structure
//!
//! - `pipeline` - `MutationPipeline`, the public entry points
//! - `ops/` - One module per mutation (insert, update, delete)
//! - `storage/` - The `Storage` collaborator trait and `MemoryStorage`
//! - `config` - Pipeline and engine configuration
//! - `error` - Error types for mutation failures
//! - `result` - Result types for mutation outcomes

mod config;
mod error;
mod ops;
mod pipeline;
mod result;
mod storage;

pub use config::{EngineConfig, PipelineConfig};
pub use error::{MutationError, MutationResult};
pub use pipeline::MutationPipeline;
pub use result::MutationOutcome;
pub use storage::{
    ColumnDef, ColumnDefault, MemoryStorage, RowWrite, Storage, StorageError, StorageResult,
    TableSchema,
};
