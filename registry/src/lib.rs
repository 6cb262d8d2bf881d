//! Warden Registry
//!
//! The mapping from `(table, event)` to a validated trigger snippet.
//!
//! Responsibilities:
//! - Validate snippets before they become visible (`register`)
//! - At most one definition per `(table, event)`; replacement is atomic
//! - Concurrent lookups during writes never observe a partial entry
//! - Rebuilding the whole map from a source of truth (`reload`)

mod error;
mod registry;
mod types;

pub use error::{RegistryError, RegistryResult};
pub use registry::TriggerRegistry;
pub use types::{ReloadReport, TriggerDefinition, TriggerSource};
