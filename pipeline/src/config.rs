//! Pipeline and engine configuration.

use serde::{Deserialize, Serialize};
use warden_sandbox::SandboxConfig;

/// Field names the pipeline treats specially.
///
/// The primary key field is not configured here: storage declares it per
/// table, and the pipeline asks for it on every mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Never part of an update delta.
    pub created_at_field: String,
    /// Stamped before the update trigger runs; always part of an update delta.
    pub updated_at_field: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            created_at_field: "created_at".to_string(),
            updated_at_field: "updated_at".to_string(),
        }
    }
}

/// Everything a host needs to configure, loadable from one JSON document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub sandbox: SandboxConfig,
    pub pipeline: PipelineConfig,
}

impl EngineConfig {
    /// Parse a JSON document. Missing sections and fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
