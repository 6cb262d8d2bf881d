//! Evaluator limits.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Quotas applied to every snippet run. Exceeding any of them is a
/// capability violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// Interpreter steps (statements, expressions and loop iterations).
    pub max_steps: u64,
    /// Wall-clock budget in milliseconds; `None` disables the check.
    pub max_duration_ms: Option<u64>,
    /// Largest string a snippet may build, in bytes.
    pub max_string_bytes: usize,
    /// Largest list or map a snippet may build.
    pub max_collection_len: usize,
    /// Largest value a snippet may hold, nested contents included, in
    /// approximate bytes.
    pub max_value_bytes: usize,
    /// Deepest expression or block nesting accepted by the parser.
    pub max_nesting: usize,
    /// Largest accepted snippet source, in bytes.
    pub max_source_bytes: usize,
    /// Lines of `print` output kept per run; further lines are dropped.
    pub max_diagnostics: usize,
}

impl SandboxConfig {
    pub fn max_duration(&self) -> Option<Duration> {
        self.max_duration_ms.map(Duration::from_millis)
    }
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            max_steps: 100_000,
            max_duration_ms: Some(250),
            max_string_bytes: 1 << 20,
            max_collection_len: 100_000,
            max_value_bytes: 16 << 20,
            max_nesting: warden_parser::MAX_NESTING_DEPTH,
            max_source_bytes: 64 * 1024,
            max_diagnostics: 100,
        }
    }
}
