//! Assertion types and builders for verifying step results.

use warden_core::{PrimaryKey, Record, TableId, Value};
use warden_pipeline::{MemoryStorage, MutationError, MutationOutcome, Storage};
use warden_registry::ReloadReport;
use warden_sandbox::CompileError;

use crate::error::{ScenarioError, ScenarioResult};

/// The failure class of a step, matching the pipeline's error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Compile,
    Capability,
    Validation,
    Runtime,
    NotFound,
    Persistence,
}

impl From<&MutationError> for ErrorKind {
    fn from(err: &MutationError) -> Self {
        match err {
            MutationError::CompileError { .. } => ErrorKind::Compile,
            MutationError::CapabilityViolation { .. } => ErrorKind::Capability,
            MutationError::ValidationFailure { .. } => ErrorKind::Validation,
            MutationError::RuntimeFailure { .. } => ErrorKind::Runtime,
            MutationError::NotFound { .. } => ErrorKind::NotFound,
            MutationError::PersistenceFailure(_) => ErrorKind::Persistence,
        }
    }
}

impl From<&CompileError> for ErrorKind {
    fn from(err: &CompileError) -> Self {
        match err.capability_violation() {
            Some(_) => ErrorKind::Capability,
            None => ErrorKind::Compile,
        }
    }
}

/// What a successful step produced.
#[derive(Debug, Clone, PartialEq)]
pub enum StepResult {
    Mutation(MutationOutcome),
    Registered,
    Reloaded(ReloadReport),
    /// Steps with nothing to report, such as moving the clock.
    Empty,
}

/// A failed step, flattened for matching.
#[derive(Debug, Clone, PartialEq)]
pub struct StepError {
    pub kind: ErrorKind,
    pub messages: Vec<String>,
    pub display: String,
}

impl From<MutationError> for StepError {
    fn from(err: MutationError) -> Self {
        Self {
            kind: ErrorKind::from(&err),
            messages: err.messages(),
            display: err.to_string(),
        }
    }
}

impl From<CompileError> for StepError {
    fn from(err: CompileError) -> Self {
        Self {
            kind: ErrorKind::from(&err),
            messages: err.messages(),
            display: err.to_string(),
        }
    }
}

/// A complete assertion for a step result.
#[derive(Default)]
pub struct Assertion {
    // Success assertions
    pub ok: bool,
    pub executed: Option<bool>,
    pub fields: Vec<(String, Value)>,
    pub absent: Vec<String>,
    pub record: Option<Record>,
    pub diagnostics: Option<Vec<String>>,
    pub loaded: Option<usize>,
    pub rejected: Option<usize>,

    // Storage assertions, checked whether the step succeeded or not
    pub rows: Option<usize>,
    pub persisted: Vec<(PrimaryKey, Option<Record>)>,

    // Error assertions
    pub error: Option<String>,
    pub error_pattern: Option<String>,
    pub error_kind: Option<ErrorKind>,
    pub error_messages: Option<Vec<String>>,

    // Custom assertion function
    #[allow(clippy::type_complexity)]
    pub custom: Option<Box<dyn Fn(&StepResult) -> bool + Send + Sync>>,
}

impl std::fmt::Debug for Assertion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assertion")
            .field("ok", &self.ok)
            .field("executed", &self.executed)
            .field("fields", &self.fields)
            .field("record", &self.record)
            .field("rows", &self.rows)
            .field("error", &self.error)
            .field("error_kind", &self.error_kind)
            .field("custom", &self.custom.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl Assertion {
    /// Create a new empty assertion.
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== Builders ====================

    /// Expect the step to succeed, with nothing else checked.
    pub fn ok(mut self) -> Self {
        self.ok = true;
        self
    }

    pub fn executed(mut self, executed: bool) -> Self {
        self.ok = true;
        self.executed = Some(executed);
        self
    }

    /// Expect the resulting record to hold `value` in `name`.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.ok = true;
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Expect the resulting record not to have `name` at all.
    pub fn absent(mut self, name: impl Into<String>) -> Self {
        self.ok = true;
        self.absent.push(name.into());
        self
    }

    /// Expect the resulting record to be exactly `record`.
    pub fn record(mut self, record: Record) -> Self {
        self.ok = true;
        self.record = Some(record);
        self
    }

    pub fn diagnostics(mut self, lines: &[&str]) -> Self {
        self.ok = true;
        self.diagnostics = Some(lines.iter().map(|l| l.to_string()).collect());
        self
    }

    pub fn loaded(mut self, count: usize) -> Self {
        self.ok = true;
        self.loaded = Some(count);
        self
    }

    pub fn rejected(mut self, count: usize) -> Self {
        self.ok = true;
        self.rejected = Some(count);
        self
    }

    /// Expect the step's table to hold `count` rows afterwards.
    pub fn rows(mut self, count: usize) -> Self {
        self.rows = Some(count);
        self
    }

    /// Expect row `key` of the step's table to be exactly `record` afterwards.
    pub fn persisted(mut self, key: PrimaryKey, record: Record) -> Self {
        self.persisted.push((key, Some(record)));
        self
    }

    /// Expect row `key` of the step's table not to exist afterwards.
    pub fn gone(mut self, key: PrimaryKey) -> Self {
        self.persisted.push((key, None));
        self
    }

    /// Expect an error whose display contains `fragment`.
    pub fn error(mut self, fragment: impl Into<String>) -> Self {
        self.error = Some(fragment.into());
        self
    }

    pub fn error_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.error_pattern = Some(pattern.into());
        self
    }

    pub fn error_kind(mut self, kind: ErrorKind) -> Self {
        self.error_kind = Some(kind);
        self
    }

    /// Expect an error carrying exactly these messages.
    pub fn error_messages(mut self, messages: &[&str]) -> Self {
        self.error_messages = Some(messages.iter().map(|m| m.to_string()).collect());
        self
    }

    pub fn custom(mut self, check: impl Fn(&StepResult) -> bool + Send + Sync + 'static) -> Self {
        self.ok = true;
        self.custom = Some(Box::new(check));
        self
    }

    fn expects_error(&self) -> bool {
        self.error.is_some()
            || self.error_pattern.is_some()
            || self.error_kind.is_some()
            || self.error_messages.is_some()
    }

    // ==================== Verification ====================

    /// Verify the assertion against a step result and the storage it ran on.
    pub fn verify(
        &self,
        step: &str,
        result: &Result<StepResult, StepError>,
        storage: &MemoryStorage,
        table_id: Option<&TableId>,
    ) -> ScenarioResult<()> {
        match result {
            Err(err) if self.expects_error() => self.verify_error(step, err)?,
            Err(err) => {
                return Err(ScenarioError::assertion_failed(
                    step,
                    format!("step failed: {}", err.display),
                ))
            }
            Ok(_) if self.expects_error() => {
                return Err(ScenarioError::assertion_failed(
                    step,
                    "expected an error, but step succeeded",
                ))
            }
            Ok(value) => self.verify_success(step, value)?,
        }

        self.verify_storage(step, storage, table_id)
    }

    fn verify_error(&self, step: &str, err: &StepError) -> ScenarioResult<()> {
        if let Some(kind) = self.error_kind {
            if err.kind != kind {
                return Err(ScenarioError::assertion_failed(
                    step,
                    format!("expected {:?} error, got {:?}: {}", kind, err.kind, err.display),
                ));
            }
        }

        if let Some(ref fragment) = self.error {
            if !err.display.contains(fragment.as_str()) {
                return Err(ScenarioError::assertion_failed(
                    step,
                    format!("expected error containing '{}', got: {}", fragment, err.display),
                ));
            }
        }

        if let Some(ref pattern) = self.error_pattern {
            let re = regex_lite::Regex::new(pattern).map_err(|e| {
                ScenarioError::assertion_failed(step, format!("invalid regex pattern: {}", e))
            })?;
            if !re.is_match(&err.display) {
                return Err(ScenarioError::assertion_failed(
                    step,
                    format!("expected error matching '{}', got: {}", pattern, err.display),
                ));
            }
        }

        if let Some(ref expected) = self.error_messages {
            if err.messages != *expected {
                return Err(ScenarioError::assertion_failed(
                    step,
                    format!(
                        "error messages mismatch:\n  expected: {:?}\n  actual:   {:?}",
                        expected, err.messages
                    ),
                ));
            }
        }

        Ok(())
    }

    fn verify_success(&self, step: &str, result: &StepResult) -> ScenarioResult<()> {
        if let Some(ref custom) = self.custom {
            if !custom(result) {
                return Err(ScenarioError::assertion_failed(step, "custom assertion failed"));
            }
        }

        match result {
            StepResult::Mutation(outcome) => self.verify_mutation(step, outcome),
            StepResult::Reloaded(report) => self.verify_reload(step, report),
            StepResult::Registered | StepResult::Empty => Ok(()),
        }
    }

    fn verify_mutation(&self, step: &str, outcome: &MutationOutcome) -> ScenarioResult<()> {
        if let Some(expected) = self.executed {
            if outcome.executed != expected {
                return Err(ScenarioError::assertion_failed(
                    step,
                    format!("expected executed={}, got {}", expected, outcome.executed),
                ));
            }
        }

        for (name, expected) in &self.fields {
            let actual = outcome.get(name);
            if actual != Some(expected) {
                return Err(ScenarioError::assertion_failed(
                    step,
                    format!(
                        "field '{}' mismatch:\n  expected: {:?}\n  actual:   {:?}",
                        name, expected, actual
                    ),
                ));
            }
        }

        for name in &self.absent {
            if let Some(actual) = outcome.get(name) {
                return Err(ScenarioError::assertion_failed(
                    step,
                    format!("expected no field '{}', got {:?}", name, actual),
                ));
            }
        }

        if let Some(ref expected) = self.record {
            if outcome.record != *expected {
                return Err(ScenarioError::assertion_failed(
                    step,
                    format!(
                        "record mismatch:\n  expected: {:?}\n  actual:   {:?}",
                        expected, outcome.record
                    ),
                ));
            }
        }

        if let Some(ref expected) = self.diagnostics {
            if outcome.diagnostics != *expected {
                return Err(ScenarioError::assertion_failed(
                    step,
                    format!(
                        "diagnostics mismatch:\n  expected: {:?}\n  actual:   {:?}",
                        expected, outcome.diagnostics
                    ),
                ));
            }
        }

        Ok(())
    }

    fn verify_reload(&self, step: &str, report: &ReloadReport) -> ScenarioResult<()> {
        if let Some(expected) = self.loaded {
            if report.loaded != expected {
                return Err(ScenarioError::assertion_failed(
                    step,
                    format!("expected {} loaded, got {}", expected, report.loaded),
                ));
            }
        }

        if let Some(expected) = self.rejected {
            if report.rejected.len() != expected {
                return Err(ScenarioError::assertion_failed(
                    step,
                    format!("expected {} rejected, got {}", expected, report.rejected.len()),
                ));
            }
        }

        Ok(())
    }

    fn verify_storage(
        &self,
        step: &str,
        storage: &MemoryStorage,
        table_id: Option<&TableId>,
    ) -> ScenarioResult<()> {
        if self.rows.is_none() && self.persisted.is_empty() {
            return Ok(());
        }
        let table_id = table_id.ok_or_else(|| {
            ScenarioError::assertion_failed(step, "storage assertion on a step without a table")
        })?;

        if let Some(expected) = self.rows {
            let actual = storage
                .row_count(table_id)
                .map_err(|e| ScenarioError::assertion_failed(step, e.to_string()))?;
            if actual != expected {
                return Err(ScenarioError::assertion_failed(
                    step,
                    format!("expected {} rows, got {}", expected, actual),
                ));
            }
        }

        for (key, expected) in &self.persisted {
            let actual = storage
                .get_record(table_id, *key)
                .map_err(|e| ScenarioError::assertion_failed(step, e.to_string()))?;
            if actual != *expected {
                return Err(ScenarioError::assertion_failed(
                    step,
                    format!(
                        "stored row {} mismatch:\n  expected: {:?}\n  actual:   {:?}",
                        key, expected, actual
                    ),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::record;

    fn outcome() -> Result<StepResult, StepError> {
        Ok(StepResult::Mutation(MutationOutcome {
            record: record! { "id" => 1i64, "name" => "x" },
            executed: true,
            diagnostics: Vec::new(),
        }))
    }

    #[test]
    fn test_field_assertions() {
        let storage = MemoryStorage::new();
        let passing = Assertion::new().executed(true).field("name", "x").absent("email");
        assert!(passing.verify("s", &outcome(), &storage, None).is_ok());

        let failing = Assertion::new().field("name", "y");
        assert!(failing.verify("s", &outcome(), &storage, None).is_err());
    }

    #[test]
    fn test_error_expected_but_succeeded() {
        let storage = MemoryStorage::new();
        let assertion = Assertion::new().error_kind(ErrorKind::Validation);
        assert!(assertion.verify("s", &outcome(), &storage, None).is_err());
    }

    #[test]
    fn test_error_assertions() {
        // GIVEN
        let storage = MemoryStorage::new();
        let result = Err(StepError::from(MutationError::ValidationFailure {
            messages: vec!["too low".into()],
        }));

        // WHEN
        let assertion = Assertion::new()
            .error_kind(ErrorKind::Validation)
            .error("too low")
            .error_pattern("^validation failed")
            .error_messages(&["too low"]);

        // THEN
        assert!(assertion.verify("s", &result, &storage, None).is_ok());
    }
}
