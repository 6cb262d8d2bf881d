//! The evaluator: validation and execution entry points.

use crate::interpreter::Interpreter;
use crate::{
    CompileError, DiagnosticKind, ExecutionBinding, ExecutionOutcome, ExecutionResult,
    SandboxConfig, SandboxError,
};
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use warden_analyzer::{Analyzer, AnalyzerError};
use warden_core::{Clock, SystemClock, Value};
use warden_parser::{Parser, Program};

/// A validated program, ready to run any number of times.
#[derive(Debug, Clone)]
pub struct CompiledSnippet {
    program: Arc<Program>,
}

impl CompiledSnippet {
    pub fn program(&self) -> &Program {
        &self.program
    }
}

/// Validates and runs trigger snippets.
///
/// Holds only immutable configuration; every run gets a fresh interpreter,
/// so one `Evaluator` can be shared across threads.
pub struct Evaluator {
    config: SandboxConfig,
    clock: Arc<dyn Clock>,
}

impl Evaluator {
    pub fn new(config: SandboxConfig) -> Self {
        Self {
            config,
            clock: Arc::new(SystemClock),
        }
    }

    /// Use `clock` for `datetime.now` and the `time` module.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// Statically check a snippet without running it.
    pub fn validate(&self, source: &str) -> Result<(), CompileError> {
        self.compile(source).map(|_| ())
    }

    /// Validate a snippet and keep the checked program.
    pub fn compile(&self, source: &str) -> Result<CompiledSnippet, CompileError> {
        let program = self.parse(source)?;
        Analyzer::new()
            .analyze_program(&program)
            .map_err(|errors| self.truncate(errors))?;
        Ok(CompiledSnippet {
            program: Arc::new(program),
        })
    }

    fn parse(&self, source: &str) -> Result<Program, CompileError> {
        if source.len() > self.config.max_source_bytes {
            return Err(CompileError::single(
                DiagnosticKind::Syntax,
                format!(
                    "snippet is {} bytes, larger than the {} byte limit",
                    source.len(),
                    self.config.max_source_bytes
                ),
            ));
        }
        Parser::new(source)
            .and_then(|parser| parser.with_max_depth(self.config.max_nesting).parse_program())
            .map_err(|e| CompileError::from(vec![AnalyzerError::from(e)]))
    }

    fn truncate(&self, mut errors: Vec<AnalyzerError>) -> CompileError {
        errors.truncate(self.config.max_diagnostics.max(1));
        CompileError::from(errors)
    }

    /// Validate and run a snippet in one go.
    pub fn run(&self, source: &str, binding: ExecutionBinding) -> ExecutionResult {
        match self.compile(source) {
            Ok(snippet) => self.run_compiled(&snippet, binding),
            Err(err) => {
                let outcome = ExecutionOutcome::from(err);
                if let ExecutionOutcome::CapabilityViolation(message) = &outcome {
                    warn!(%message, "snippet rejected by capability check");
                }
                ExecutionResult::new(outcome)
            }
        }
    }

    /// Run an already validated snippet.
    #[instrument(name = "sandbox::run", level = "debug", skip_all)]
    pub fn run_compiled(&self, snippet: &CompiledSnippet, binding: ExecutionBinding) -> ExecutionResult {
        let mut interp = Interpreter::new(&self.config, self.clock.as_ref(), binding);
        let outcome = match interp.run(snippet.program()) {
            Ok(record) => ExecutionOutcome::Success(record),
            Err(err) => ExecutionOutcome::from(err),
        };

        let steps = interp.steps();
        match &outcome {
            ExecutionOutcome::CapabilityViolation(message) => {
                warn!(steps, %message, "snippet exceeded its capabilities")
            }
            outcome => debug!(steps, outcome = outcome.label(), "snippet finished"),
        }

        ExecutionResult {
            outcome,
            diagnostics: interp.take_output(),
            steps,
        }
    }

    /// Evaluate a standalone expression against a binding. Every module is
    /// available without `import`.
    pub fn evaluate(&self, expression: &str, binding: ExecutionBinding) -> Result<Value, SandboxError> {
        if expression.len() > self.config.max_source_bytes {
            return Err(CompileError::single(
                DiagnosticKind::Syntax,
                "expression is larger than the source limit",
            )
            .into());
        }
        let expr = warden_analyzer::analyze_expression_source(expression)
            .map_err(|errors| self.truncate(errors))?;
        let mut interp = Interpreter::new(&self.config, self.clock.as_ref(), binding);
        Ok(interp.eval(&expr)?)
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(SandboxConfig::default())
    }
}
