//! Tree-walking interpreter for validated snippets.

use crate::quota::{Budget, SLOT_BYTES};
use crate::{builtins, modules, ops};
use crate::{EvalError, EvalResult, ExecutionBinding, SandboxConfig, SNIPPET_LOG_TARGET};
use regex_lite::Regex;
use std::collections::{BTreeMap, HashMap};
use warden_analyzer::catalog::{self, OLD_RECORD, RECORD};
use warden_core::{Clock, Record, Value};
use warden_parser::{
    AssignStmt, AssignTarget, BinaryOp, Expr, ForStmt, LiteralKind, Program, Stmt, UnaryOp,
    WhileStmt,
};

/// Longest regular expression a snippet may compile.
const MAX_PATTERN_BYTES: usize = 512;

/// How a statement finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Normal,
    Break,
    Continue,
    Return,
}

/// State for one snippet run. Built fresh for every call and dropped after.
pub(crate) struct Interpreter<'a> {
    config: &'a SandboxConfig,
    clock: &'a dyn Clock,
    /// Always a `Value::Map`; assignments are rejected statically.
    record: Value,
    /// `Value::Map` for updates and deletes, `Value::Null` for inserts.
    old_record: Value,
    /// Local variable frames, innermost last.
    frames: Vec<HashMap<String, Value>>,
    budget: Budget,
    output: Vec<String>,
    regexes: HashMap<String, Regex>,
}

impl<'a> Interpreter<'a> {
    pub fn new(config: &'a SandboxConfig, clock: &'a dyn Clock, binding: ExecutionBinding) -> Self {
        Self {
            config,
            clock,
            record: Value::Map(binding.record),
            old_record: binding.old_record.map(Value::Map).unwrap_or(Value::Null),
            frames: vec![HashMap::new()],
            budget: Budget::new(config),
            output: Vec::new(),
            regexes: HashMap::new(),
        }
    }

    /// Execute a program and hand back the rewritten record.
    pub fn run(&mut self, program: &Program) -> EvalResult<Record> {
        self.exec_stmts(&program.stmts)?;
        match std::mem::replace(&mut self.record, Value::Null) {
            Value::Map(record) => Ok(record),
            other => Err(EvalError::type_error(format!(
                "record must remain a map, found {}",
                other.type_name()
            ))),
        }
    }

    pub fn steps(&self) -> u64 {
        self.budget.steps()
    }

    pub fn take_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.output)
    }

    pub(crate) fn budget(&self) -> &Budget {
        &self.budget
    }

    pub(crate) fn clock(&self) -> &dyn Clock {
        self.clock
    }

    /// Record one line of snippet output.
    pub(crate) fn emit(&mut self, line: String) {
        tracing::debug!(target: SNIPPET_LOG_TARGET, "{}", line);
        if self.output.len() < self.config.max_diagnostics {
            self.output.push(line);
        }
    }

    /// Compile a pattern once per run.
    pub(crate) fn regex(&mut self, pattern: &str) -> EvalResult<Regex> {
        if let Some(re) = self.regexes.get(pattern) {
            return Ok(re.clone());
        }
        if pattern.len() > MAX_PATTERN_BYTES {
            return Err(EvalError::quota(
                "pattern size",
                format!("{} bytes exceeds {}", pattern.len(), MAX_PATTERN_BYTES),
            ));
        }
        let re = Regex::new(pattern)
            .map_err(|e| EvalError::invalid_argument("re", e.to_string()))?;
        self.regexes.insert(pattern.to_string(), re.clone());
        Ok(re)
    }

    // ==================== STATEMENTS ====================

    fn exec_stmts(&mut self, stmts: &[Stmt]) -> EvalResult<Flow> {
        for stmt in stmts {
            match self.exec_stmt(stmt)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_block(&mut self, block: &[Stmt]) -> EvalResult<Flow> {
        self.frames.push(HashMap::new());
        let flow = self.exec_stmts(block);
        self.frames.pop();
        flow
    }

    fn exec_stmt(&mut self, stmt: &Stmt) -> EvalResult<Flow> {
        self.budget.tick()?;
        match stmt {
            Stmt::Let(l) => {
                let value = self.eval(&l.value)?;
                if let Some(frame) = self.frames.last_mut() {
                    frame.insert(l.name.clone(), value);
                }
            }
            Stmt::Assign(a) => self.exec_assign(a)?,
            Stmt::Import(_) => {}
            Stmt::If(i) => {
                for (condition, block) in &i.branches {
                    if self.condition(condition, "if")? {
                        return self.exec_block(block);
                    }
                }
                if let Some(block) = &i.else_block {
                    return self.exec_block(block);
                }
            }
            Stmt::For(f) => return self.exec_for(f),
            Stmt::While(w) => return self.exec_while(w),
            Stmt::Break(_) => return Ok(Flow::Break),
            Stmt::Continue(_) => return Ok(Flow::Continue),
            Stmt::Return(_) => return Ok(Flow::Return),
            Stmt::Expr(e) => {
                self.eval(e)?;
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_for(&mut self, stmt: &ForStmt) -> EvalResult<Flow> {
        let items: Vec<Value> = match self.eval(&stmt.iterable)? {
            Value::List(items) => items,
            Value::Map(map) => map.into_keys().map(Value::String).collect(),
            Value::String(s) => s.chars().map(|c| Value::String(c.to_string())).collect(),
            other => {
                return Err(EvalError::type_error(format!(
                    "cannot iterate over {}",
                    other.type_name()
                )))
            }
        };

        for item in items {
            self.budget.tick()?;
            self.frames.push(HashMap::from([(stmt.var.clone(), item)]));
            let flow = self.exec_stmts(&stmt.body);
            self.frames.pop();
            match flow? {
                Flow::Break => break,
                Flow::Return => return Ok(Flow::Return),
                Flow::Normal | Flow::Continue => {}
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_while(&mut self, stmt: &WhileStmt) -> EvalResult<Flow> {
        while self.condition(&stmt.condition, "while")? {
            self.budget.tick()?;
            match self.exec_block(&stmt.body)? {
                Flow::Break => break,
                Flow::Return => return Ok(Flow::Return),
                Flow::Normal | Flow::Continue => {}
            }
        }
        Ok(Flow::Normal)
    }

    /// A condition: `null` counts as false, anything but a bool is a fault.
    fn condition(&mut self, expr: &Expr, context: &str) -> EvalResult<bool> {
        let value = self.eval(expr)?;
        Ok(ops::as_logical(&value, context)?.unwrap_or(false))
    }

    fn exec_assign(&mut self, stmt: &AssignStmt) -> EvalResult<()> {
        let value = self.eval(&stmt.value)?;
        match &stmt.target {
            AssignTarget::Var(name, _) => {
                *self.local_mut(name)? = value;
            }
            AssignTarget::Field { base, field, .. } => {
                match self.container_mut(base)? {
                    Value::Map(map) => {
                        map.insert(field.clone(), value);
                    }
                    other => {
                        return Err(EvalError::type_error(format!(
                            "cannot set field '{}' on {}",
                            field,
                            other.type_name()
                        )))
                    }
                }
                self.check_grown(base)?;
            }
            AssignTarget::Index { base, index, .. } => {
                let key = self.eval(index)?;
                set_index(self.container_mut(base)?, key, value)?;
                self.check_grown(base)?;
            }
        }
        Ok(())
    }

    /// Re-measure a container after a write into it; `xs[0] = xs` nests.
    fn check_grown(&self, name: &str) -> EvalResult<()> {
        match self.var_ref(name) {
            Some(container) => self.budget.check_value(container),
            None => Ok(()),
        }
    }

    // ==================== VARIABLES ====================

    fn var_ref(&self, name: &str) -> Option<&Value> {
        match name {
            RECORD => Some(&self.record),
            OLD_RECORD => Some(&self.old_record),
            _ => self.frames.iter().rev().find_map(|frame| frame.get(name)),
        }
    }

    fn local_mut(&mut self, name: &str) -> EvalResult<&mut Value> {
        self.frames
            .iter_mut()
            .rev()
            .find_map(|frame| frame.get_mut(name))
            .ok_or_else(|| EvalError::type_error(format!("undefined variable '{}'", name)))
    }

    /// The value whose field or element an assignment writes.
    fn container_mut(&mut self, name: &str) -> EvalResult<&mut Value> {
        match name {
            RECORD => Ok(&mut self.record),
            OLD_RECORD => Err(EvalError::type_error("old_record is read-only")),
            _ => self.local_mut(name),
        }
    }

    // ==================== EXPRESSIONS ====================

    pub fn eval(&mut self, expr: &Expr) -> EvalResult<Value> {
        self.budget.tick()?;
        match expr {
            Expr::Literal(lit) => Ok(literal(&lit.kind)),
            Expr::Var(name, _) => self
                .var_ref(name)
                .cloned()
                .ok_or_else(|| EvalError::type_error(format!("undefined variable '{}'", name))),
            Expr::Field(base, field, _) => {
                // Read through a named container without cloning it.
                if let Expr::Var(name, _) = base.as_ref() {
                    if let Some(container) = self.var_ref(name) {
                        return field_of(container, field);
                    }
                }
                let container = self.eval(base)?;
                field_of(&container, field)
            }
            Expr::Index(base, index, _) => {
                let key = self.eval(index)?;
                if let Expr::Var(name, _) = base.as_ref() {
                    if let Some(container) = self.var_ref(name) {
                        return index_of(container, &key);
                    }
                }
                let container = self.eval(base)?;
                index_of(&container, &key)
            }
            Expr::Call(call) => {
                let args = self.eval_args(&call.args, None)?;
                let value = builtins::call(self, &call.name, args)?;
                self.budget.check_value(&value)?;
                Ok(value)
            }
            Expr::MethodCall(receiver, call) => {
                if let Expr::Var(name, _) = receiver.as_ref() {
                    if catalog::is_module(name) {
                        let args = self.eval_args(&call.args, None)?;
                        let value = modules::call(self, name, &call.name, args)?;
                        self.budget.check_value(&value)?;
                        return Ok(value);
                    }
                }
                let receiver = self.eval(receiver)?;
                let args = self.eval_args(&call.args, Some(receiver))?;
                let value = builtins::call(self, &call.name, args)?;
                self.budget.check_value(&value)?;
                Ok(value)
            }
            Expr::BinaryOp(op, left, right, _) => self.eval_binary(*op, left, right),
            Expr::UnaryOp(op, operand, _) => {
                let value = self.eval(operand)?;
                match op {
                    UnaryOp::Neg => ops::negate(&value),
                    UnaryOp::Not => ops::not(&value),
                }
            }
            Expr::List(items, _) => {
                self.budget.check_collection_len(items.len())?;
                let mut size = SLOT_BYTES;
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    let value = self.eval(item)?;
                    self.budget.charge(&mut size, &value)?;
                    values.push(value);
                }
                Ok(Value::List(values))
            }
            Expr::Map(entries, _) => {
                self.budget.check_collection_len(entries.len())?;
                let mut size = SLOT_BYTES;
                let mut map = BTreeMap::new();
                for (key, value) in entries {
                    let value = self.eval(value)?;
                    size = size.saturating_add(key.len());
                    self.budget.charge(&mut size, &value)?;
                    map.insert(key.clone(), value);
                }
                Ok(Value::Map(map))
            }
        }
    }

    fn eval_args(&mut self, args: &[Expr], receiver: Option<Value>) -> EvalResult<Vec<Value>> {
        let mut values = Vec::with_capacity(args.len() + 1);
        values.extend(receiver);
        for arg in args {
            values.push(self.eval(arg)?);
        }
        Ok(values)
    }

    fn eval_binary(&mut self, op: BinaryOp, left: &Expr, right: &Expr) -> EvalResult<Value> {
        match op {
            BinaryOp::And => {
                let lhs = self.eval(left)?;
                let lhs = ops::as_logical(&lhs, "and")?;
                if lhs == Some(false) {
                    return Ok(Value::Bool(false));
                }
                let rhs = self.eval(right)?;
                let rhs = ops::as_logical(&rhs, "and")?;
                Ok(match (lhs, rhs) {
                    (_, Some(false)) => Value::Bool(false),
                    (Some(true), Some(true)) => Value::Bool(true),
                    _ => Value::Null,
                })
            }
            BinaryOp::Or => {
                let lhs = self.eval(left)?;
                let lhs = ops::as_logical(&lhs, "or")?;
                if lhs == Some(true) {
                    return Ok(Value::Bool(true));
                }
                let rhs = self.eval(right)?;
                let rhs = ops::as_logical(&rhs, "or")?;
                Ok(match (lhs, rhs) {
                    (_, Some(true)) => Value::Bool(true),
                    (Some(false), Some(false)) => Value::Bool(false),
                    _ => Value::Null,
                })
            }
            BinaryOp::NullCoalesce => {
                let lhs = self.eval(left)?;
                if lhs.is_null() {
                    self.eval(right)
                } else {
                    Ok(lhs)
                }
            }
            _ => {
                let lhs = self.eval(left)?;
                let rhs = self.eval(right)?;
                if op == BinaryOp::Add {
                    match (&lhs, &rhs) {
                        (Value::String(a), Value::String(b)) => {
                            self.budget.check_string_len(a.len() + b.len())?
                        }
                        (Value::List(a), Value::List(b)) => {
                            self.budget.check_collection_len(a.len() + b.len())?
                        }
                        _ => {}
                    }
                }
                let value = ops::binary(op, &lhs, &rhs)?;
                self.budget.check_value(&value)?;
                Ok(value)
            }
        }
    }
}

fn literal(kind: &LiteralKind) -> Value {
    match kind {
        LiteralKind::Null => Value::Null,
        LiteralKind::Bool(b) => Value::Bool(*b),
        LiteralKind::Int(i) => Value::Int(*i),
        LiteralKind::Float(f) => Value::Float(*f),
        LiteralKind::String(s) => Value::String(s.clone()),
        LiteralKind::Timestamp(t) => Value::Timestamp(*t),
    }
}

/// `container.field`: missing map keys read as null.
fn field_of(container: &Value, field: &str) -> EvalResult<Value> {
    match container {
        Value::Map(map) => Ok(map.get(field).cloned().unwrap_or(Value::Null)),
        other => Err(EvalError::type_error(format!(
            "cannot read field '{}' of {}",
            field,
            other.type_name()
        ))),
    }
}

/// Resolve a possibly negative index against a length.
fn resolve_index(index: i64, len: usize) -> EvalResult<usize> {
    let resolved = if index < 0 {
        i64::try_from(len).ok().and_then(|l| l.checked_add(index))
    } else {
        Some(index)
    };
    resolved
        .and_then(|i| usize::try_from(i).ok())
        .filter(|i| *i < len)
        .ok_or(EvalError::IndexOutOfRange { index, len })
}

fn index_of(container: &Value, key: &Value) -> EvalResult<Value> {
    match (container, key) {
        (Value::List(items), Value::Int(i)) => Ok(items[resolve_index(*i, items.len())?].clone()),
        (Value::Map(map), Value::String(k)) => Ok(map.get(k).cloned().unwrap_or(Value::Null)),
        (Value::String(s), Value::Int(i)) => {
            let len = s.chars().count();
            let at = resolve_index(*i, len)?;
            Ok(s.chars()
                .nth(at)
                .map(|c| Value::String(c.to_string()))
                .unwrap_or(Value::Null))
        }
        _ => Err(EvalError::type_error(format!(
            "cannot index {} with {}",
            container.type_name(),
            key.type_name()
        ))),
    }
}

/// `container[key] = value`.
fn set_index(container: &mut Value, key: Value, value: Value) -> EvalResult<()> {
    match (container, key) {
        (Value::List(items), Value::Int(i)) => {
            let at = resolve_index(i, items.len())?;
            items[at] = value;
            Ok(())
        }
        (Value::Map(map), Value::String(k)) => {
            map.insert(k, value);
            Ok(())
        }
        (container, key) => Err(EvalError::type_error(format!(
            "cannot assign into {} with {} key",
            container.type_name(),
            key.type_name()
        ))),
    }
}
