//! Per-run resource accounting.

use crate::{EvalError, EvalResult, SandboxConfig};
use std::time::{Duration, Instant};
use warden_core::Value;

/// Check the wall clock once every this many steps.
const CLOCK_CHECK_INTERVAL: u64 = 256;

/// Approximate cost of one value slot, whatever it holds.
pub(crate) const SLOT_BYTES: usize = 16;

/// Approximate bytes held by `value`, nested contents included.
///
/// Stops walking once the total passes `limit`, so the cost of measuring
/// is bounded by the limit and not by the value.
pub(crate) fn footprint(value: &Value, limit: usize) -> usize {
    let mut total = 0usize;
    let mut pending = vec![value];
    while let Some(value) = pending.pop() {
        total = total.saturating_add(SLOT_BYTES);
        match value {
            Value::String(s) => total = total.saturating_add(s.len()),
            Value::List(items) => pending.extend(items),
            Value::Map(map) => {
                for (key, item) in map {
                    total = total.saturating_add(key.len());
                    pending.push(item);
                }
            }
            _ => {}
        }
        if total > limit {
            break;
        }
    }
    total
}

/// Tracks the resources one snippet run has consumed.
#[derive(Debug)]
pub(crate) struct Budget {
    steps: u64,
    max_steps: u64,
    started: Instant,
    max_duration: Option<Duration>,
    max_string_bytes: usize,
    max_collection_len: usize,
    max_value_bytes: usize,
}

impl Budget {
    pub fn new(config: &SandboxConfig) -> Self {
        Self {
            steps: 0,
            max_steps: config.max_steps,
            started: Instant::now(),
            max_duration: config.max_duration(),
            max_string_bytes: config.max_string_bytes,
            max_collection_len: config.max_collection_len,
            max_value_bytes: config.max_value_bytes,
        }
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Consume one step.
    pub fn tick(&mut self) -> EvalResult<()> {
        self.steps += 1;
        if self.steps > self.max_steps {
            return Err(EvalError::quota(
                "step",
                format!("snippet exceeded {} steps", self.max_steps),
            ));
        }
        if self.steps % CLOCK_CHECK_INTERVAL == 0 {
            self.check_deadline()?;
        }
        Ok(())
    }

    fn check_deadline(&self) -> EvalResult<()> {
        if let Some(max) = self.max_duration {
            if self.started.elapsed() > max {
                return Err(EvalError::quota(
                    "time",
                    format!("snippet ran longer than {} ms", max.as_millis()),
                ));
            }
        }
        Ok(())
    }

    /// Fail before allocating a string of `len` bytes.
    pub fn check_string_len(&self, len: usize) -> EvalResult<()> {
        if len > self.max_string_bytes {
            return Err(EvalError::quota(
                "string size",
                format!("{} bytes exceeds {}", len, self.max_string_bytes),
            ));
        }
        Ok(())
    }

    /// Fail before allocating a collection of `len` elements.
    pub fn check_collection_len(&self, len: usize) -> EvalResult<()> {
        if len > self.max_collection_len {
            return Err(EvalError::quota(
                "collection size",
                format!("{} elements exceeds {}", len, self.max_collection_len),
            ));
        }
        Ok(())
    }

    /// Check a freshly produced or freshly grown value, top level and
    /// nested contents.
    pub fn check_value(&self, value: &Value) -> EvalResult<()> {
        match value {
            Value::String(s) => self.check_string_len(s.len()),
            Value::List(items) => {
                self.check_collection_len(items.len())?;
                self.check_footprint(footprint(value, self.max_value_bytes))
            }
            Value::Map(map) => {
                self.check_collection_len(map.len())?;
                self.check_footprint(footprint(value, self.max_value_bytes))
            }
            _ => Ok(()),
        }
    }

    /// Add `value` to the running size of a collection under construction.
    pub fn charge(&self, size: &mut usize, value: &Value) -> EvalResult<()> {
        *size = size.saturating_add(footprint(value, self.max_value_bytes));
        self.check_footprint(*size)
    }

    fn check_footprint(&self, size: usize) -> EvalResult<()> {
        if size > self.max_value_bytes {
            return Err(EvalError::quota(
                "value size",
                format!("value holds more than {} bytes", self.max_value_bytes),
            ));
        }
        Ok(())
    }
}
