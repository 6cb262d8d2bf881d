//! Global builtin functions.
//!
//! Arity has already been checked statically; argument types are checked
//! here. String functions count characters, not bytes.

use crate::interpreter::Interpreter;
use crate::{ops, EvalError, EvalResult};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use std::cmp::Ordering;
use warden_core::Value;
use warden_parser::BinaryOp;

/// Builtins that return `null` when their first argument is `null`.
const NULL_PROPAGATING: &[&str] = &[
    "len",
    "lower",
    "upper",
    "trim",
    "substring",
    "starts_with",
    "ends_with",
    "replace",
    "split",
    "int",
    "float",
    "abs",
    "floor",
    "ceil",
    "round",
];

pub(crate) fn call(interp: &mut Interpreter<'_>, name: &str, args: Vec<Value>) -> EvalResult<Value> {
    if args.first().map_or(false, Value::is_null) && NULL_PROPAGATING.contains(&name) {
        return Ok(Value::Null);
    }

    match name {
        // strings
        "len" => len(&args),
        "lower" => Ok(Value::String(string_arg(&args, 0, name)?.to_lowercase())),
        "upper" => Ok(Value::String(string_arg(&args, 0, name)?.to_uppercase())),
        "trim" => Ok(Value::from(string_arg(&args, 0, name)?.trim())),
        "substring" => substring(&args),
        "starts_with" => Ok(Value::Bool(
            string_arg(&args, 0, name)?.starts_with(string_arg(&args, 1, name)?),
        )),
        "ends_with" => Ok(Value::Bool(
            string_arg(&args, 0, name)?.ends_with(string_arg(&args, 1, name)?),
        )),
        "contains" => ops::contains(arg(&args, 0, name)?, arg(&args, 1, name)?).map(Value::Bool),
        "replace" => replace(interp, &args),
        "split" => split(interp, &args),
        "join" => join(interp, &args),

        // conversion
        "str" => Ok(Value::String(arg(&args, 0, name)?.to_string())),
        "int" => to_int(arg(&args, 0, name)?),
        "float" => to_float(arg(&args, 0, name)?),
        "type_of" => Ok(Value::from(arg(&args, 0, name)?.type_name())),

        // numbers
        "abs" => abs(arg(&args, 0, name)?),
        "floor" => floor_ceil(arg(&args, 0, name)?, name, f64::floor, Decimal::floor),
        "ceil" => floor_ceil(arg(&args, 0, name)?, name, f64::ceil, Decimal::ceil),
        "round" => round(&args),
        "min" => extreme(&args, name, Ordering::Less),
        "max" => extreme(&args, name, Ordering::Greater),
        "sum" => sum(&args),

        // nulls
        "coalesce" => Ok(args.into_iter().find(|v| !v.is_null()).unwrap_or(Value::Null)),
        "is_null" => Ok(Value::Bool(arg(&args, 0, name)?.is_null())),

        // collections
        "keys" => Ok(Value::List(
            map_arg(&args, 0, name)?
                .keys()
                .map(|k| Value::String(k.clone()))
                .collect(),
        )),
        "values" => Ok(Value::List(map_arg(&args, 0, name)?.values().cloned().collect())),
        "has" => has(&args),
        "push" => push(interp, args),
        "range" => range(interp, &args),

        // effects
        "print" => {
            let line = args
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" ");
            interp.emit(line);
            Ok(Value::Null)
        }
        "reject" => {
            let mut messages = Vec::new();
            for value in args {
                match value {
                    Value::List(items) => messages.extend(items.iter().map(ToString::to_string)),
                    other => messages.push(other.to_string()),
                }
            }
            Err(EvalError::Rejected { messages })
        }

        _ => Err(EvalError::forbidden(name)),
    }
}

// ==================== ARGUMENTS ====================

pub(crate) fn arg<'v>(args: &'v [Value], index: usize, function: &str) -> EvalResult<&'v Value> {
    args.get(index).ok_or_else(|| {
        EvalError::invalid_argument(function, format!("missing argument {}", index + 1))
    })
}

fn expected(function: &str, what: &str, found: &Value) -> EvalError {
    EvalError::type_error(format!(
        "{} expects {}, got {}",
        function,
        what,
        found.type_name()
    ))
}

pub(crate) fn string_arg<'v>(args: &'v [Value], index: usize, function: &str) -> EvalResult<&'v str> {
    let value = arg(args, index, function)?;
    value.as_str().ok_or_else(|| expected(function, "a string", value))
}

pub(crate) fn int_arg(args: &[Value], index: usize, function: &str) -> EvalResult<i64> {
    let value = arg(args, index, function)?;
    value.as_int().ok_or_else(|| expected(function, "an int", value))
}

pub(crate) fn float_arg(args: &[Value], index: usize, function: &str) -> EvalResult<f64> {
    let value = arg(args, index, function)?;
    match value {
        Value::Decimal(d) => d.to_f64().ok_or_else(|| EvalError::overflow(function)),
        other => other.as_float().ok_or_else(|| expected(function, "a number", other)),
    }
}

fn list_arg<'v>(args: &'v [Value], index: usize, function: &str) -> EvalResult<&'v [Value]> {
    let value = arg(args, index, function)?;
    value.as_list().ok_or_else(|| expected(function, "a list", value))
}

fn map_arg<'v>(
    args: &'v [Value],
    index: usize,
    function: &str,
) -> EvalResult<&'v std::collections::BTreeMap<String, Value>> {
    let value = arg(args, index, function)?;
    value.as_map().ok_or_else(|| expected(function, "a map", value))
}

// ==================== STRINGS ====================

fn len(args: &[Value]) -> EvalResult<Value> {
    let n = match arg(args, 0, "len")? {
        Value::String(s) => s.chars().count(),
        Value::List(items) => items.len(),
        Value::Map(map) => map.len(),
        other => return Err(expected("len", "a string, list or map", other)),
    };
    i64::try_from(n).map(Value::Int).map_err(|_| EvalError::overflow("len"))
}

/// Character offset, negative values counting from the end, clamped.
fn clamp_offset(offset: i64, len: usize) -> usize {
    let len_i = i64::try_from(len).unwrap_or(i64::MAX);
    let resolved = if offset < 0 {
        len_i.saturating_add(offset).max(0)
    } else {
        offset.min(len_i)
    };
    usize::try_from(resolved).unwrap_or(len)
}

fn substring(args: &[Value]) -> EvalResult<Value> {
    let s = string_arg(args, 0, "substring")?;
    let count = s.chars().count();
    let start = clamp_offset(int_arg(args, 1, "substring")?, count);
    let end = match args.get(2) {
        None | Some(Value::Null) => count,
        Some(_) => clamp_offset(int_arg(args, 2, "substring")?, count),
    };
    if start >= end {
        return Ok(Value::from(""));
    }
    Ok(Value::String(s.chars().skip(start).take(end - start).collect()))
}

fn replace(interp: &Interpreter<'_>, args: &[Value]) -> EvalResult<Value> {
    let s = string_arg(args, 0, "replace")?;
    let from = string_arg(args, 1, "replace")?;
    let to = string_arg(args, 2, "replace")?;
    let hits = s.matches(from).count();
    let grown = to.len().saturating_sub(from.len()).saturating_mul(hits);
    interp.budget().check_string_len(s.len().saturating_add(grown))?;
    Ok(Value::String(s.replace(from, to)))
}

fn split(interp: &Interpreter<'_>, args: &[Value]) -> EvalResult<Value> {
    let s = string_arg(args, 0, "split")?;
    let sep = string_arg(args, 1, "split")?;
    if sep.is_empty() {
        return Err(EvalError::invalid_argument("split", "empty separator"));
    }
    interp
        .budget()
        .check_collection_len(s.matches(sep).count().saturating_add(1))?;
    Ok(Value::List(s.split(sep).map(Value::from).collect()))
}

fn join(interp: &Interpreter<'_>, args: &[Value]) -> EvalResult<Value> {
    let items = list_arg(args, 0, "join")?;
    let sep = string_arg(args, 1, "join")?;
    let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
    let total = parts.iter().map(String::len).sum::<usize>()
        + sep.len().saturating_mul(parts.len().saturating_sub(1));
    interp.budget().check_string_len(total)?;
    Ok(Value::String(parts.join(sep)))
}

// ==================== CONVERSION ====================

fn float_to_int(f: f64, function: &str) -> EvalResult<i64> {
    if !f.is_finite() || f < i64::MIN as f64 || f >= i64::MAX as f64 {
        return Err(EvalError::overflow(function));
    }
    Ok(f as i64)
}

fn to_int(value: &Value) -> EvalResult<Value> {
    match value {
        Value::Int(i) => Ok(Value::Int(*i)),
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::Float(f) => float_to_int(f.trunc(), "int").map(Value::Int),
        Value::Decimal(d) => d
            .trunc()
            .to_i64()
            .map(Value::Int)
            .ok_or_else(|| EvalError::overflow("int")),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| EvalError::invalid_argument("int", format!("'{}' is not an integer", s))),
        other => Err(expected("int", "a number or string", other)),
    }
}

fn to_float(value: &Value) -> EvalResult<Value> {
    match value {
        Value::Int(i) => Ok(Value::Float(*i as f64)),
        Value::Float(f) => Ok(Value::Float(*f)),
        Value::Decimal(d) => d
            .to_f64()
            .map(Value::Float)
            .ok_or_else(|| EvalError::overflow("float")),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| EvalError::invalid_argument("float", format!("'{}' is not a number", s))),
        other => Err(expected("float", "a number or string", other)),
    }
}

// ==================== NUMBERS ====================

fn abs(value: &Value) -> EvalResult<Value> {
    match value {
        Value::Int(i) => i
            .checked_abs()
            .map(Value::Int)
            .ok_or_else(|| EvalError::overflow("abs")),
        Value::Float(f) => Ok(Value::Float(f.abs())),
        Value::Decimal(d) => Ok(Value::Decimal(d.abs())),
        other => Err(expected("abs", "a number", other)),
    }
}

fn floor_ceil(
    value: &Value,
    function: &str,
    on_float: fn(f64) -> f64,
    on_decimal: fn(&Decimal) -> Decimal,
) -> EvalResult<Value> {
    match value {
        Value::Int(i) => Ok(Value::Int(*i)),
        Value::Float(f) => float_to_int(on_float(*f), function).map(Value::Int),
        Value::Decimal(d) => Ok(Value::Decimal(on_decimal(d))),
        other => Err(expected(function, "a number", other)),
    }
}

/// `round(x)` rounds half away from zero to an int; `round(x, n)` keeps the
/// value's type with `n` fractional digits.
fn round(args: &[Value]) -> EvalResult<Value> {
    let digits = match args.get(1) {
        None => None,
        Some(_) => Some(int_arg(args, 1, "round")?),
    };
    match (arg(args, 0, "round")?, digits) {
        (Value::Int(i), _) => Ok(Value::Int(*i)),
        (Value::Float(f), None) => float_to_int(f.round(), "round").map(Value::Int),
        (Value::Float(f), Some(n)) => {
            let n = i32::try_from(n.clamp(-15, 15)).unwrap_or(0);
            let scale = 10f64.powi(n);
            Ok(Value::Float((f * scale).round() / scale))
        }
        (Value::Decimal(d), digits) => {
            let dp = u32::try_from(digits.unwrap_or(0).max(0)).unwrap_or(0);
            Ok(Value::Decimal(
                d.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero),
            ))
        }
        (other, _) => Err(expected("round", "a number", other)),
    }
}

/// `min`/`max` over the arguments, or over a single list argument. Nulls are
/// skipped.
fn extreme(args: &[Value], function: &str, keep: Ordering) -> EvalResult<Value> {
    let items: &[Value] = match args {
        [Value::List(items)] => items,
        _ => args,
    };
    let mut best: Option<&Value> = None;
    for item in items.iter().filter(|v| !v.is_null()) {
        best = match best {
            None => Some(item),
            Some(current) => match item.compare(current) {
                Some(order) if order == keep => Some(item),
                Some(_) => Some(current),
                None => {
                    return Err(EvalError::type_error(format!(
                        "{} cannot compare {} and {}",
                        function,
                        item.type_name(),
                        current.type_name()
                    )))
                }
            },
        };
    }
    best.cloned()
        .ok_or_else(|| EvalError::invalid_argument(function, "no values to compare"))
}

fn sum(args: &[Value]) -> EvalResult<Value> {
    let items = list_arg(args, 0, "sum")?;
    items
        .iter()
        .filter(|v| !v.is_null())
        .try_fold(Value::Int(0), |total, item| {
            if !item.is_number() {
                return Err(expected("sum", "numbers", item));
            }
            ops::binary(BinaryOp::Add, &total, item)
        })
}

// ==================== COLLECTIONS ====================

fn has(args: &[Value]) -> EvalResult<Value> {
    match arg(args, 0, "has")? {
        Value::Null => Ok(Value::Bool(false)),
        Value::Map(map) => Ok(Value::Bool(map.contains_key(string_arg(args, 1, "has")?))),
        other => Err(expected("has", "a map", other)),
    }
}

fn push(interp: &Interpreter<'_>, mut args: Vec<Value>) -> EvalResult<Value> {
    let item = args.pop().unwrap_or(Value::Null);
    match args.pop() {
        Some(Value::List(mut items)) => {
            interp.budget().check_collection_len(items.len() + 1)?;
            items.push(item);
            Ok(Value::List(items))
        }
        Some(other) => Err(expected("push", "a list", &other)),
        None => Err(EvalError::invalid_argument("push", "missing list")),
    }
}

fn range(interp: &Interpreter<'_>, args: &[Value]) -> EvalResult<Value> {
    let (start, stop) = match args.len() {
        1 => (0, int_arg(args, 0, "range")?),
        _ => (int_arg(args, 0, "range")?, int_arg(args, 1, "range")?),
    };
    let step = if args.len() == 3 { int_arg(args, 2, "range")? } else { 1 };
    if step == 0 {
        return Err(EvalError::invalid_argument("range", "step must not be zero"));
    }

    let span = i128::from(stop) - i128::from(start);
    let step_w = i128::from(step);
    let count = if (span > 0 && step > 0) || (span < 0 && step < 0) {
        (span.abs() + step_w.abs() - 1) / step_w.abs()
    } else {
        0
    };
    interp
        .budget()
        .check_collection_len(usize::try_from(count).unwrap_or(usize::MAX))?;

    let values = (0..count)
        .filter_map(|i| i64::try_from(i128::from(start) + i * step_w).ok())
        .map(Value::Int)
        .collect();
    Ok(Value::List(values))
}

/// Exact decimal from a float, used by the `decimal` module.
pub(crate) fn decimal_from_f64(f: f64, function: &str) -> EvalResult<Decimal> {
    Decimal::from_f64(f).ok_or_else(|| {
        EvalError::invalid_argument(function, format!("{} has no decimal representation", f))
    })
}
