//! `datetime` and `time`: UTC timestamps read from the evaluator's clock.

use super::unknown;
use crate::builtins::{arg, int_arg, string_arg};
use crate::interpreter::Interpreter;
use crate::{EvalError, EvalResult};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Datelike, Duration, NaiveDate, SecondsFormat, Timelike, Utc};
use warden_core::Value;
use warden_parser::parse_timestamp;

/// Offsets beyond roughly ten thousand years are rejected up front.
const MAX_OFFSET_DAYS: i64 = 3_650_000;

pub(super) fn call(interp: &mut Interpreter<'_>, function: &str, args: &[Value]) -> EvalResult<Value> {
    match function {
        "now" => Ok(Value::Timestamp(interp.clock().now())),
        "date" | "datetime" => construct(function, args),
        "parse" => match arg(args, 0, function)? {
            Value::Null => Ok(Value::Null),
            _ => {
                let text = string_arg(args, 0, function)?;
                parse_timestamp(text).map(Value::Timestamp).ok_or_else(|| {
                    EvalError::invalid_argument("datetime.parse", format!("cannot parse '{}'", text))
                })
            }
        },
        _ => {
            let Some(ts) = timestamp_arg(args, 0, function)? else {
                return Ok(Value::Null);
            };
            accessor(ts, function, args)
        }
    }
}

pub(super) fn call_time(interp: &mut Interpreter<'_>, function: &str) -> EvalResult<Value> {
    let now = interp.clock().now();
    match function {
        "epoch" => Ok(Value::Int(now.timestamp())),
        "epoch_millis" => Ok(Value::Int(now.timestamp_millis())),
        _ => Err(unknown("time", function)),
    }
}

/// A timestamp argument; strings are parsed, `null` passes through.
fn timestamp_arg(args: &[Value], index: usize, function: &str) -> EvalResult<Option<DateTime<Utc>>> {
    match arg(args, index, function)? {
        Value::Null => Ok(None),
        Value::Timestamp(ts) => Ok(Some(*ts)),
        Value::String(s) => parse_timestamp(s).map(Some).ok_or_else(|| {
            EvalError::invalid_argument(format!("datetime.{}", function), format!("cannot parse '{}'", s))
        }),
        other => Err(EvalError::type_error(format!(
            "datetime.{} expects a timestamp, got {}",
            function,
            other.type_name()
        ))),
    }
}

fn component(args: &[Value], index: usize, function: &str) -> EvalResult<u32> {
    match args.get(index) {
        None => Ok(0),
        Some(_) => {
            let n = int_arg(args, index, function)?;
            u32::try_from(n).map_err(|_| {
                EvalError::invalid_argument(format!("datetime.{}", function), format!("{} is out of range", n))
            })
        }
    }
}

fn construct(function: &str, args: &[Value]) -> EvalResult<Value> {
    let year = i32::try_from(int_arg(args, 0, function)?)
        .map_err(|_| EvalError::invalid_argument(format!("datetime.{}", function), "year out of range"))?;
    let month = component(args, 1, function)?;
    let day = component(args, 2, function)?;
    let hour = component(args, 3, function)?;
    let minute = component(args, 4, function)?;
    let second = component(args, 5, function)?;

    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .map(|naive| Value::Timestamp(naive.and_utc()))
        .ok_or_else(|| {
            EvalError::invalid_argument(
                format!("datetime.{}", function),
                format!(
                    "{:04}-{:02}-{:02} {:02}:{:02}:{:02} is not a valid date",
                    year, month, day, hour, minute, second
                ),
            )
        })
}

fn offset(args: &[Value], function: &str, seconds_per_unit: i64) -> EvalResult<Duration> {
    let n = int_arg(args, 1, function)?;
    let limit = MAX_OFFSET_DAYS * (86_400 / seconds_per_unit);
    if n.abs() > limit {
        return Err(EvalError::overflow(format!("datetime.{}", function)));
    }
    Ok(Duration::seconds(n * seconds_per_unit))
}

fn accessor(ts: DateTime<Utc>, function: &str, args: &[Value]) -> EvalResult<Value> {
    let value = match function {
        "iso" => Value::String(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        "year" => Value::Int(i64::from(ts.year())),
        "month" => Value::Int(i64::from(ts.month())),
        "day" => Value::Int(i64::from(ts.day())),
        "hour" => Value::Int(i64::from(ts.hour())),
        "minute" => Value::Int(i64::from(ts.minute())),
        "second" => Value::Int(i64::from(ts.second())),
        // Monday is 0.
        "weekday" => Value::Int(i64::from(ts.weekday().num_days_from_monday())),
        "add_days" | "add_seconds" => {
            let unit = if function == "add_days" { 86_400 } else { 1 };
            let by = offset(args, function, unit)?;
            ts.checked_add_signed(by)
                .map(Value::Timestamp)
                .ok_or_else(|| EvalError::overflow(format!("datetime.{}", function)))?
        }
        "diff_seconds" => match timestamp_arg(args, 1, function)? {
            Some(other) => Value::Int((ts - other).num_seconds()),
            None => Value::Null,
        },
        "format" => {
            let pattern = string_arg(args, 1, function)?;
            let items: Vec<Item<'_>> = StrftimeItems::new(pattern).collect();
            if items.iter().any(|item| matches!(item, Item::Error)) {
                return Err(EvalError::invalid_argument(
                    "datetime.format",
                    format!("invalid format '{}'", pattern),
                ));
            }
            Value::String(ts.format_with_items(items.iter()).to_string())
        }
        _ => return Err(unknown("datetime", function)),
    };
    Ok(value)
}
