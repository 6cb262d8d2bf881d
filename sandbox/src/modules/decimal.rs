//! `decimal`: exact base-10 arithmetic backed by `rust_decimal`.

use super::unknown;
use crate::builtins::{arg, decimal_from_f64, int_arg};
use crate::{EvalError, EvalResult};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use warden_core::Value;

pub(super) fn call(function: &str, args: &[Value]) -> EvalResult<Value> {
    if args.first().map_or(false, Value::is_null) {
        return Ok(Value::Null);
    }
    match function {
        "parse" => to_decimal(arg(args, 0, "decimal.parse")?).map(Value::Decimal),
        "round" => {
            let d = to_decimal(arg(args, 0, "decimal.round")?)?;
            let dp = u32::try_from(int_arg(args, 1, "decimal.round")?).map_err(|_| {
                EvalError::invalid_argument("decimal.round", "places must be between 0 and 28")
            })?;
            Ok(Value::Decimal(
                d.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero),
            ))
        }
        "to_float" => {
            let d = to_decimal(arg(args, 0, "decimal.to_float")?)?;
            d.to_f64()
                .map(Value::Float)
                .ok_or_else(|| EvalError::overflow("decimal.to_float"))
        }
        _ => Err(unknown("decimal", function)),
    }
}

fn to_decimal(value: &Value) -> EvalResult<Decimal> {
    match value {
        Value::Decimal(d) => Ok(*d),
        Value::Int(i) => Ok(Decimal::from(*i)),
        Value::Float(f) => decimal_from_f64(*f, "decimal.parse"),
        Value::String(s) => s.trim().parse::<Decimal>().map_err(|e| {
            EvalError::invalid_argument("decimal.parse", format!("'{}': {}", s, e))
        }),
        other => Err(EvalError::type_error(format!(
            "decimal expects a number or string, got {}",
            other.type_name()
        ))),
    }
}
