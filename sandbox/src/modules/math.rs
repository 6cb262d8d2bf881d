//! `math`: floating-point helpers.

use super::unknown;
use crate::builtins::{arg, float_arg};
use crate::{EvalError, EvalResult};
use warden_core::Value;

pub(super) fn call(function: &str, args: &[Value]) -> EvalResult<Value> {
    if args.first().map_or(false, Value::is_null) {
        return Ok(Value::Null);
    }
    match function {
        "pi" => Ok(Value::Float(std::f64::consts::PI)),
        "e" => Ok(Value::Float(std::f64::consts::E)),
        "sqrt" => {
            let x = float_arg(args, 0, "math.sqrt")?;
            if x < 0.0 {
                return Err(EvalError::invalid_argument("math.sqrt", "negative operand"));
            }
            Ok(Value::Float(x.sqrt()))
        }
        "pow" => pow(args),
        "floor" | "ceil" => {
            let x = float_arg(args, 0, function)?;
            let rounded = if function == "floor" { x.floor() } else { x.ceil() };
            finite(rounded, function)
        }
        _ => Err(unknown("math", function)),
    }
}

/// Integer powers stay integral when the exponent is non-negative.
fn pow(args: &[Value]) -> EvalResult<Value> {
    match (arg(args, 0, "math.pow")?, arg(args, 1, "math.pow")?) {
        (Value::Int(base), Value::Int(exp)) if *exp >= 0 => u32::try_from(*exp)
            .ok()
            .and_then(|exp| base.checked_pow(exp))
            .map(Value::Int)
            .ok_or_else(|| EvalError::overflow(format!("math.pow({}, {})", base, exp))),
        _ => {
            let base = float_arg(args, 0, "math.pow")?;
            let exp = float_arg(args, 1, "math.pow")?;
            finite(base.powf(exp), "pow")
        }
    }
}

fn finite(x: f64, function: &str) -> EvalResult<Value> {
    if x.is_finite() {
        Ok(Value::Float(x))
    } else {
        Err(EvalError::invalid_argument(
            format!("math.{}", function),
            "result is not a finite number",
        ))
    }
}
