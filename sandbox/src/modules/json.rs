//! `json`: encode values to text and back with `serde_json`.

use super::unknown;
use crate::builtins::{arg, string_arg};
use crate::{EvalError, EvalResult};
use warden_core::Value;

pub(super) fn call(function: &str, args: &[Value]) -> EvalResult<Value> {
    match function {
        "encode" => serde_json::to_string(&arg(args, 0, "json.encode")?.to_json())
            .map(Value::String)
            .map_err(|e| EvalError::invalid_argument("json.encode", e.to_string())),
        "decode" => match arg(args, 0, "json.decode")? {
            Value::Null => Ok(Value::Null),
            _ => {
                let text = string_arg(args, 0, "json.decode")?;
                serde_json::from_str::<serde_json::Value>(text)
                    .map(|json| Value::from_json(&json))
                    .map_err(|e| EvalError::invalid_argument("json.decode", e.to_string()))
            }
        },
        _ => Err(unknown("json", function)),
    }
}
