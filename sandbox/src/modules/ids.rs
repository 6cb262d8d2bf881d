//! `uuid`: random identifiers.

use super::unknown;
use crate::builtins::{arg, string_arg};
use crate::{EvalError, EvalResult};
use uuid::Uuid;
use warden_core::Value;

pub(super) fn call(function: &str, args: &[Value]) -> EvalResult<Value> {
    match function {
        "v4" => Ok(Value::Uuid(Uuid::new_v4())),
        "parse" => match arg(args, 0, "uuid.parse")? {
            Value::Null => Ok(Value::Null),
            Value::Uuid(u) => Ok(Value::Uuid(*u)),
            _ => {
                let text = string_arg(args, 0, "uuid.parse")?;
                Uuid::parse_str(text.trim())
                    .map(Value::Uuid)
                    .map_err(|e| EvalError::invalid_argument("uuid.parse", e.to_string()))
            }
        },
        _ => Err(unknown("uuid", function)),
    }
}
