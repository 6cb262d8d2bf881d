//! Allow-listed modules a snippet may `import`.
//!
//! Each submodule implements exactly the functions the capability catalog
//! lists for it.

mod datetime;
mod decimal;
mod ids;
mod json;
mod math;
mod re;

use crate::interpreter::Interpreter;
use crate::{EvalError, EvalResult};
use warden_core::Value;

/// Call `module.function(args)`.
pub(crate) fn call(
    interp: &mut Interpreter<'_>,
    module: &str,
    function: &str,
    args: Vec<Value>,
) -> EvalResult<Value> {
    match module {
        "re" => re::call(interp, function, &args),
        "datetime" => datetime::call(interp, function, &args),
        "time" => datetime::call_time(interp, function),
        "math" => math::call(function, &args),
        "decimal" => decimal::call(function, &args),
        "uuid" => ids::call(function, &args),
        "json" => json::call(function, &args),
        _ => Err(EvalError::forbidden(module)),
    }
}

/// Error for a catalog function with no implementation.
fn unknown(module: &str, function: &str) -> EvalError {
    EvalError::forbidden(format!("{}.{}", module, function))
}
