//! `re`: regular expressions backed by `regex-lite`, which matches in linear
//! time so a hostile pattern cannot stall the run.

use super::unknown;
use crate::builtins::string_arg;
use crate::interpreter::Interpreter;
use crate::EvalResult;
use warden_core::Value;

pub(super) fn call(interp: &mut Interpreter<'_>, function: &str, args: &[Value]) -> EvalResult<Value> {
    let pattern = string_arg(args, 0, function)?;
    let re = interp.regex(pattern)?;
    let text = match args.get(1) {
        Some(Value::Null) | None => None,
        Some(_) => Some(string_arg(args, 1, function)?),
    };

    match function {
        "is_match" => Ok(Value::Bool(text.map_or(false, |t| re.is_match(t)))),
        "find" => Ok(text
            .and_then(|t| re.find(t))
            .map(|m| Value::from(m.as_str()))
            .unwrap_or(Value::Null)),
        "find_all" => {
            let mut found = Vec::new();
            for m in text.map(|t| re.find_iter(t)).into_iter().flatten() {
                found.push(Value::from(m.as_str()));
                interp.budget().check_collection_len(found.len())?;
            }
            Ok(Value::List(found))
        }
        "replace" => {
            let Some(text) = text else {
                return Ok(Value::Null);
            };
            let replacement = string_arg(args, 2, function)?;
            let mut out = String::with_capacity(text.len());
            let mut last = 0;
            for caps in re.captures_iter(text) {
                let Some(whole) = caps.get(0) else { continue };
                out.push_str(&text[last..whole.start()]);
                caps.expand(replacement, &mut out);
                last = whole.end();
                interp.budget().check_string_len(out.len())?;
            }
            out.push_str(&text[last..]);
            Ok(Value::String(out))
        }
        _ => Err(unknown("re", function)),
    }
}
