//! Operator semantics.
//!
//! Null propagates through arithmetic and ordering. Integer and decimal
//! arithmetic is checked; floats follow IEEE 754 except that division by zero
//! is a fault. Mixing decimals with floats is a type error so exact values
//! never silently lose precision.

use crate::{EvalError, EvalResult};
use rust_decimal::Decimal;
use std::cmp::Ordering;
use warden_core::Value;
use warden_parser::BinaryOp;

/// Apply a non-short-circuit binary operator.
pub(crate) fn binary(op: BinaryOp, left: &Value, right: &Value) -> EvalResult<Value> {
    match op {
        BinaryOp::Add => add(left, right),
        BinaryOp::Sub => arithmetic(op, left, right),
        BinaryOp::Mul => arithmetic(op, left, right),
        BinaryOp::Div => divide(left, right),
        BinaryOp::Mod => modulo(left, right),
        BinaryOp::Eq => Ok(Value::Bool(left.loose_eq(right))),
        BinaryOp::NotEq => Ok(Value::Bool(!left.loose_eq(right))),
        BinaryOp::Lt => ordering(op, left, right, |o| o == Ordering::Less),
        BinaryOp::LtEq => ordering(op, left, right, |o| o != Ordering::Greater),
        BinaryOp::Gt => ordering(op, left, right, |o| o == Ordering::Greater),
        BinaryOp::GtEq => ordering(op, left, right, |o| o != Ordering::Less),
        BinaryOp::In => contains(right, left).map(Value::Bool),
        BinaryOp::NotIn => contains(right, left).map(|b| Value::Bool(!b)),
        // Short-circuit operators are handled by the interpreter.
        BinaryOp::And | BinaryOp::Or | BinaryOp::NullCoalesce => Err(EvalError::type_error(
            format!("operator '{}' requires lazy evaluation", op),
        )),
    }
}

fn mismatch(op: BinaryOp, left: &Value, right: &Value) -> EvalError {
    EvalError::type_error(format!(
        "unsupported operand types for '{}': {} and {}",
        op,
        left.type_name(),
        right.type_name()
    ))
}

fn add(left: &Value, right: &Value) -> EvalResult<Value> {
    match (left, right) {
        (Value::String(a), Value::String(b)) => {
            let mut s = String::with_capacity(a.len() + b.len());
            s.push_str(a);
            s.push_str(b);
            Ok(Value::String(s))
        }
        (Value::List(a), Value::List(b)) => {
            let mut items = a.clone();
            items.extend(b.iter().cloned());
            Ok(Value::List(items))
        }
        _ => arithmetic(BinaryOp::Add, left, right),
    }
}

fn arithmetic(op: BinaryOp, left: &Value, right: &Value) -> EvalResult<Value> {
    match (left, right) {
        (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
        (Value::Int(a), Value::Int(b)) => {
            let result = match op {
                BinaryOp::Add => a.checked_add(*b),
                BinaryOp::Sub => a.checked_sub(*b),
                BinaryOp::Mul => a.checked_mul(*b),
                _ => return Err(mismatch(op, left, right)),
            };
            result
                .map(Value::Int)
                .ok_or_else(|| EvalError::overflow(format!("{} {} {}", a, op, b)))
        }
        (Value::Decimal(_), Value::Decimal(_) | Value::Int(_))
        | (Value::Int(_), Value::Decimal(_)) => {
            let (a, b) = decimal_pair(left, right, op)?;
            let result = match op {
                BinaryOp::Add => a.checked_add(b),
                BinaryOp::Sub => a.checked_sub(b),
                BinaryOp::Mul => a.checked_mul(b),
                _ => return Err(mismatch(op, left, right)),
            };
            result
                .map(Value::Decimal)
                .ok_or_else(|| EvalError::overflow(format!("{} {} {}", a, op, b)))
        }
        (Value::Float(_) | Value::Int(_), Value::Float(_) | Value::Int(_)) => {
            let (a, b) = float_pair(left, right, op)?;
            Ok(Value::Float(match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                _ => return Err(mismatch(op, left, right)),
            }))
        }
        _ => Err(mismatch(op, left, right)),
    }
}

/// True division: integers divide to a float.
fn divide(left: &Value, right: &Value) -> EvalResult<Value> {
    match (left, right) {
        (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
        (Value::Decimal(_), Value::Decimal(_) | Value::Int(_))
        | (Value::Int(_), Value::Decimal(_)) => {
            let (a, b) = decimal_pair(left, right, BinaryOp::Div)?;
            if b.is_zero() {
                return Err(EvalError::DivisionByZero);
            }
            a.checked_div(b)
                .map(Value::Decimal)
                .ok_or_else(|| EvalError::overflow(format!("{} / {}", a, b)))
        }
        (Value::Float(_) | Value::Int(_), Value::Float(_) | Value::Int(_)) => {
            let (a, b) = float_pair(left, right, BinaryOp::Div)?;
            if b == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            Ok(Value::Float(a / b))
        }
        _ => Err(mismatch(BinaryOp::Div, left, right)),
    }
}

/// Remainder with the sign of the divisor, so `-7 % 3 == 2`.
fn modulo(left: &Value, right: &Value) -> EvalResult<Value> {
    match (left, right) {
        (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
        (Value::Int(a), Value::Int(b)) => {
            if *b == 0 {
                return Err(EvalError::DivisionByZero);
            }
            let r = a
                .checked_rem(*b)
                .ok_or_else(|| EvalError::overflow(format!("{} % {}", a, b)))?;
            Ok(Value::Int(if r != 0 && (r < 0) != (*b < 0) { r + b } else { r }))
        }
        (Value::Decimal(_), Value::Decimal(_) | Value::Int(_))
        | (Value::Int(_), Value::Decimal(_)) => {
            let (a, b) = decimal_pair(left, right, BinaryOp::Mod)?;
            if b.is_zero() {
                return Err(EvalError::DivisionByZero);
            }
            let r = a
                .checked_rem(b)
                .ok_or_else(|| EvalError::overflow(format!("{} % {}", a, b)))?;
            let adjusted = if !r.is_zero() && r.is_sign_negative() != b.is_sign_negative() {
                r + b
            } else {
                r
            };
            Ok(Value::Decimal(adjusted))
        }
        (Value::Float(_) | Value::Int(_), Value::Float(_) | Value::Int(_)) => {
            let (a, b) = float_pair(left, right, BinaryOp::Mod)?;
            if b == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            let r = a % b;
            Ok(Value::Float(if r != 0.0 && (r < 0.0) != (b < 0.0) { r + b } else { r }))
        }
        _ => Err(mismatch(BinaryOp::Mod, left, right)),
    }
}

fn float_pair(left: &Value, right: &Value, op: BinaryOp) -> EvalResult<(f64, f64)> {
    match (left.as_float(), right.as_float()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(mismatch(op, left, right)),
    }
}

fn decimal_pair(left: &Value, right: &Value, op: BinaryOp) -> EvalResult<(Decimal, Decimal)> {
    match (left.as_decimal(), right.as_decimal()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(mismatch(op, left, right)),
    }
}

fn ordering(
    op: BinaryOp,
    left: &Value,
    right: &Value,
    test: impl Fn(Ordering) -> bool,
) -> EvalResult<Value> {
    if left.is_null() || right.is_null() {
        return Ok(Value::Null);
    }
    left.compare(right)
        .map(|o| Value::Bool(test(o)))
        .ok_or_else(|| mismatch(op, left, right))
}

/// Membership test backing `in`: list elements, map keys, substrings.
pub(crate) fn contains(container: &Value, item: &Value) -> EvalResult<bool> {
    match (container, item) {
        (Value::List(items), _) => Ok(items.iter().any(|v| v.loose_eq(item))),
        (Value::Map(map), Value::String(key)) => Ok(map.contains_key(key)),
        (Value::String(s), Value::String(needle)) => Ok(s.contains(needle.as_str())),
        (Value::Null, _) => Ok(false),
        _ => Err(EvalError::type_error(format!(
            "cannot test membership of {} in {}",
            item.type_name(),
            container.type_name()
        ))),
    }
}

/// Unary minus.
pub(crate) fn negate(value: &Value) -> EvalResult<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::Int(i) => i
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| EvalError::overflow(format!("-({})", i))),
        Value::Float(f) => Ok(Value::Float(-f)),
        Value::Decimal(d) => Ok(Value::Decimal(-*d)),
        _ => Err(EvalError::type_error(format!("cannot negate {}", value.type_name()))),
    }
}

/// Three-valued `not`.
pub(crate) fn not(value: &Value) -> EvalResult<Value> {
    match value {
        Value::Bool(b) => Ok(Value::Bool(!b)),
        Value::Null => Ok(Value::Null),
        _ => Err(EvalError::type_error(format!(
            "cannot apply 'not' to {}",
            value.type_name()
        ))),
    }
}

/// Interpret a value as a three-valued boolean.
pub(crate) fn as_logical(value: &Value, context: &str) -> EvalResult<Option<bool>> {
    match value {
        Value::Bool(b) => Ok(Some(*b)),
        Value::Null => Ok(None),
        _ => Err(EvalError::type_error(format!(
            "{} expects bool, got {}",
            context,
            value.type_name()
        ))),
    }
}
