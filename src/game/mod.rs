pub mod admin;
pub mod history;
pub mod settlement;
pub mod submission;

use crate::error::ValidationErrors;
use crate::models::{Side, MAX_JERSEY_TOTAL};
use serde_json::Value;

// Field checks shared by the request types. Request fields arrive as raw
// JSON so a value of the wrong type is reported against its own field
// instead of failing the whole body. Each check records its failure and
// hands back a placeholder so every bad field gets reported at once.

/// Whole numbers, including floats with no fractional part such as `5.0`
fn whole_number(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
                .map(|f| f as i64)
        }),
        _ => None,
    }
}

fn present(value: Option<Value>) -> Option<Value> {
    value.filter(|v| !v.is_null())
}

pub(crate) fn non_empty(errors: &mut ValidationErrors, field: &str, value: Option<Value>) -> String {
    match present(value) {
        Some(Value::String(v)) if !v.trim().is_empty() => v,
        Some(Value::String(_)) => {
            errors.add(field, "must not be empty");
            String::new()
        }
        Some(_) => {
            errors.add(field, "must be a string");
            String::new()
        }
        None => {
            errors.add(field, "is required");
            String::new()
        }
    }
}

/// A string that may be left out
pub(crate) fn optional_text(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<Value>,
) -> Option<String> {
    match present(value) {
        Some(Value::String(v)) => Some(v),
        Some(_) => {
            errors.add(field, "must be a string");
            None
        }
        None => None,
    }
}

pub(crate) fn positive_id(errors: &mut ValidationErrors, field: &str, value: Option<Value>) -> u64 {
    match present(value) {
        Some(v) => match whole_number(&v) {
            Some(id) if id > 0 => id as u64,
            _ => {
                errors.add(field, "must be a positive integer");
                0
            }
        },
        None => {
            errors.add(field, "is required");
            0
        }
    }
}

pub(crate) fn jersey_total(errors: &mut ValidationErrors, field: &str, value: Option<Value>) -> u32 {
    match present(value) {
        Some(v) => match whole_number(&v) {
            Some(total) if (0..=MAX_JERSEY_TOTAL as i64).contains(&total) => total as u32,
            _ => {
                errors.add(
                    field,
                    format!("must be an integer between 0 and {}", MAX_JERSEY_TOTAL),
                );
                0
            }
        },
        None => {
            errors.add(field, "is required");
            0
        }
    }
}

/// Any non-negative whole number that fits a `u32`
pub(crate) fn line(errors: &mut ValidationErrors, field: &str, value: Option<Value>) -> u32 {
    match present(value) {
        Some(v) => match whole_number(&v).and_then(|n| u32::try_from(n).ok()) {
            Some(line) => line,
            None => {
                errors.add(field, "must be a non-negative integer");
                0
            }
        },
        None => {
            errors.add(field, "is required");
            0
        }
    }
}

pub(crate) fn finite_number(errors: &mut ValidationErrors, field: &str, value: Option<Value>) -> f64 {
    match present(value) {
        Some(v) => match v.as_f64() {
            Some(n) if n.is_finite() => n,
            _ => {
                errors.add(field, "must be a number");
                0.0
            }
        },
        None => {
            errors.add(field, "is required");
            0.0
        }
    }
}

pub(crate) fn flag(errors: &mut ValidationErrors, field: &str, value: Option<Value>) -> bool {
    match present(value) {
        Some(Value::Bool(b)) => b,
        Some(_) => {
            errors.add(field, "must be true or false");
            false
        }
        None => {
            errors.add(field, "is required");
            false
        }
    }
}

pub(crate) fn side(errors: &mut ValidationErrors, field: &str, value: Option<Value>) -> Side {
    match present(value) {
        Some(Value::String(v)) => match v.parse::<Side>() {
            Ok(side) => side,
            Err(_) => {
                errors.add(field, "must be \"home\" or \"away\"");
                Side::Home
            }
        },
        Some(_) => {
            errors.add(field, "must be \"home\" or \"away\"");
            Side::Home
        }
        None => {
            errors.add(field, "is required");
            Side::Home
        }
    }
}
