//! Value helpers shared by the built-in rules
//!
//! These define the comparison and coercion semantics the rules agree on:
//! strict equality, truthiness, and the string form used by length and
//! pattern checks.

use std::borrow::Cow;

use serde_json::Value;

/// Strict equality between two values
///
/// Numbers compare by numeric value (`1` equals `1.0`), strings and booleans by
/// content, and `null` equals `null`. Arrays and objects have no identity in
/// decoded data, so they are never strictly equal to anything, themselves
/// included.
pub fn strict_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => {
            if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
                a == b
            } else if let (Some(a), Some(b)) = (a.as_u64(), b.as_u64()) {
                a == b
            } else {
                a.as_f64() == b.as_f64()
            }
        }
        _ => false,
    }
}

/// Truthiness of a rule argument: `false`, `null`, `0` and `""` are falsy
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Whether the value is a number without a fractional part
pub fn is_integer(value: &Value) -> bool {
    match value {
        Value::Number(n) => {
            n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.is_finite() && f.fract() == 0.0)
        }
        _ => false,
    }
}

/// The string a length or pattern rule inspects
///
/// A string is its own form; every other value uses its JSON text.
pub fn string_form(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s.as_str()),
        other => Cow::Owned(other.to_string()),
    }
}

/// Name of the value's category, as used by the `type` rule
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) if is_integer(value) => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Whether `value` belongs to the category called `name`
///
/// `"integer"` values also satisfy `"number"`. Unknown names never match.
pub fn matches_type(name: &str, value: &Value) -> bool {
    match name {
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        "integer" => is_integer(value),
        "number" => value.is_number(),
        "string" => value.is_string(),
        "boolean" => value.is_boolean(),
        _ => false,
    }
}
