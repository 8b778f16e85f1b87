//! Built-in JSON-Schema rules
//!
//! Every leaf rule is a pure predicate over `(accept, value, field)`. Values
//! of a shape a rule does not understand are skipped, never failed: a
//! `minimum` on a string or a `required` on an array is inert.

use serde_json::Value;

use crate::compose::{Items, Properties};
use crate::error::{Result, ValidationError};
use crate::field::Field;
use crate::registry::Flavor;
use crate::rule::{Rule, Verdict};
use crate::value::{matches_type, string_form, strict_eq, truthy};

/// Installs the built-in rules in their firing order
pub fn install(flavor: &mut Flavor) {
    flavor
        .add_rule("type", Rule::validate_fn(type_rule))
        .add_rule("default", Rule::filter_fn(default_filter))
        .add_rule("enum", Rule::validate_fn(enum_rule))
        // String rules
        .add_rule("minLength", Rule::validate_fn(min_length))
        .add_rule("maxLength", Rule::validate_fn(max_length))
        .add_rule("pattern", Rule::validate_fn(pattern))
        // Numeric rules
        .add_rule("minimum", Rule::validate_fn(minimum))
        .add_rule("exclusiveMinimum", Rule::Marker)
        .add_rule("maximum", Rule::validate_fn(maximum))
        .add_rule("exclusiveMaximum", Rule::Marker)
        .add_rule("divisibleBy", Rule::validate_fn(divisible_by))
        // Object rules
        .add_rule("properties", Rule::validator(Properties))
        .add_rule("additionalProperties", Rule::Marker)
        .add_rule("minProperties", Rule::validate_fn(min_properties))
        .add_rule("maxProperties", Rule::validate_fn(max_properties))
        .add_rule("required", Rule::validate_fn(required))
        // Array rules
        .add_rule("items", Rule::validator(Items))
        .add_rule("minItems", Rule::validate_fn(min_items))
        .add_rule("maxItems", Rule::validate_fn(max_items))
        .add_rule("uniqueItems", Rule::validate_fn(unique_items));
}

fn number_arg(rule: &str, accept: &Value, field: &Field<'_>) -> Result<f64> {
    accept
        .as_f64()
        .ok_or_else(|| ValidationError::invalid_argument(rule, field.path(), "expected a number"))
}

fn count_arg(rule: &str, accept: &Value, field: &Field<'_>) -> Result<usize> {
    let count = accept.as_u64().or_else(|| {
        accept
            .as_f64()
            .filter(|f| *f >= 0.0 && f.fract() == 0.0)
            .map(|f| f as u64)
    });
    count.map(|c| c as usize).ok_or_else(|| {
        ValidationError::invalid_argument(rule, field.path(), "expected a non-negative integer")
    })
}

fn type_rule(accept: &Value, value: &Value, field: &Field<'_>) -> Result<Verdict> {
    match accept {
        Value::String(name) => Ok(matches_type(name, value).into()),
        Value::Array(names) => {
            let mut matched = false;
            for name in names {
                let name = name.as_str().ok_or_else(|| {
                    ValidationError::invalid_argument("type", field.path(), "expected type names")
                })?;
                matched |= matches_type(name, value);
            }
            Ok(matched.into())
        }
        _ => Err(ValidationError::invalid_argument(
            "type",
            field.path(),
            "expected a type name or a list of type names",
        )),
    }
}

fn default_filter(accept: &Value, value: Option<Value>, _field: &Field<'_>) -> Result<Option<Value>> {
    Ok(value.or_else(|| Some(accept.clone())))
}

fn enum_rule(accept: &Value, value: &Value, field: &Field<'_>) -> Result<Verdict> {
    let candidates = accept.as_array().ok_or_else(|| {
        ValidationError::invalid_argument("enum", field.path(), "expected a list of values")
    })?;
    Ok(candidates.iter().any(|c| strict_eq(c, value)).into())
}

fn min_length(accept: &Value, value: &Value, field: &Field<'_>) -> Result<Verdict> {
    let bound = count_arg("minLength", accept, field)?;
    Ok((string_form(value).chars().count() >= bound).into())
}

fn max_length(accept: &Value, value: &Value, field: &Field<'_>) -> Result<Verdict> {
    let bound = count_arg("maxLength", accept, field)?;
    Ok((string_form(value).chars().count() <= bound).into())
}

fn pattern(accept: &Value, value: &Value, field: &Field<'_>) -> Result<Verdict> {
    let source = accept.as_str().ok_or_else(|| {
        ValidationError::invalid_argument("pattern", field.path(), "expected a pattern string")
    })?;
    let regex = field.flavor().patterns().get_or_compile(source)?;
    Ok(regex.is_match(&string_form(value)).into())
}

fn minimum(accept: &Value, value: &Value, field: &Field<'_>) -> Result<Verdict> {
    let bound = number_arg("minimum", accept, field)?;
    let Some(number) = value.as_f64() else {
        return Ok(Verdict::Skip);
    };
    if field.rule("exclusiveMinimum").is_some_and(truthy) {
        Ok((number > bound).into())
    } else {
        Ok((number >= bound).into())
    }
}

fn maximum(accept: &Value, value: &Value, field: &Field<'_>) -> Result<Verdict> {
    let bound = number_arg("maximum", accept, field)?;
    let Some(number) = value.as_f64() else {
        return Ok(Verdict::Skip);
    };
    if field.rule("exclusiveMaximum").is_some_and(truthy) {
        Ok((number < bound).into())
    } else {
        Ok((number <= bound).into())
    }
}

// Exact for integers; floats are only exact while both sides are whole
// numbers within 2^53.
fn divisible_by(accept: &Value, value: &Value, field: &Field<'_>) -> Result<Verdict> {
    if !value.is_number() {
        return Ok(Verdict::Skip);
    }
    if let (Some(dividend), Some(divisor)) = (value.as_i64(), accept.as_i64()) {
        if divisor == 0 {
            return Err(ValidationError::invalid_argument(
                "divisibleBy",
                field.path(),
                "divisor must not be zero",
            ));
        }
        return Ok((dividend.checked_rem(divisor).unwrap_or(0) == 0).into());
    }

    let divisor = number_arg("divisibleBy", accept, field)?;
    if divisor == 0.0 {
        return Err(ValidationError::invalid_argument(
            "divisibleBy",
            field.path(),
            "divisor must not be zero",
        ));
    }
    let Some(dividend) = value.as_f64() else {
        return Ok(Verdict::Skip);
    };
    Ok((dividend % divisor == 0.0).into())
}

fn min_properties(accept: &Value, value: &Value, field: &Field<'_>) -> Result<Verdict> {
    let bound = count_arg("minProperties", accept, field)?;
    match value.as_object() {
        Some(object) => Ok((object.len() >= bound).into()),
        None => Ok(Verdict::Skip),
    }
}

fn max_properties(accept: &Value, value: &Value, field: &Field<'_>) -> Result<Verdict> {
    let bound = count_arg("maxProperties", accept, field)?;
    match value.as_object() {
        Some(object) => Ok((object.len() <= bound).into()),
        None => Ok(Verdict::Skip),
    }
}

/// Raises one issue per missing property instead of failing once
fn required(accept: &Value, value: &Value, field: &Field<'_>) -> Result<Verdict> {
    let names = accept.as_array().ok_or_else(|| {
        ValidationError::invalid_argument("required", field.path(), "expected a list of names")
    })?;
    let Some(object) = value.as_object() else {
        return Ok(Verdict::Skip);
    };

    for name in names {
        let name = name.as_str().ok_or_else(|| {
            ValidationError::invalid_argument("required", field.path(), "expected property names")
        })?;
        if !object.contains_key(name) {
            field.issue_at(name, "required", None);
        }
    }
    Ok(Verdict::Pass)
}

fn min_items(accept: &Value, value: &Value, field: &Field<'_>) -> Result<Verdict> {
    let bound = count_arg("minItems", accept, field)?;
    match value.as_array() {
        Some(items) => Ok((items.len() >= bound).into()),
        None => Ok(Verdict::Skip),
    }
}

fn max_items(accept: &Value, value: &Value, field: &Field<'_>) -> Result<Verdict> {
    let bound = count_arg("maxItems", accept, field)?;
    match value.as_array() {
        Some(items) => Ok((items.len() <= bound).into()),
        None => Ok(Verdict::Skip),
    }
}

/// Raises one issue per repeated item, at the repeat's own index
fn unique_items(accept: &Value, value: &Value, field: &Field<'_>) -> Result<Verdict> {
    if !truthy(accept) {
        return Ok(Verdict::Skip);
    }
    let Some(items) = value.as_array() else {
        return Ok(Verdict::Skip);
    };

    let mut seen: Vec<&Value> = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        if seen.iter().any(|s| strict_eq(s, item)) {
            field.issue_at(i, "uniqueItems", Some(Value::Bool(true)));
        } else {
            seen.push(item);
        }
    }
    Ok(Verdict::Pass)
}
