//! Composition rules: `properties` and `items`
//!
//! Both rules defer their field, then fan out one child field per property or
//! element and join the children inside the parent's future. Children are
//! polled concurrently on the calling task; results are assembled by key or
//! index, never by completion order.

use futures::future::{BoxFuture, join_all, try_join_all};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Result, ValidationError};
use crate::field::Field;
use crate::report::Report;
use crate::rule::{Validator, Verdict};

type ChildFuture<'c> = BoxFuture<'c, Result<Option<Value>>>;

/// Policy for keys present on a value but not declared in `properties`
#[derive(Clone, Copy)]
enum Additional<'s> {
    /// Copy the value verbatim
    Accept,
    /// Validate the value against this schema node
    Schema(&'s Value),
    /// Leave the key out of the result
    Drop,
}

impl<'s> Additional<'s> {
    fn resolve(argument: Option<&'s Value>, field: &Field<'_>) -> Result<Self> {
        match argument {
            None | Some(Value::Null) | Some(Value::Bool(false)) => Ok(Additional::Drop),
            Some(Value::Bool(true)) => Ok(Additional::Accept),
            Some(schema @ Value::Object(_)) => Ok(Additional::Schema(schema)),
            Some(_) => Err(ValidationError::invalid_argument(
                "additionalProperties",
                field.path(),
                "expected a boolean or a schema",
            )),
        }
    }
}

/// Waits for every child, in input order
///
/// With `fail_fast` the first failing child ends the join and the remaining
/// children are dropped. Otherwise every child runs to completion and the
/// child reports are merged in input order.
async fn join_children<'c>(
    field: &Field<'_>,
    rule: &str,
    children: Vec<ChildFuture<'c>>,
) -> Result<Vec<Option<Value>>> {
    debug!(rule, path = %field.path(), children = children.len(), "fanning out");

    if field.options().fail_fast {
        let joined = try_join_all(children).await;
        match &joined {
            Ok(_) => debug!(rule, path = %field.path(), "join completed"),
            Err(err) => debug!(rule, path = %field.path(), error = %err, "join short-circuited"),
        }
        return joined;
    }

    let results = join_all(children).await;
    let mut values = Vec::with_capacity(results.len());
    let mut report = Report::default();
    let mut failed = 0usize;
    for result in results {
        match result {
            Ok(value) => values.push(value),
            Err(ValidationError::Invalid(child)) => {
                failed += 1;
                report.merge(child);
            }
            Err(other) => return Err(other),
        }
    }

    // A child may fail with an empty report; it still fails the join
    if failed == 0 {
        debug!(rule, path = %field.path(), "join completed");
        Ok(values)
    } else {
        debug!(rule, path = %field.path(), failed, issues = report.len(), "join collected failures");
        Err(ValidationError::Invalid(report))
    }
}

/// The `properties` rule
pub struct Properties;

impl Validator for Properties {
    fn validate(&self, accept: &Value, value: &Value, field: &Field<'_>) -> Result<Verdict> {
        if !accept.is_object() {
            return Err(ValidationError::invalid_argument(
                "properties",
                field.path(),
                "expected a mapping of property schemas",
            ));
        }
        if value.is_object() {
            Ok(Verdict::Defer)
        } else {
            Ok(Verdict::Skip)
        }
    }

    fn join<'f>(
        &'f self,
        accept: &'f Value,
        value: Value,
        field: &'f Field<'_>,
    ) -> BoxFuture<'f, Result<Value>> {
        Box::pin(async move {
            let (Some(declared), Some(object)) = (accept.as_object(), value.as_object()) else {
                return Ok(value);
            };
            let additional = Additional::resolve(field.rule("additionalProperties"), field)?;

            let working_set = declared
                .keys()
                .chain(object.keys().filter(|key| !declared.contains_key(*key)));

            // Each slot is filled either directly or by the child at `pending[i]`
            let mut slots: Vec<(&String, Option<Value>)> = Vec::new();
            let mut pending: Vec<usize> = Vec::new();
            let mut children: Vec<ChildFuture<'_>> = Vec::new();

            for name in working_set {
                let schema = match declared.get(name) {
                    Some(schema) => schema,
                    None => match additional {
                        Additional::Accept => {
                            slots.push((name, object.get(name).cloned()));
                            continue;
                        }
                        Additional::Schema(schema) => schema,
                        Additional::Drop => continue,
                    },
                };

                let Some(item) = object.get(name) else {
                    if let Some(default) = schema.get("default") {
                        slots.push((name, Some(default.clone())));
                    }
                    continue;
                };

                let child = field.child(name, Some(item.clone()), schema, &value)?;
                pending.push(slots.len());
                slots.push((name, None));
                children.push(child.validate());
            }

            let results = join_children(field, "properties", children).await?;
            for (slot, result) in pending.into_iter().zip(results) {
                slots[slot].1 = result;
            }

            let mut assembled = Map::with_capacity(slots.len());
            for (name, result) in slots {
                if let Some(result) = result {
                    assembled.insert(name.clone(), result);
                }
            }
            Ok(Value::Object(assembled))
        })
    }
}

/// The `items` rule
pub struct Items;

impl Validator for Items {
    fn validate(&self, accept: &Value, value: &Value, field: &Field<'_>) -> Result<Verdict> {
        if !accept.is_object() {
            return Err(ValidationError::invalid_argument(
                "items",
                field.path(),
                "expected a schema",
            ));
        }
        if value.is_array() {
            Ok(Verdict::Defer)
        } else {
            Ok(Verdict::Skip)
        }
    }

    fn join<'f>(
        &'f self,
        accept: &'f Value,
        value: Value,
        field: &'f Field<'_>,
    ) -> BoxFuture<'f, Result<Value>> {
        Box::pin(async move {
            let Some(items) = value.as_array() else {
                return Ok(value);
            };

            let mut children: Vec<ChildFuture<'_>> = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                let child = field.child(i, Some(item.clone()), accept, &value)?;
                children.push(child.validate());
            }

            let results = join_children(field, "items", children).await?;
            Ok(Value::Array(
                results
                    .into_iter()
                    .map(|result| result.unwrap_or(Value::Null))
                    .collect(),
            ))
        })
    }
}
