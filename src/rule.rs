//! Rule descriptors
//!
//! A rule is registered under a name and fires for every field whose schema
//! node has that name as a key. The schema value under the key is the rule's
//! argument (`accept`).
//!
//! Rules come in four shapes:
//!
//! - [`Rule::Validator`]: a predicate over the field's value. It may also
//!   defer the field's outcome to an asynchronous [`Validator::join`], which is
//!   how `properties` and `items` fan out to child fields.
//! - [`Rule::Filter`]: a transform producing the field's next value.
//! - [`Rule::Both`]: a validator and a filter under one name.
//! - [`Rule::Marker`]: a legal schema key that never fires on its own, read by
//!   sibling rules through [`Field::rule`](crate::Field::rule).

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;

use crate::error::Result;
use crate::field::Field;

/// Outcome of a validator for one field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The value satisfies the rule
    Pass,
    /// The value violates the rule; an issue is recorded at the field's path
    Fail,
    /// The rule does not apply to this kind of value
    Skip,
    /// The outcome is decided later by [`Validator::join`]
    Defer,
}

impl From<bool> for Verdict {
    fn from(passed: bool) -> Self {
        if passed { Verdict::Pass } else { Verdict::Fail }
    }
}

/// Predicate half of a rule
pub trait Validator: Send + Sync {
    /// Checks `value` against `accept`
    ///
    /// Returning `Err` reports a defect (bad argument, broken schema) and
    /// aborts the whole validation; ordinary violations are `Verdict::Fail` or
    /// issues recorded through [`Field::issue_at`].
    fn validate(&self, accept: &Value, value: &Value, field: &Field<'_>) -> Result<Verdict>;

    /// Completes a field deferred by `Verdict::Defer`
    ///
    /// Receives the field's value once all synchronous rules have run and
    /// resolves to the field's new value.
    fn join<'f>(
        &'f self,
        _accept: &'f Value,
        value: Value,
        _field: &'f Field<'_>,
    ) -> BoxFuture<'f, Result<Value>> {
        Box::pin(async move { Ok(value) })
    }
}

/// Transform half of a rule
pub trait Filter: Send + Sync {
    /// Produces the field's next value; `None` is an absent value
    fn filter(&self, accept: &Value, value: Option<Value>, field: &Field<'_>)
    -> Result<Option<Value>>;
}

struct FnValidator<F>(F);

impl<F> Validator for FnValidator<F>
where
    F: Fn(&Value, &Value, &Field<'_>) -> Result<Verdict> + Send + Sync,
{
    fn validate(&self, accept: &Value, value: &Value, field: &Field<'_>) -> Result<Verdict> {
        (self.0)(accept, value, field)
    }
}

struct FnFilter<F>(F);

impl<F> Filter for FnFilter<F>
where
    F: Fn(&Value, Option<Value>, &Field<'_>) -> Result<Option<Value>> + Send + Sync,
{
    fn filter(
        &self,
        accept: &Value,
        value: Option<Value>,
        field: &Field<'_>,
    ) -> Result<Option<Value>> {
        (self.0)(accept, value, field)
    }
}

/// A registered rule descriptor
#[derive(Clone)]
pub enum Rule {
    Validator(Arc<dyn Validator>),
    Filter(Arc<dyn Filter>),
    Both {
        validator: Arc<dyn Validator>,
        filter: Arc<dyn Filter>,
    },
    Marker,
}

impl Rule {
    pub fn validator(validator: impl Validator + 'static) -> Self {
        Rule::Validator(Arc::new(validator))
    }

    pub fn filter(filter: impl Filter + 'static) -> Self {
        Rule::Filter(Arc::new(filter))
    }

    pub fn both(validator: impl Validator + 'static, filter: impl Filter + 'static) -> Self {
        Rule::Both {
            validator: Arc::new(validator),
            filter: Arc::new(filter),
        }
    }

    /// A validator rule from a plain function or closure
    pub fn validate_fn<F>(f: F) -> Self
    where
        F: Fn(&Value, &Value, &Field<'_>) -> Result<Verdict> + Send + Sync + 'static,
    {
        Rule::Validator(Arc::new(FnValidator(f)))
    }

    /// A filter rule from a plain function or closure
    pub fn filter_fn<F>(f: F) -> Self
    where
        F: Fn(&Value, Option<Value>, &Field<'_>) -> Result<Option<Value>> + Send + Sync + 'static,
    {
        Rule::Filter(Arc::new(FnFilter(f)))
    }

    pub fn as_validator(&self) -> Option<&Arc<dyn Validator>> {
        match self {
            Rule::Validator(validator) | Rule::Both { validator, .. } => Some(validator),
            _ => None,
        }
    }

    pub fn as_filter(&self) -> Option<&Arc<dyn Filter>> {
        match self {
            Rule::Filter(filter) | Rule::Both { filter, .. } => Some(filter),
            _ => None,
        }
    }

    pub fn is_marker(&self) -> bool {
        matches!(self, Rule::Marker)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Rule::Validator(_) => "validator",
            Rule::Filter(_) => "filter",
            Rule::Both { .. } => "both",
            Rule::Marker => "marker",
        }
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rule::{}", self.kind())
    }
}
