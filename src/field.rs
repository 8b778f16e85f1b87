//! Field runtime
//!
//! A [`Field`] pairs one schema node with one value and runs the flavor's rule
//! pipeline over it:
//!
//! 1. every registered rule whose name is a key of the schema node fires, in
//!    registration order: its validator (when the value is present), then its
//!    filter;
//! 2. at most one validator may defer the field; its [`Validator::join`] runs
//!    after the synchronous pass and replaces the field's value;
//! 3. the field resolves with its final value, or with a report made of its
//!    own issues followed by the issues of the deferred join.
//!
//! Composition rules create child fields through [`Field::child`] and drive
//! them with [`Field::validate`], so nesting is plain recursion over fields.

use std::sync::{Arc, Mutex, PoisonError};

use futures::future::BoxFuture;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::config::Options;
use crate::error::{Result, ValidationError};
use crate::registry::Flavor;
use crate::report::{Issue, Path, PathSegment, Report};
use crate::rule::{Validator, Verdict};

/// The unit of validation: one value checked against one schema node
pub struct Field<'a> {
    flavor: &'a Flavor,
    schema: &'a Map<String, Value>,
    path: Path,
    value: Option<Value>,
    parent: Option<&'a Value>,
    issues: Mutex<Vec<Issue>>,
}

impl<'a> Field<'a> {
    /// Creates the root field of a validation
    pub fn root(flavor: &'a Flavor, schema: &'a Value, value: Option<Value>) -> Result<Self> {
        let schema = schema_node(schema, &Path::root())?;
        Ok(Self {
            flavor,
            schema,
            path: Path::root(),
            value,
            parent: None,
            issues: Mutex::new(Vec::new()),
        })
    }

    /// Creates a field for a value nested inside this field's value
    ///
    /// `parent` is the value the child was taken from; it is only exposed to
    /// rules through [`Field::parent`].
    pub fn child<'c>(
        &'c self,
        segment: impl Into<PathSegment>,
        value: Option<Value>,
        schema: &'c Value,
        parent: &'c Value,
    ) -> Result<Field<'c>> {
        let path = self.path.join(segment);
        let schema = schema_node(schema, &path)?;
        Ok(Field {
            flavor: self.flavor,
            schema,
            path,
            value,
            parent: Some(parent),
            issues: Mutex::new(Vec::new()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn parent(&self) -> Option<&Value> {
        self.parent
    }

    pub fn flavor(&self) -> &'a Flavor {
        self.flavor
    }

    pub fn options(&self) -> &'a Options {
        self.flavor.options()
    }

    /// The resolved rule set: schema keys mapped to their arguments
    pub fn rules(&self) -> &'a Map<String, Value> {
        self.schema
    }

    /// Argument declared for a sibling rule on this field
    pub fn rule(&self, name: &str) -> Option<&'a Value> {
        self.schema.get(name)
    }

    pub fn is_object(&self) -> bool {
        self.value.as_ref().is_some_and(Value::is_object)
    }

    pub fn is_array(&self) -> bool {
        self.value.as_ref().is_some_and(Value::is_array)
    }

    /// Records an issue without stopping the pipeline
    pub fn issue(&self, issue: Issue) {
        self.issues
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(issue);
    }

    /// Records an issue at a position below this field
    pub fn issue_at(&self, segment: impl Into<PathSegment>, rule: &str, accept: Option<Value>) {
        let mut issue = Issue::new(self.path.join(segment), rule);
        issue.accept = accept;
        self.issue(issue);
    }

    /// Number of issues recorded so far
    pub fn issue_count(&self) -> usize {
        self.issues
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn take_issues(&mut self) -> Vec<Issue> {
        std::mem::take(
            self.issues
                .get_mut()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }

    fn check_rule_names(&self) -> Result<()> {
        let registry = self.flavor.registry();
        for key in self.schema.keys() {
            if registry.contains(key) {
                continue;
            }
            if self.flavor.options().strict_rules {
                return Err(ValidationError::UnknownRule {
                    rule: key.clone(),
                    path: self.path.clone(),
                });
            }
            trace!(rule = %key, path = %self.path, "ignoring unregistered schema key");
        }
        Ok(())
    }

    /// Runs the full rule pipeline
    ///
    /// Resolves exactly once: with the field's final value, or with
    /// `ValidationError::Invalid` carrying the field's report. Defects raised
    /// by rules are returned unchanged.
    pub fn validate(mut self) -> BoxFuture<'a, Result<Option<Value>>> {
        Box::pin(async move {
            self.check_rule_names()?;

            let flavor = self.flavor;
            let schema = self.schema;
            let mut deferred: Option<(&'a str, Arc<dyn Validator>, &'a Value)> = None;

            for (name, rule) in flavor.registry().iter() {
                let Some(accept) = schema.get(name) else {
                    continue;
                };
                trace!(rule = name, kind = rule.kind(), path = %self.path, "running rule");

                if let (Some(validator), Some(value)) = (rule.as_validator(), self.value.as_ref()) {
                    match validator.validate(accept, value, &self)? {
                        Verdict::Pass | Verdict::Skip => {}
                        Verdict::Fail => self.issue(
                            Issue::new(self.path.clone(), name).with_accept(accept.clone()),
                        ),
                        Verdict::Defer => {
                            if let Some((first, _, _)) = &deferred {
                                return Err(ValidationError::Conflict {
                                    path: self.path.clone(),
                                    first: first.to_string(),
                                    second: name.to_string(),
                                });
                            }
                            deferred = Some((name, Arc::clone(validator), accept));
                        }
                    }
                }

                if let Some(filter) = rule.as_filter() {
                    let current = self.value.take();
                    self.value = filter.filter(accept, current, &self)?;
                }
            }

            if let Some((name, validator, accept)) = deferred {
                if let Some(value) = self.value.take() {
                    debug!(rule = name, path = %self.path, "resuming deferred field");
                    let joined = validator.join(accept, value, &self).await;
                    match joined {
                        Ok(joined) => self.value = Some(joined),
                        Err(ValidationError::Invalid(report)) => {
                            let mut own = Report::new(self.take_issues());
                            own.merge(report);
                            return Err(ValidationError::Invalid(own));
                        }
                        Err(other) => return Err(other),
                    }
                }
            }

            let issues = self.take_issues();
            if issues.is_empty() {
                Ok(self.value)
            } else {
                Err(ValidationError::Invalid(Report::new(issues)))
            }
        })
    }
}

fn schema_node<'s>(schema: &'s Value, path: &Path) -> Result<&'s Map<String, Value>> {
    schema
        .as_object()
        .ok_or_else(|| ValidationError::InvalidSchema {
            path: path.clone(),
            reason: format!("expected an object, found {}", crate::value::type_name(schema)),
        })
}
