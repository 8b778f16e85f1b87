//! Rule registry and flavors
//!
//! A [`Flavor`] is an independently configured instance of the engine: its
//! own [`RuleRegistry`], its own [`Options`] and its own compiled pattern
//! cache. Flavors never share rules. The registry is populated through
//! `&mut Flavor` before validation starts and is only read while validating,
//! which borrows the flavor immutably.

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::config::Options;
use crate::error::Result;
use crate::field::Field;
use crate::pattern_cache::PatternCache;
use crate::rule::Rule;
use crate::rules;

/// Ordered mapping from rule name to rule
///
/// Rules fire in registration order. Re-registering a name replaces the rule
/// but keeps its original position.
#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    entries: Vec<(String, Rule)>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `rule` under `name`, returning the rule it replaced
    pub fn add(&mut self, name: impl Into<String>, rule: Rule) -> Option<Rule> {
        let name = name.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, rule)),
            None => {
                self.entries.push((name, rule));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, rule)| rule)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Rules in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Rule)> {
        self.entries.iter().map(|(name, rule)| (name.as_str(), rule))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// An independently configured rule set with its validation entry points
pub struct Flavor {
    name: String,
    registry: RuleRegistry,
    options: Options,
    patterns: PatternCache,
}

impl Flavor {
    /// Name of the flavor built by [`Flavor::json_schema`]
    pub const JSON_SCHEMA: &'static str = "json-schema";

    /// Creates a flavor with an empty registry
    pub fn new(name: impl Into<String>, options: Options) -> Self {
        let patterns = PatternCache::new(options.pattern_cache_capacity);
        Self {
            name: name.into(),
            registry: RuleRegistry::new(),
            options,
            patterns,
        }
    }

    /// Creates the JSON-Schema flavor with default options
    pub fn json_schema() -> Self {
        Self::json_schema_with_options(Options::default())
    }

    /// Creates the JSON-Schema flavor with the built-in rules installed
    pub fn json_schema_with_options(options: Options) -> Self {
        let mut flavor = Self::new(Self::JSON_SCHEMA, options);
        rules::install(&mut flavor);
        debug!(
            flavor = %flavor.name,
            rules = flavor.registry.len(),
            "installed built-in rules"
        );
        flavor
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    pub fn patterns(&self) -> &PatternCache {
        &self.patterns
    }

    /// Adds or replaces a rule for this flavor only
    pub fn add_rule(&mut self, name: impl Into<String>, rule: Rule) -> &mut Self {
        let name = name.into();
        if self.registry.add(name.clone(), rule).is_some() {
            debug!(flavor = %self.name, rule = %name, "replaced rule");
        }
        self
    }

    /// Makes a compiled pattern available to the `pattern` rule
    ///
    /// The regex is looked up by its source text, so schemas keep naming the
    /// pattern by source.
    pub fn precompile_pattern(&self, regex: Regex) {
        self.patterns.insert(regex);
    }

    /// Validates `value` against `schema`, resolving to the normalized value
    pub async fn validate(&self, value: Value, schema: &Value) -> Result<Value> {
        let result = self.validate_optional(Some(value), schema).await?;
        Ok(result.unwrap_or(Value::Null))
    }

    /// Validates a possibly absent value
    ///
    /// `None` is an absent value: validators skip it and filters such as
    /// `default` may substitute one.
    pub async fn validate_optional(
        &self,
        value: Option<Value>,
        schema: &Value,
    ) -> Result<Option<Value>> {
        Field::root(self, schema, value)?.validate().await
    }

    /// Validates on the current thread, for callers outside an async runtime
    pub fn validate_blocking(&self, value: Value, schema: &Value) -> Result<Value> {
        futures::executor::block_on(self.validate(value, schema))
    }
}

impl std::fmt::Debug for Flavor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Flavor")
            .field("name", &self.name)
            .field("rules", &self.registry.names().collect::<Vec<_>>())
            .field("options", &self.options)
            .finish()
    }
}

/// Reads the argument a field's schema declares for a sibling rule
pub fn field_property<'f>(field: &Field<'f>, rule: &str) -> Option<&'f Value> {
    field.rule(rule)
}
