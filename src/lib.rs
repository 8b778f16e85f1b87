//! # validate-json Library
//!
//! An async rule-dispatch and composition engine for validating and
//! normalizing JSON values against JSON-Schema style schema nodes.
//!
//! A [`Flavor`] owns a registry of named rules. Validating a value walks the
//! schema node's keys through the registry in registration order; the
//! `properties` and `items` rules fan out to child fields that are polled
//! concurrently and joined back in key or index order. The result is either
//! the normalized value (defaults applied, undeclared keys pruned or kept per
//! `additionalProperties`) or a [`Report`] of issues.
//!
//! ```no_run
//! use serde_json::json;
//! use validate_json::Flavor;
//!
//! # async fn run() -> validate_json::Result<()> {
//! let flavor = Flavor::json_schema();
//! let schema = json!({
//!     "properties": {
//!         "name": {"type": "string", "minLength": 1},
//!         "tags": {"type": "array", "items": {"type": "string"}, "default": []}
//!     },
//!     "required": ["name"]
//! });
//!
//! let value = flavor.validate(json!({"name": "x"}), &schema).await?;
//! assert_eq!(value, json!({"name": "x", "tags": []}));
//! # Ok(())
//! # }
//! ```

pub mod compose;
pub mod config;
pub mod error;
pub mod field;
pub mod output;
pub mod pattern_cache;
pub mod registry;
pub mod report;
pub mod rule;
pub mod rules;
pub mod value;

pub use compose::{Items, Properties};
pub use config::{ConfigError, ConfigManager, EnvProvider, Options, SystemEnvProvider};
pub use error::{Result, ValidationError};
pub use field::Field;
pub use output::{Output, VerbosityLevel};
pub use pattern_cache::PatternCache;
pub use registry::{Flavor, RuleRegistry, field_property};
pub use report::{Issue, Path, PathSegment, Report};
pub use rule::{Filter, Rule, Validator, Verdict};
