use thiserror::Error;

use crate::config::ConfigError;
use crate::report::{Path, Report};

/// Main library error type
///
/// `Invalid` carries the issues of a value that did not satisfy its schema.
/// Every other variant signals a defect in a schema, a rule or the
/// configuration, and is never produced by well-formed input data alone.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Validation failed: {0}")]
    Invalid(Report),

    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("Invalid argument for rule '{rule}' at '{path}': {reason}")]
    InvalidArgument {
        rule: String,
        path: Path,
        reason: String,
    },

    #[error("Invalid schema at '{path}': {reason}")]
    InvalidSchema { path: Path, reason: String },

    #[error("Unknown rule '{rule}' at '{path}'")]
    UnknownRule { rule: String, path: Path },

    #[error("Rule conflict at '{path}': '{first}' and '{second}' both deferred the field")]
    Conflict {
        path: Path,
        first: String,
        second: String,
    },

    #[error("Rule '{rule}' failed at '{path}': {details}")]
    Rule {
        rule: String,
        path: Path,
        details: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ValidationError {
    pub fn invalid_argument(
        rule: impl Into<String>,
        path: &Path,
        reason: impl Into<String>,
    ) -> Self {
        ValidationError::InvalidArgument {
            rule: rule.into(),
            path: path.clone(),
            reason: reason.into(),
        }
    }

    /// The issue report, when this error is a plain validation failure
    pub fn report(&self) -> Option<&Report> {
        match self {
            ValidationError::Invalid(report) => Some(report),
            _ => None,
        }
    }

    /// Consumes the error and returns its report, if any
    pub fn into_report(self) -> Option<Report> {
        match self {
            ValidationError::Invalid(report) => Some(report),
            _ => None,
        }
    }

    /// Check if the error is a data validation failure rather than a defect
    pub fn is_invalid(&self) -> bool {
        matches!(self, ValidationError::Invalid(_))
    }
}

impl From<ConfigError> for ValidationError {
    fn from(err: ConfigError) -> Self {
        ValidationError::Config(err.to_string())
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ValidationError>;
