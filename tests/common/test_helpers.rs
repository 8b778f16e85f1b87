use std::path::{Path, PathBuf};

use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::fs;

use validate_json::{Flavor, Options, Report, ValidationError};

/// Flavor with the built-in rules and `fail_fast` disabled
pub fn collecting_flavor() -> Flavor {
    Flavor::json_schema_with_options(Options {
        fail_fast: false,
        ..Options::default()
    })
}

/// A person record schema used across suites
pub fn person_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "name": {"type": "string", "minLength": 1, "maxLength": 32},
            "age": {"type": "integer", "minimum": 0, "maximum": 150},
            "email": {"type": "string", "pattern": "^[^@]+@[^@]+$"},
            "tags": {
                "type": "array",
                "items": {"type": "string"},
                "uniqueItems": true,
                "default": []
            },
            "role": {"enum": ["admin", "user"], "default": "user"}
        },
        "required": ["name", "age"]
    })
}

/// Unwraps the report of a failed validation
pub fn expect_report(result: Result<Value, ValidationError>) -> Report {
    match result {
        Err(ValidationError::Invalid(report)) => report,
        Err(other) => panic!("Expected a validation report, got defect: {}", other),
        Ok(value) => panic!("Expected a validation report, got value: {}", value),
    }
}

/// Issue paths of a report, in report order
pub fn issue_paths(report: &Report) -> Vec<String> {
    report
        .issues()
        .iter()
        .map(|issue| issue.path.to_string())
        .collect()
}

/// Issue rule names of a report, in report order
pub fn issue_rules(report: &Report) -> Vec<String> {
    report.issues().iter().map(|issue| issue.rule.clone()).collect()
}

/// Write a configuration file into a temporary directory
pub async fn write_config(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).await.unwrap();
    path
}

/// Check that a path exists and is a file
pub async fn assert_file_exists(path: &Path) {
    let metadata = fs::metadata(path).await.unwrap();
    assert!(metadata.is_file(), "{} is not a file", path.display());
}
