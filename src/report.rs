//! Issue paths, issues and reports
//!
//! A [`Report`] is the data form of a failed validation: every constraint
//! violation found while validating a field and its children, each one
//! attributed to the [`Path`] of the value that violated it.

use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::Value;

/// One step from a parent value into a child value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Property name of an object
    Key(String),
    /// Position in an array
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(index) => write!(f, "{}", index),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<&String> for PathSegment {
    fn from(key: &String) -> Self {
        PathSegment::Key(key.clone())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// Location of a value inside the validated document
///
/// The root path is empty and renders as an empty string; other paths render
/// their segments joined by `.` (`orders.2.sku`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path {
    segments: Vec<PathSegment>,
}

impl Path {
    /// The path of the root value
    pub fn root() -> Self {
        Self::default()
    }

    /// Returns a new path extended by one segment
    pub fn join(&self, segment: impl Into<PathSegment>) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend(self.segments.iter().cloned());
        segments.push(segment.into());
        Self { segments }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of segments (nesting depth)
    pub fn depth(&self) -> usize {
        self.segments.len()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A single recorded constraint violation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    /// Path of the offending value
    pub path: Path,
    /// Name of the rule that failed
    pub rule: String,
    /// The rule's argument, for context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accept: Option<Value>,
}

impl Issue {
    pub fn new(path: Path, rule: impl Into<String>) -> Self {
        Self {
            path,
            rule: rule.into(),
            accept: None,
        }
    }

    pub fn with_accept(mut self, accept: Value) -> Self {
        self.accept = Some(accept);
        self
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_root() {
            write!(f, "(root): {}", self.rule)?;
        } else {
            write!(f, "{}: {}", self.path, self.rule)?;
        }
        if let Some(accept) = &self.accept {
            write!(f, " (expected {})", accept)?;
        }
        Ok(())
    }
}

/// Ordered collection of issues produced by one validation
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Report {
    issues: Vec<Issue>,
}

impl Report {
    pub fn new(issues: Vec<Issue>) -> Self {
        Self { issues }
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn push(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    /// Appends every issue of `other`, keeping their order
    pub fn merge(&mut self, other: Report) {
        self.issues.extend(other.issues);
    }

    /// Issues raised by the named rule
    pub fn by_rule<'r>(&'r self, rule: &'r str) -> impl Iterator<Item = &'r Issue> + 'r {
        self.issues.iter().filter(move |issue| issue.rule == rule)
    }
}

impl From<Vec<Issue>> for Report {
    fn from(issues: Vec<Issue>) -> Self {
        Self::new(issues)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} issue{}",
            self.issues.len(),
            if self.issues.len() == 1 { "" } else { "s" }
        )?;
        for issue in &self.issues {
            write!(f, "\n  {}", issue)?;
        }
        Ok(())
    }
}
