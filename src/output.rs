//! Output and Reporting
//!
//! This module provides human-readable and JSON formatting for validation
//! reports and errors.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};
use crate::report::{Issue, Report};

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum VerbosityLevel {
    /// Only show the issue count
    Quiet,
    /// Show one line per issue
    #[default]
    Normal,
    /// Also show each rule's argument
    Verbose,
    /// Also show a per-rule breakdown
    Debug,
}

/// Simple output formatter for human-readable results
pub struct Output {
    verbosity: VerbosityLevel,
    show_colors: bool,
}

impl Output {
    pub fn new(verbosity: VerbosityLevel) -> Self {
        Self {
            verbosity,
            show_colors: atty::is(atty::Stream::Stdout),
        }
    }

    /// Overrides terminal detection
    pub fn with_colors(mut self, show_colors: bool) -> Self {
        self.show_colors = show_colors;
        self
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        self.verbosity
    }

    fn colorize(&self, text: &str, color: &str) -> String {
        if self.show_colors {
            format!("\x1b[{}m{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    pub fn format_report(&self, report: &Report) -> String {
        let mut output = String::new();

        if report.is_empty() {
            if self.verbosity > VerbosityLevel::Quiet {
                output.push_str(&self.colorize("✓ VALID", "32"));
                output.push('\n');
            }
            return output;
        }

        output.push_str(&format!(
            "{} {} issue{}\n",
            self.colorize("✗ INVALID", "31"),
            report.len(),
            if report.len() == 1 { "" } else { "s" }
        ));

        if self.verbosity == VerbosityLevel::Quiet {
            return output;
        }

        for issue in report.issues() {
            output.push_str("  ");
            output.push_str(&self.format_issue(issue));
            output.push('\n');
        }

        if self.verbosity == VerbosityLevel::Debug {
            output.push_str(&format_rule_breakdown(report));
        }

        output
    }

    pub fn format_issue(&self, issue: &Issue) -> String {
        let path = if issue.path.is_root() {
            "(root)".to_string()
        } else {
            issue.path.to_string()
        };

        let mut line = format!("{}: {}", self.colorize(&path, "1"), issue.rule);
        if self.verbosity >= VerbosityLevel::Verbose {
            if let Some(accept) = &issue.accept {
                line.push_str(&format!(" (expected {})", accept));
            }
        }
        line
    }

    /// Formats any error; validation failures are rendered as their report
    pub fn format_error(&self, error: &ValidationError) -> String {
        match error.report() {
            Some(report) => self.format_report(report),
            None => format!("{}  {}\n", self.colorize("⚠ ERROR", "33"), error),
        }
    }

    /// Serializes a report as pretty-printed JSON
    pub fn format_json(&self, report: &Report) -> Result<String> {
        Ok(serde_json::to_string_pretty(report)?)
    }
}

fn format_rule_breakdown(report: &Report) -> String {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for issue in report.issues() {
        *counts.entry(issue.rule.as_str()).or_default() += 1;
    }

    let mut output = String::from("\nIssues by rule:\n");
    for (rule, count) in counts {
        output.push_str(&format!("  {}: {}\n", rule, count));
    }
    output
}
