//! Violation types and the per-rule collector

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::source::LineCol;

/// Severity levels for violations
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Should be addressed
    Warning,
    /// Must be fixed
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A match reported by a visitor, before the rule's metadata is attached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReasonedViolation {
    /// Byte offset in the source
    pub position: usize,
    /// Replaces the rule's default message
    pub reason: Option<String>,
    /// Replaces the configured severity
    pub severity: Option<Severity>,
}

impl ReasonedViolation {
    pub fn new(position: usize) -> Self {
        Self {
            position,
            reason: None,
            severity: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }
}

/// Append-only violation sequence for one rule run over one tree
///
/// Order follows traversal order. No de-duplication takes place.
#[derive(Debug, Clone, Default)]
pub struct ViolationCollector {
    violations: Vec<ReasonedViolation>,
}

impl ViolationCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, position: usize) {
        self.violations.push(ReasonedViolation::new(position));
    }

    pub fn append_with_reason(&mut self, position: usize, reason: impl Into<String>) {
        self.violations
            .push(ReasonedViolation::new(position).with_reason(reason));
    }

    pub fn append_violation(&mut self, violation: ReasonedViolation) {
        self.violations.push(violation);
    }

    pub fn extend(&mut self, positions: impl IntoIterator<Item = usize>) {
        self.violations
            .extend(positions.into_iter().map(ReasonedViolation::new));
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReasonedViolation> {
        self.violations.iter()
    }

    pub fn into_vec(self) -> Vec<ReasonedViolation> {
        self.violations
    }
}

/// A reported violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Identifier of the rule that reported it
    pub rule_id: String,
    pub severity: Severity,
    pub message: String,
    /// Byte offset in the source
    pub offset: usize,
    /// 1-based line and column of `offset`
    pub location: LineCol,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(file) = &self.file {
            write!(f, "{}:", file.display())?;
        }
        write!(
            f,
            "{}:{}: {}: {} ({})",
            self.location.line, self.location.column, self.severity, self.message, self.rule_id
        )
    }
}
