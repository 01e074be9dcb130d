//! Rule contract and static rule metadata
//!
//! A rule pairs a detecting visitor with an optional correcting one. Both
//! are created fresh for every tree and consumed when the walk is done, so
//! all per-run state lives in the visitor and rules themselves stay
//! read-only after construction.

use serde::Serialize;

use crate::correction::Correction;
use crate::result::Result;
use crate::source::SourceFile;
use crate::violation::{ReasonedViolation, Severity};
use crate::visitor::{SyntaxVisitor, WalkOptions, walk};

/// Marks an expected violation offset in triggering examples
pub const VIOLATION_MARKER: char = '↓';

/// Rule categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    /// Likely bugs and API misuse
    Lint,
    /// Language idioms
    Idiomatic,
    /// Formatting and naming preferences
    Style,
    Metrics,
    Performance,
}

impl RuleKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RuleKind::Lint => "lint",
            RuleKind::Idiomatic => "idiomatic",
            RuleKind::Style => "style",
            RuleKind::Metrics => "metrics",
            RuleKind::Performance => "performance",
        }
    }
}

/// One source snippet of a rule's example corpus
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Example {
    pub code: &'static str,
    /// Rule options to build the rule with, when they differ from defaults
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration: Option<serde_json::Value>,
}

impl Example {
    pub const fn new(code: &'static str) -> Self {
        Self {
            code,
            configuration: None,
        }
    }

    pub fn with_configuration(mut self, configuration: serde_json::Value) -> Self {
        self.configuration = Some(configuration);
        self
    }

    /// Source text with markers removed, and the byte offsets they marked
    pub fn strip_markers(&self) -> (String, Vec<usize>) {
        let mut text = String::with_capacity(self.code.len());
        let mut offsets = Vec::new();
        for ch in self.code.chars() {
            if ch == VIOLATION_MARKER {
                offsets.push(text.len());
            } else {
                text.push(ch);
            }
        }
        (text, offsets)
    }
}

/// A triggering snippet and its expected corrected text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrectionExample {
    pub before: Example,
    pub after: &'static str,
}

impl CorrectionExample {
    pub const fn new(before: &'static str, after: &'static str) -> Self {
        Self {
            before: Example::new(before),
            after,
        }
    }

    pub fn with_configuration(mut self, configuration: serde_json::Value) -> Self {
        self.before = self.before.with_configuration(configuration);
        self
    }
}

/// Static metadata of one rule
///
/// Built once per process behind a `Lazy` static and never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct RuleDescription {
    /// Identifier used in configuration and disable commands
    pub identifier: &'static str,
    pub name: &'static str,
    /// Default violation message
    pub description: &'static str,
    pub kind: RuleKind,
    pub default_severity: Severity,
    /// Disabled unless configured
    pub opt_in: bool,
    /// Former identifiers still accepted in configuration
    pub deprecated_aliases: &'static [&'static str],
    pub non_triggering_examples: Vec<Example>,
    pub triggering_examples: Vec<Example>,
    pub corrections: Vec<CorrectionExample>,
}

impl RuleDescription {
    /// Whether `id` names this rule, directly or through an alias
    pub fn answers_to(&self, id: &str) -> bool {
        self.identifier == id || self.deprecated_aliases.contains(&id)
    }

    /// Identifier followed by deprecated aliases
    pub fn all_identifiers(&self) -> impl Iterator<Item = &'static str> + '_ {
        std::iter::once(self.identifier).chain(self.deprecated_aliases.iter().copied())
    }

    /// Every example snippet, markers included
    pub fn consolidated_examples(&self) -> impl Iterator<Item = &Example> + '_ {
        self.non_triggering_examples
            .iter()
            .chain(self.triggering_examples.iter())
            .chain(self.corrections.iter().map(|c| &c.before))
    }
}

/// Visitor that reports violations
pub trait ViolationsVisitor: SyntaxVisitor {
    fn into_violations(self: Box<Self>) -> Vec<ReasonedViolation>;
}

/// Visitor that proposes corrections
pub trait Rewriter: SyntaxVisitor {
    fn into_corrections(self: Box<Self>) -> Vec<Correction>;
}

/// A configured check
pub trait Rule: Send + Sync {
    fn description(&self) -> &'static RuleDescription;

    /// Fresh detecting visitor for one tree
    fn make_visitor<'a>(&'a self, file: &'a SourceFile) -> Box<dyn ViolationsVisitor + 'a>;

    /// Fresh correcting visitor for one tree, if the rule can correct
    fn make_rewriter<'a>(&'a self, _file: &'a SourceFile) -> Option<Box<dyn Rewriter + 'a>> {
        None
    }

    fn is_correctable(&self) -> bool {
        false
    }

    fn identifier(&self) -> &'static str {
        self.description().identifier
    }

    /// Walk `file` with a fresh visitor and return what it reported
    fn validate(&self, file: &SourceFile, options: WalkOptions) -> Vec<ReasonedViolation> {
        if file.is_empty() {
            return Vec::new();
        }
        let mut visitor = self.make_visitor(file);
        walk(&mut *visitor, &file.syntax(), options);
        visitor.into_violations()
    }

    /// Walk `file` with a fresh rewriter and return its proposals
    fn propose_corrections(&self, file: &SourceFile, options: WalkOptions) -> Vec<Correction> {
        if file.is_empty() {
            return Vec::new();
        }
        let Some(mut rewriter) = self.make_rewriter(file) else {
            return Vec::new();
        };
        walk(&mut *rewriter, &file.syntax(), options);
        rewriter.into_corrections()
    }
}

/// A rule type that can be built from configuration options
pub trait ConfigurableRule: Rule + Sized + 'static {
    fn rule_description() -> &'static RuleDescription;

    /// Build from the rule-specific options of a configuration entry
    fn from_options(options: &serde_json::Value) -> Result<Self>;
}

/// Type-erased constructor of one rule
#[derive(Clone, Copy)]
pub struct RuleFactory {
    pub description: fn() -> &'static RuleDescription,
    pub build: fn(&serde_json::Value) -> Result<Box<dyn Rule>>,
}

impl RuleFactory {
    pub const fn of<R: ConfigurableRule>() -> Self {
        Self {
            description: R::rule_description,
            build: build_boxed::<R>,
        }
    }

    /// Build with default options
    pub fn build_default(&self) -> Result<Box<dyn Rule>> {
        (self.build)(&serde_json::Value::Null)
    }
}

impl std::fmt::Debug for RuleFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleFactory")
            .field("identifier", &(self.description)().identifier)
            .finish()
    }
}

fn build_boxed<R: ConfigurableRule>(options: &serde_json::Value) -> Result<Box<dyn Rule>> {
    Ok(Box::new(R::from_options(options)?))
}
