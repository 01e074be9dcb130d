//! Orchestrator
//!
//! [`Linter`] selects the configured rules once and then runs them against
//! any number of trees:
//!
//! 1. **Select**: build every enabled rule from its configuration entry.
//!    A malformed entry fails the whole construction.
//! 2. **Detect**: run each rule's visitor over the tree, rules in parallel.
//!    A panicking rule is reported as a [`RuleFailure`] and the others keep
//!    their results.
//! 3. **Merge**: drop violations inside disabled regions and sort the rest
//!    by offset, then by rule identifier.
//! 4. **Correct** (fix mode): pool every rewriter's proposals, apply them
//!    through the [`CorrectionEngine`] and repeat on the new tree until no
//!    rule proposes anything or the iteration budget runs out.

use std::panic::{AssertUnwindSafe, catch_unwind};

use rayon::prelude::*;
use serde::Serialize;
use similar::TextDiff;

use crate::commands::DisabledRegions;
use crate::config::LinterConfiguration;
use crate::correction::{Correction, CorrectionEngine, OffsetMap};
use crate::result::{Result, ResultExt};
use crate::rule::{Rule, RuleDescription, RuleFactory};
use crate::source::SourceFile;
use crate::violation::{ReasonedViolation, Severity, Violation};
use crate::visitor::WalkOptions;

/// A selected rule and the severity it reports with
pub struct ActiveRule {
    rule: Box<dyn Rule>,
    severity: Severity,
}

impl ActiveRule {
    pub fn new(rule: Box<dyn Rule>, severity: Severity) -> Self {
        Self { rule, severity }
    }

    pub fn rule(&self) -> &dyn Rule {
        self.rule.as_ref()
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    fn description(&self) -> &'static RuleDescription {
        self.rule.description()
    }
}

impl std::fmt::Debug for ActiveRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveRule")
            .field("identifier", &self.rule.identifier())
            .field("severity", &self.severity)
            .finish()
    }
}

/// A rule that panicked while inspecting a tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleFailure {
    pub rule_id: String,
    pub message: String,
}

impl std::fmt::Display for RuleFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rule {} failed: {}", self.rule_id, self.message)
    }
}

/// A message about the run itself rather than the source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineDiagnostic {
    pub severity: Severity,
    pub message: String,
}

impl EngineDiagnostic {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }
}

/// Result of linting one tree
#[derive(Debug, Clone, Default, Serialize)]
pub struct LintOutcome {
    /// Ordered by offset, then rule identifier
    pub violations: Vec<Violation>,
    pub failures: Vec<RuleFailure>,
    pub diagnostics: Vec<EngineDiagnostic>,
}

impl LintOutcome {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty() && self.failures.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.violations
            .iter()
            .filter(|v| v.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.violations
            .iter()
            .filter(|v| v.severity == Severity::Warning)
            .count()
    }
}

/// A correction applied in fix mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedCorrection {
    pub rule_id: String,
    /// Offset in the original source
    pub offset: usize,
}

/// Result of fixing one tree
#[derive(Debug, Serialize)]
pub struct FixOutcome {
    pub original: String,
    pub corrected: String,
    /// Ordered by original offset
    pub applied: Vec<AppliedCorrection>,
    /// Violations left in the corrected tree
    pub remaining: LintOutcome,
    pub failures: Vec<RuleFailure>,
    pub diagnostics: Vec<EngineDiagnostic>,
    /// Correction passes that changed the tree
    pub iterations: usize,
    #[serde(skip)]
    file: SourceFile,
}

impl FixOutcome {
    /// Original offsets of every applied correction
    pub fn applied_offsets(&self) -> Vec<usize> {
        self.applied.iter().map(|c| c.offset).collect()
    }

    pub fn is_changed(&self) -> bool {
        self.original != self.corrected
    }

    /// The corrected tree
    pub fn file(&self) -> &SourceFile {
        &self.file
    }

    /// Unified diff between the original and the corrected text
    pub fn diff(&self) -> String {
        TextDiff::from_lines(&self.original, &self.corrected)
            .unified_diff()
            .context_radius(3)
            .header("original", "corrected")
            .to_string()
    }
}

/// Runs a fixed set of rules against trees
#[derive(Debug)]
pub struct Linter {
    rules: Vec<ActiveRule>,
    max_correction_iterations: usize,
    engine: CorrectionEngine,
}

impl Linter {
    /// Select and build the rules enabled by `config`
    ///
    /// Entries that no factory answers to are ignored.
    pub fn new(factories: &[RuleFactory], config: &LinterConfiguration) -> Result<Self> {
        let _span = tracing::info_span!("select", factories = factories.len()).entered();

        let mut rules = Vec::new();
        for factory in factories {
            let description = (factory.description)();
            let entry = config.rule_entry(description.all_identifiers());

            if let Some((used, _)) = entry
                && used != description.identifier
            {
                tracing::warn!(
                    "Rule identifier '{}' is deprecated, use '{}' instead",
                    used,
                    description.identifier
                );
            }

            let enabled = match entry {
                Some((_, rule_config)) => !rule_config.is_off(),
                None => !description.opt_in,
            };
            if !enabled {
                tracing::debug!("Skipping disabled rule '{}'", description.identifier);
                continue;
            }

            let options = entry
                .map(|(_, rule_config)| rule_config.options_value())
                .unwrap_or(serde_json::Value::Null);
            let rule = (factory.build)(&options)?;
            let severity = entry
                .and_then(|(_, rule_config)| rule_config.severity)
                .and_then(|severity| severity.to_severity())
                .unwrap_or(description.default_severity);
            rules.push(ActiveRule::new(rule, severity));
        }

        for id in config.rules.keys() {
            let known = factories
                .iter()
                .any(|factory| (factory.description)().answers_to(id));
            if !known {
                tracing::debug!("Ignoring configuration for unknown rule '{}'", id);
            }
        }

        tracing::info!("Selected {} of {} rules", rules.len(), factories.len());
        Ok(Self::from_rules(rules, config.max_correction_iterations))
    }

    /// Run exactly these rules
    pub fn from_rules(rules: Vec<ActiveRule>, max_correction_iterations: usize) -> Self {
        Self {
            rules,
            max_correction_iterations,
            engine: CorrectionEngine::new(),
        }
    }

    pub fn rules(&self) -> &[ActiveRule] {
        &self.rules
    }

    pub fn max_correction_iterations(&self) -> usize {
        self.max_correction_iterations
    }

    /// Detect and merge violations of every selected rule
    pub fn lint(&self, file: &SourceFile) -> LintOutcome {
        let _span = tracing::info_span!("lint", rules = self.rules.len()).entered();
        let mut outcome = LintOutcome::default();

        if !file.parse_errors().is_empty() {
            tracing::debug!("Linting a tree with {} parse errors", file.parse_errors().len());
            outcome.diagnostics.push(EngineDiagnostic::warning(format!(
                "source has {} parse errors",
                file.parse_errors().len()
            )));
        }
        if file.is_empty() {
            return outcome;
        }

        let results: Vec<_> = self
            .rules
            .par_iter()
            .map(|active| {
                let rule_id = active.rule.identifier();
                let run = catch_unwind(AssertUnwindSafe(|| {
                    active.rule.validate(file, WalkOptions::default())
                }));
                (active, run.map_err(|payload| failure(rule_id, payload)))
            })
            .collect();

        let regions = DisabledRegions::from_file(file);
        for (active, result) in results {
            match result {
                Ok(found) => {
                    let description = active.description();
                    let ids: Vec<&str> = description.all_identifiers().collect();
                    outcome.violations.extend(
                        found
                            .into_iter()
                            .map(|violation| self.finish_violation(active, file, violation))
                            .filter(|violation| !regions.is_disabled(&ids, violation.location)),
                    );
                }
                Err(rule_failure) => {
                    tracing::error!("{}", rule_failure);
                    outcome.failures.push(rule_failure);
                }
            }
        }

        outcome.violations.sort_by(|a, b| {
            a.offset
                .cmp(&b.offset)
                .then_with(|| a.rule_id.cmp(&b.rule_id))
        });
        tracing::debug!("Found {} violations", outcome.violations.len());
        outcome
    }

    /// Lint many trees in parallel, results in input order
    pub fn lint_many(&self, files: &[SourceFile]) -> Vec<LintOutcome> {
        files.par_iter().map(|file| self.lint(file)).collect()
    }

    /// Correct `file` until no rule proposes a correction
    pub fn fix(&self, file: &SourceFile) -> Result<FixOutcome> {
        let _span = tracing::info_span!("fix", rules = self.rules.len()).entered();

        let mut current = SourceFile::from_green(file.green().clone());
        if let Some(path) = file.path() {
            current = current.with_path(path);
        }
        let mut offsets = OffsetMap::new();
        let mut applied = Vec::new();
        let mut failures = Vec::new();
        let mut diagnostics = Vec::new();
        let mut iterations = 0;

        loop {
            let corrections = self.collect_corrections(&current, &mut failures);
            if corrections.is_empty() {
                break;
            }
            if iterations == self.max_correction_iterations {
                let message = format!("fix did not converge after {iterations} iterations");
                tracing::warn!("{}", message);
                diagnostics.push(EngineDiagnostic::warning(message));
                break;
            }

            let pass = self.engine.apply_to_file(&current, corrections);
            if let Err(err) = &pass
                && err.is_recoverable()
            {
                diagnostics.push(EngineDiagnostic::warning(err.to_string()));
            }
            // Invariant violations abort the fix, the rest stop the loop
            let Some((next, result)) = pass.recoverable()? else {
                break;
            };
            tracing::debug!(
                "Correction pass {} applied {} corrections, deferred {}",
                iterations + 1,
                result.applied.len(),
                result.deferred.len()
            );

            applied.extend(result.applied.iter().map(|correction| AppliedCorrection {
                rule_id: correction.rule_id.clone().unwrap_or_default(),
                offset: offsets.to_original(correction.position),
            }));
            offsets.push_pass(result.edits);
            current = next;
            iterations += 1;
        }

        applied.sort_by(|a, b| a.offset.cmp(&b.offset).then_with(|| a.rule_id.cmp(&b.rule_id)));
        let remaining = self.lint(&current);
        tracing::info!(
            "Applied {} corrections in {} passes",
            applied.len(),
            iterations
        );

        Ok(FixOutcome {
            original: file.text().to_string(),
            corrected: current.text().to_string(),
            applied,
            remaining,
            failures,
            diagnostics,
            iterations,
            file: current,
        })
    }

    /// Pool the proposals of every correctable rule for one pass
    fn collect_corrections(
        &self,
        file: &SourceFile,
        failures: &mut Vec<RuleFailure>,
    ) -> Vec<Correction> {
        if file.is_empty() {
            return Vec::new();
        }
        let results: Vec<_> = self
            .rules
            .par_iter()
            .filter(|active| active.rule.is_correctable())
            .map(|active| {
                let rule_id = active.rule.identifier();
                let run = catch_unwind(AssertUnwindSafe(|| {
                    active.rule.propose_corrections(file, WalkOptions::default())
                }));
                (active, run.map_err(|payload| failure(rule_id, payload)))
            })
            .collect();

        let regions = DisabledRegions::from_file(file);
        let mut corrections = Vec::new();
        for (active, result) in results {
            match result {
                Ok(proposed) => {
                    let description = active.description();
                    let ids: Vec<&str> = description.all_identifiers().collect();
                    corrections.extend(
                        proposed
                            .into_iter()
                            .filter(|c| !regions.is_disabled(&ids, file.line_col(c.position)))
                            .map(|c| c.with_rule(description.identifier)),
                    );
                }
                Err(rule_failure) => {
                    tracing::error!("{}", rule_failure);
                    if !failures.contains(&rule_failure) {
                        failures.push(rule_failure);
                    }
                }
            }
        }
        corrections
    }

    fn finish_violation(
        &self,
        active: &ActiveRule,
        file: &SourceFile,
        violation: ReasonedViolation,
    ) -> Violation {
        let description = active.description();
        Violation {
            rule_id: description.identifier.to_string(),
            severity: violation.severity.unwrap_or(active.severity),
            message: violation
                .reason
                .unwrap_or_else(|| description.description.to_string()),
            offset: violation.position,
            location: file.line_col(violation.position),
            file: file.path().map(|path| path.to_path_buf()),
        }
    }
}

fn failure(rule_id: &str, payload: Box<dyn std::any::Any + Send>) -> RuleFailure {
    let message = payload
        .downcast_ref::<&str>()
        .map(|message| message.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "rule panicked".to_string());
    RuleFailure {
        rule_id: rule_id.to_string(),
        message,
    }
}
