//! Example replay for one rule

use anyhow::{Context, Result, bail, ensure};
use lintel_core::config::DEFAULT_MAX_CORRECTION_ITERATIONS;
use lintel_core::{
    ActiveRule, Example, Linter, Rule, RuleDescription, RuleFactory, SourceFile, WalkOptions,
};
use similar::TextDiff;

/// Verify every example of the rule built by `factory`
pub fn verify_rule(factory: &RuleFactory) -> Result<()> {
    RuleVerifier::new(*factory).verify()
}

/// Example-driven checks of one rule
#[derive(Debug, Clone, Copy)]
pub struct RuleVerifier {
    factory: RuleFactory,
    check_disable_commands: bool,
}

impl RuleVerifier {
    pub fn new(factory: RuleFactory) -> Self {
        Self {
            factory,
            check_disable_commands: true,
        }
    }

    /// Skip the disable-command check
    pub fn without_disable_commands(mut self) -> Self {
        self.check_disable_commands = false;
        self
    }

    fn description(&self) -> &'static RuleDescription {
        (self.factory.description)()
    }

    pub fn verify(&self) -> Result<()> {
        let description = self.description();
        tracing::debug!("Verifying examples of '{}'", description.identifier);

        for example in &description.non_triggering_examples {
            self.verify_non_triggering(example)
                .with_context(|| format!("non-triggering example {:?}", example.code))?;
        }
        for example in &description.triggering_examples {
            self.verify_triggering(example)
                .with_context(|| format!("triggering example {:?}", example.code))?;
        }
        for correction in &description.corrections {
            self.verify_correction(&correction.before, correction.after)
                .with_context(|| format!("correction example {:?}", correction.before.code))?;
        }

        let rule = self.factory.build_default()?;
        if !description.corrections.is_empty() {
            ensure!(
                rule.is_correctable(),
                "'{}' lists corrections but is not correctable",
                description.identifier
            );
        }
        Ok(())
    }

    fn build(&self, example: &Example) -> Result<Box<dyn Rule>> {
        let options = example
            .configuration
            .clone()
            .unwrap_or(serde_json::Value::Null);
        Ok((self.factory.build)(&options)?)
    }

    fn linter(&self, example: &Example) -> Result<Linter> {
        let rule = self.build(example)?;
        let severity = self.description().default_severity;
        Ok(Linter::from_rules(
            vec![ActiveRule::new(rule, severity)],
            DEFAULT_MAX_CORRECTION_ITERATIONS,
        ))
    }

    fn verify_non_triggering(&self, example: &Example) -> Result<()> {
        let (text, markers) = example.strip_markers();
        ensure!(markers.is_empty(), "non-triggering examples carry no markers");
        let found = self.positions(example, &text)?;
        ensure!(found.is_empty(), "unexpected violations at {:?}", found);
        Ok(())
    }

    fn verify_triggering(&self, example: &Example) -> Result<()> {
        let (text, expected) = example.strip_markers();
        ensure!(!expected.is_empty(), "triggering examples need a marker");
        let found = self.positions(example, &text)?;
        ensure!(
            found == expected,
            "expected violations at {:?}, found {:?}",
            expected,
            found
        );

        if self.check_disable_commands {
            let disabled = format!(
                "// lintel:disable {}\n{}",
                self.description().identifier,
                text
            );
            let outcome = self.linter(example)?.lint(&SourceFile::parse(disabled));
            ensure!(
                outcome.violations.is_empty(),
                "disable command did not silence {:?}",
                outcome.violations
            );
        }
        Ok(())
    }

    /// Sorted offsets, checked to match between pruned and full walks
    fn positions(&self, example: &Example, text: &str) -> Result<Vec<usize>> {
        let rule = self.build(example)?;
        let file = SourceFile::parse(text);
        let mut pruned: Vec<usize> = rule
            .validate(&file, WalkOptions::default())
            .into_iter()
            .map(|violation| violation.position)
            .collect();
        let mut full: Vec<usize> = rule
            .validate(&file, WalkOptions::without_pruning())
            .into_iter()
            .map(|violation| violation.position)
            .collect();
        pruned.sort_unstable();
        full.sort_unstable();
        ensure!(
            pruned == full,
            "pruning changed the result: {:?} with, {:?} without",
            pruned,
            full
        );
        Ok(pruned)
    }

    fn verify_correction(&self, before: &Example, after: &str) -> Result<()> {
        let (text, _) = before.strip_markers();
        let linter = self.linter(before)?;

        let outcome = linter.fix(&SourceFile::parse(text))?;
        ensure!(outcome.is_changed(), "no correction was applied");
        if outcome.corrected != after {
            bail!(
                "corrected text differs:\n{}",
                TextDiff::from_lines(after, outcome.corrected.as_str())
                    .unified_diff()
                    .header("expected", "corrected")
            );
        }

        let again = linter.fix(&SourceFile::parse(after))?;
        ensure!(
            !again.is_changed(),
            "correcting the corrected text changed it again:\n{}",
            again.diff()
        );
        Ok(())
    }
}
