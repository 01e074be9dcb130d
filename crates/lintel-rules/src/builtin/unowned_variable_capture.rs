//! `unowned` closure captures
//!
//! An `unowned` capture traps when the referenced object is gone before the
//! closure runs. `unowned(unsafe)` is an explicit opt-out and stays silent.

use lintel_core::cst::ast::{AstNode, ClosureCaptureSpecifier};
use lintel_core::cst::{SyntaxKind, SyntaxNode};
use lintel_core::{
    ConfigurableRule, Example, NoOptions, ReasonedViolation, Result, Rule, RuleDescription,
    RuleKind, Severity, SourceFile, SyntaxVisitor, VisitControl, ViolationCollector,
    ViolationsVisitor, parse_options,
};
use once_cell::sync::Lazy;

pub const IDENTIFIER: &str = "unowned_variable_capture";

pub static DESCRIPTION: Lazy<RuleDescription> = Lazy::new(|| RuleDescription {
    identifier: IDENTIFIER,
    name: "Unowned Variable Capture",
    description: "Prefer capturing references as weak to avoid potential crashes",
    kind: RuleKind::Lint,
    default_severity: Severity::Warning,
    opt_in: false,
    deprecated_aliases: &[],
    non_triggering_examples: vec![
        Example::new("foo { [weak self] in _ }"),
        Example::new("foo { [weak self] param in _ }"),
        Example::new("foo { [weak bar] in _ }"),
        Example::new("foo { [weak bar] param in _ }"),
        Example::new("foo { bar in _ }"),
        Example::new("foo { $0 }"),
        Example::new("foo { [unowned(unsafe) self] in _ }"),
        Example::new("let unowned = 1\nfoo { [unowned] in _ }"),
    ],
    triggering_examples: vec![
        Example::new("foo { [↓unowned self] in _ }"),
        Example::new("foo { [↓unowned bar] in _ }"),
        Example::new("foo { [bar, ↓unowned self] in _ }"),
        Example::new("foo { [↓unowned(safe) self] in _ }"),
        Example::new("foo { [weak a, ↓unowned b] x in\n    bar { [↓unowned self] in _ }\n}"),
    ],
    corrections: vec![],
});

#[derive(Debug, Default)]
pub struct UnownedVariableCapture;

impl Rule for UnownedVariableCapture {
    fn description(&self) -> &'static RuleDescription {
        &DESCRIPTION
    }

    fn make_visitor<'a>(&'a self, _file: &'a SourceFile) -> Box<dyn ViolationsVisitor + 'a> {
        Box::new(Visitor::default())
    }
}

impl ConfigurableRule for UnownedVariableCapture {
    fn rule_description() -> &'static RuleDescription {
        &DESCRIPTION
    }

    fn from_options(options: &serde_json::Value) -> Result<Self> {
        parse_options::<NoOptions>(IDENTIFIER, options)?;
        Ok(Self)
    }
}

#[derive(Default)]
struct Visitor {
    violations: ViolationCollector,
}

impl SyntaxVisitor for Visitor {
    fn visit(&mut self, node: &SyntaxNode) -> VisitControl {
        if let Some(capture) = ClosureCaptureSpecifier::cast(node.clone())
            && let Some(specifier) = capture.specifier()
            && specifier.kind() == SyntaxKind::UnownedKw
            && capture.detail().as_deref() != Some("unsafe")
        {
            self.violations.append(specifier.text_range().start().into());
        }
        VisitControl::Continue
    }
}

impl ViolationsVisitor for Visitor {
    fn into_violations(self: Box<Self>) -> Vec<ReasonedViolation> {
        self.violations.into_vec()
    }
}
