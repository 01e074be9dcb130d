//! Harness behavior on a small rule with a deliberately broken twin

use lintel_core::cst::trivia::is_followed_by_newline;
use lintel_core::cst::{SyntaxKind, SyntaxToken};
use lintel_core::{
    AdjacentTrivia, ConfigurableRule, Correction, CorrectionExample, Example, KindSet, NodeId,
    NoOptions, ReasonedViolation, Result, Rewriter, Rule, RuleDescription, RuleFactory, RuleKind,
    Severity, SourceFile, SyntaxVisitor, ViolationsVisitor, parse_options,
};
use lintel_test::{RuleVerifier, verify_rule};
use once_cell::sync::Lazy;

static EMPTY_STATEMENT: Lazy<RuleDescription> = Lazy::new(|| RuleDescription {
    identifier: "empty_statement",
    name: "Empty Statement",
    description: "Remove semicolons that end a line",
    kind: RuleKind::Style,
    default_severity: Severity::Warning,
    opt_in: false,
    deprecated_aliases: &[],
    non_triggering_examples: vec![Example::new("a(); b()")],
    triggering_examples: vec![Example::new("a()↓;\nb()↓;")],
    corrections: vec![CorrectionExample::new("a()↓;\n", "a()\n")],
});

static WRONG_MARKER: Lazy<RuleDescription> = Lazy::new(|| RuleDescription {
    identifier: "empty_statement_wrong",
    triggering_examples: vec![Example::new("↓a();\n")],
    corrections: vec![],
    ..EMPTY_STATEMENT.clone()
});

static PRUNE_SENSITIVE: Lazy<RuleDescription> = Lazy::new(|| RuleDescription {
    identifier: "empty_statement_pruned",
    triggering_examples: vec![Example::new("a()↓;\nstruct S {\n    func f() {\n        g()↓;\n    }\n}\n")],
    corrections: vec![],
    ..EMPTY_STATEMENT.clone()
});

#[derive(Default)]
struct Visitor {
    prune: bool,
    found: Vec<ReasonedViolation>,
    corrections: Vec<Correction>,
}

impl SyntaxVisitor for Visitor {
    fn skippable_declarations(&self) -> KindSet {
        if self.prune {
            KindSet::of(&[SyntaxKind::StructDecl])
        } else {
            KindSet::EMPTY
        }
    }

    fn visit_token(&mut self, token: &SyntaxToken) {
        if token.kind() == SyntaxKind::Semicolon
            && is_followed_by_newline(token)
        {
            let position = token.text_range().start().into();
            self.found.push(ReasonedViolation::new(position));
            self.corrections.push(Correction::remove(
                NodeId::of_token(token),
                AdjacentTrivia::None,
                position,
            ));
        }
    }
}

impl ViolationsVisitor for Visitor {
    fn into_violations(self: Box<Self>) -> Vec<ReasonedViolation> {
        self.found
    }
}

impl Rewriter for Visitor {
    fn into_corrections(self: Box<Self>) -> Vec<Correction> {
        self.corrections
    }
}

macro_rules! semicolon_rule {
    ($name:ident, $description:ident, $prune:expr) => {
        struct $name;

        impl Rule for $name {
            fn description(&self) -> &'static RuleDescription {
                &$description
            }

            fn make_visitor<'a>(&'a self, _file: &'a SourceFile) -> Box<dyn ViolationsVisitor + 'a> {
                Box::new(Visitor {
                    prune: $prune,
                    ..Default::default()
                })
            }

            fn make_rewriter<'a>(&'a self, _file: &'a SourceFile) -> Option<Box<dyn Rewriter + 'a>> {
                Some(Box::new(Visitor::default()))
            }

            fn is_correctable(&self) -> bool {
                true
            }
        }

        impl ConfigurableRule for $name {
            fn rule_description() -> &'static RuleDescription {
                &$description
            }

            fn from_options(options: &serde_json::Value) -> Result<Self> {
                parse_options::<NoOptions>($description.identifier, options)?;
                Ok($name)
            }
        }
    };
}

semicolon_rule!(EmptyStatement, EMPTY_STATEMENT, false);
semicolon_rule!(WrongMarker, WRONG_MARKER, false);
semicolon_rule!(PruneSensitive, PRUNE_SENSITIVE, true);

#[test]
fn test_consistent_rule_passes() {
    verify_rule(&RuleFactory::of::<EmptyStatement>()).unwrap();
}

#[test]
fn test_wrong_marker_is_reported() {
    let err = verify_rule(&RuleFactory::of::<WrongMarker>()).unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("expected violations at [0], found [3]"), "{message}");
}

#[test]
fn test_pruning_mismatch_is_reported() {
    let err = RuleVerifier::new(RuleFactory::of::<PruneSensitive>())
        .without_disable_commands()
        .verify()
        .unwrap_err();
    assert!(format!("{err:#}").contains("pruning changed the result"));
}
