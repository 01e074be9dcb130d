//! Semicolons at the end of a line

use lintel_core::cst::trivia::is_followed_by_newline;
use lintel_core::cst::{SyntaxKind, SyntaxToken};
use lintel_core::source::offset;
use lintel_core::{
    AdjacentTrivia, ConfigurableRule, Correction, CorrectionExample, Example, NodeId, NoOptions,
    ReasonedViolation, Result, Rewriter, Rule, RuleDescription, RuleKind, Severity, SourceFile,
    SyntaxVisitor, ViolationCollector, ViolationsVisitor, parse_options,
};
use once_cell::sync::Lazy;

pub const IDENTIFIER: &str = "trailing_semicolon";

pub static DESCRIPTION: Lazy<RuleDescription> = Lazy::new(|| RuleDescription {
    identifier: IDENTIFIER,
    name: "Trailing Semicolon",
    description: "Lines should not have trailing semicolons",
    kind: RuleKind::Idiomatic,
    default_severity: Severity::Warning,
    opt_in: false,
    deprecated_aliases: &[],
    non_triggering_examples: vec![
        Example::new("let a = 0"),
        Example::new("let a = 0; let b = 0"),
        Example::new("for item in items { print(item); print(item) }"),
    ],
    triggering_examples: vec![
        Example::new("let a = 0↓;\n"),
        Example::new("let a = 0↓;\nlet b = 1"),
        Example::new("let a = 0↓; // a comment\n"),
        Example::new("let a = 0↓;"),
        Example::new("func f() {\n    g()↓;\n}"),
    ],
    corrections: vec![
        CorrectionExample::new("let a = 0↓;\n", "let a = 0\n"),
        CorrectionExample::new("let a = 0↓;\nlet b = 1", "let a = 0\nlet b = 1"),
        CorrectionExample::new("let foo = 12↓;  // comment\n", "let foo = 12  // comment\n"),
        CorrectionExample::new("a()↓;\nb()↓;\n", "a()\nb()\n"),
    ],
});

#[derive(Debug, Default)]
pub struct TrailingSemicolon;

impl Rule for TrailingSemicolon {
    fn description(&self) -> &'static RuleDescription {
        &DESCRIPTION
    }

    fn make_visitor<'a>(&'a self, _file: &'a SourceFile) -> Box<dyn ViolationsVisitor + 'a> {
        Box::new(Visitor::default())
    }

    fn make_rewriter<'a>(&'a self, _file: &'a SourceFile) -> Option<Box<dyn Rewriter + 'a>> {
        Some(Box::new(Visitor::default()))
    }

    fn is_correctable(&self) -> bool {
        true
    }
}

impl ConfigurableRule for TrailingSemicolon {
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
    corrections: Vec<Correction>,
}

impl SyntaxVisitor for Visitor {
    fn visit_token(&mut self, token: &SyntaxToken) {
        if token.kind() != SyntaxKind::Semicolon || !is_followed_by_newline(token) {
            return;
        }
        let position = offset(token.text_range().start());
        self.violations.append(position);
        self.corrections.push(Correction::remove(
            NodeId::of_token(token),
            AdjacentTrivia::None,
            position,
        ));
    }
}

impl ViolationsVisitor for Visitor {
    fn into_violations(self: Box<Self>) -> Vec<ReasonedViolation> {
        self.violations.into_vec()
    }
}

impl Rewriter for Visitor {
    fn into_corrections(self: Box<Self>) -> Vec<Correction> {
        self.corrections
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lintel_core::WalkOptions;

    #[test]
    fn test_inline_separator_is_fine() {
        let file = SourceFile::parse("let a = 0; let b = 0;\n");
        let positions: Vec<_> = TrailingSemicolon
            .validate(&file, WalkOptions::default())
            .into_iter()
            .map(|v| v.position)
            .collect();
        assert_eq!(positions, vec![20]);
    }
}
